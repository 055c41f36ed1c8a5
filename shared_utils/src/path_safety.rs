use std::borrow::Cow;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Makes a path safe to pass as a positional argument to tools like ffmpeg,
/// cjxl or magick that do not understand `--` as an end-of-options marker.
///
/// Relative paths starting with `-` get a `./` prefix. Non-UTF-8 paths pass
/// through untouched instead of being lossily converted.
pub fn safe_path_arg(path: &Path) -> Cow<'_, OsStr> {
    if path.as_os_str().as_encoded_bytes().first() == Some(&b'-') {
        let mut prefixed = OsString::from("./");
        prefixed.push(path.as_os_str());
        Cow::Owned(prefixed)
    } else {
        Cow::Borrowed(path.as_os_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_path_arg() {
        assert_eq!(safe_path_arg(Path::new("normal.flac")), OsStr::new("normal.flac"));
        assert_eq!(safe_path_arg(Path::new("/abs/path.png")), OsStr::new("/abs/path.png"));
        assert_eq!(safe_path_arg(Path::new("-dash.webp")), OsStr::new("./-dash.webp"));
        assert_eq!(safe_path_arg(Path::new("-dir/file.wav")), OsStr::new("./-dir/file.wav"));
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_path_kept_verbatim() {
        use std::os::unix::ffi::OsStrExt;
        let raw = OsStr::from_bytes(b"caf\xe9.flac");
        assert_eq!(safe_path_arg(Path::new(raw)), raw);
    }
}
