//! FAT32 path sanitizer
//!
//! Rewrites a destination path so every segment can be stored on a FAT32
//! volume. Only the non-anchor segments are touched; a drive prefix or root
//! passes through unchanged.

use std::path::{Component, Path, PathBuf};
use unicode_general_category::{get_general_category, GeneralCategory};

/// Longest file name FAT32 long-name entries can hold.
pub const MAX_SEGMENT_CHARS: usize = 255;

pub const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

fn is_illegal(c: char) -> bool {
    ILLEGAL_CHARS.contains(&c) || matches!(c, '\u{00}'..='\u{1F}' | '\u{7F}'..='\u{9F}')
}

fn is_dropped(c: char) -> bool {
    u32::from(c) > 0xFFFF
        || matches!(
            get_general_category(c),
            GeneralCategory::NonspacingMark
                | GeneralCategory::EnclosingMark
                | GeneralCategory::Format
                | GeneralCategory::Control
        )
}

/// Sanitize one file or directory name.
///
/// A name that sanitizes to nothing becomes `_` so the path keeps its depth.
/// Same for names that reduce to `.` or `..`.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .filter_map(|c| {
            if is_illegal(c) {
                Some('_')
            } else if is_dropped(c) {
                None
            } else {
                Some(c)
            }
        })
        .collect();

    let truncated: String = cleaned.trim().chars().take(MAX_SEGMENT_CHARS).collect();
    let result = truncated.trim_end();
    // "." and ".." would turn into navigation components on the next parse
    if result.is_empty() || result == "." || result == ".." {
        "_".to_string()
    } else {
        result.to_string()
    }
}

/// Make a full path FAT32 compatible. Idempotent.
pub fn make_fat32_compatible(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => out.push(".."),
            Component::Normal(name) => out.push(sanitize_segment(&name.to_string_lossy())),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_characters_replaced() {
        assert_eq!(sanitize_segment("a<b>c:d\"e|f?g*h"), "a_b_c_d_e_f_g_h");
        assert_eq!(sanitize_segment("back\\slash"), "back_slash");
        assert_eq!(sanitize_segment("tab\there"), "tab_here");
        assert_eq!(sanitize_segment("c1\u{85}ctrl"), "c1_ctrl");
    }

    #[test]
    fn test_marks_and_format_chars_dropped() {
        // combining acute accent (Mn) and zero-width joiner (Cf)
        assert_eq!(sanitize_segment("e\u{301}te"), "ete");
        assert_eq!(sanitize_segment("a\u{200D}b"), "ab");
        // enclosing circle (Me)
        assert_eq!(sanitize_segment("1\u{20DD}"), "1");
    }

    #[test]
    fn test_astral_plane_dropped() {
        assert_eq!(sanitize_segment("song 🎵 title"), "song  title");
        assert_eq!(sanitize_segment("🎵"), "_");
    }

    #[test]
    fn test_trim_and_truncate() {
        assert_eq!(sanitize_segment("  padded  "), "padded");
        let long = "x".repeat(300);
        assert_eq!(sanitize_segment(&long).chars().count(), MAX_SEGMENT_CHARS);
        let spaced = format!("{} y", "x".repeat(254));
        assert_eq!(sanitize_segment(&spaced), "x".repeat(254));
    }

    #[test]
    fn test_anchor_passes_through() {
        let p = make_fat32_compatible(Path::new("/music/Artist: Name/Track?.ogg"));
        assert_eq!(p, PathBuf::from("/music/Artist_ Name/Track_.ogg"));
    }

    #[test]
    fn test_relative_path() {
        let p = make_fat32_compatible(Path::new("./a*/b"));
        assert_eq!(p, PathBuf::from("a_/b"));
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn sanitizer_is_idempotent(segments in proptest::collection::vec("\\PC{0,300}", 1..4)) {
            let raw: PathBuf = segments.iter().filter(|s| !s.is_empty()).collect();
            let once = make_fat32_compatible(&raw);
            let twice = make_fat32_compatible(&once);
            prop_assert_eq!(&once, &twice);
        }

        #[test]
        fn segments_are_legal_and_bounded(segment in "\\PC{0,400}") {
            let clean = sanitize_segment(&segment);
            prop_assert!(clean.chars().count() <= MAX_SEGMENT_CHARS);
            prop_assert!(!clean.chars().any(|c| ILLEGAL_CHARS.contains(&c)));
            prop_assert!(!clean.chars().any(|c| u32::from(c) > 0xFFFF));
        }
    }
}
