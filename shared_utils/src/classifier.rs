//! Classifier
//!
//! Routes each discovered file to exactly one of convert, copy or skip and
//! computes where its result goes in the mirrored output tree.

use crate::fat32::make_fat32_compatible;
use crate::types::{CopyMask, ExtensionMask, FileSize};
use crate::walker::DiscoveredFile;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Convert { output: PathBuf },
    Copy { output: PathBuf, below_min_size: bool },
    Skip { reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Neither converted nor allowed by the copy mask.
    NotSelected,
    /// Preserve mode and the destination is already there.
    OutputExists(PathBuf),
    /// Destination is the source itself (output dir == input dir).
    AlreadyInPlace,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    convert_mask: ExtensionMask,
    copy_mask: CopyMask,
    min_size: FileSize,
    output_extension: String,
    output_root: PathBuf,
    preserve_existing: bool,
    fat32: bool,
}

impl Classifier {
    pub fn new(
        convert_mask: ExtensionMask,
        output_extension: &str,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            convert_mask,
            copy_mask: CopyMask::copy_everything(),
            min_size: FileSize::ZERO,
            output_extension: output_extension.trim_start_matches('.').to_lowercase(),
            output_root: output_root.into(),
            preserve_existing: false,
            fat32: false,
        }
    }

    pub fn copy_mask(mut self, mask: CopyMask) -> Self {
        self.copy_mask = mask;
        self
    }

    pub fn min_size(mut self, size: FileSize) -> Self {
        self.min_size = size;
        self
    }

    pub fn preserve_existing(mut self, preserve: bool) -> Self {
        self.preserve_existing = preserve;
        self
    }

    pub fn fat32(mut self, enabled: bool) -> Self {
        self.fat32 = enabled;
        self
    }

    /// Output lands next to the sources: the output format leaves the
    /// convert mask so results are never picked up and converted again.
    pub fn same_dir(mut self, same_dir: bool) -> Self {
        if same_dir && self.convert_mask.contains(&self.output_extension) {
            self.convert_mask.remove(&self.output_extension);
            tracing::info!(
                format = %self.output_extension,
                "Same input and output directory, not reconverting output format"
            );
        }
        self
    }

    pub fn convert_mask(&self) -> &ExtensionMask {
        &self.convert_mask
    }

    /// Output directory mirroring `relative_dir` of the input tree.
    pub fn output_dir_for(&self, relative_dir: &Path) -> PathBuf {
        self.under_output_root(relative_dir.to_path_buf())
    }

    pub fn route(&self, file: &DiscoveredFile) -> Route {
        let Some(name) = file.path.file_name() else {
            return Route::Skip {
                reason: SkipReason::NotSelected,
            };
        };

        let route = if self.convert_mask.matches(&file.path) {
            if file.size >= self.min_size.bytes() {
                let mut converted = file
                    .path
                    .file_stem()
                    .map(|s| s.to_os_string())
                    .unwrap_or_else(|| name.to_os_string());
                converted.push(".");
                converted.push(&self.output_extension);
                Route::Convert {
                    output: self.under_output_root(file.relative_dir.join(converted)),
                }
            } else {
                // too small to be worth converting: copied as is, copy mask or not
                Route::Copy {
                    output: self.under_output_root(file.relative_dir.join(name)),
                    below_min_size: true,
                }
            }
        } else if self.copy_mask.allows(&file.path) {
            Route::Copy {
                output: self.under_output_root(file.relative_dir.join(name)),
                below_min_size: false,
            }
        } else {
            Route::Skip {
                reason: SkipReason::NotSelected,
            }
        };

        match route {
            Route::Convert { ref output } | Route::Copy { ref output, .. }
                if *output == file.path =>
            {
                Route::Skip {
                    reason: SkipReason::AlreadyInPlace,
                }
            }
            Route::Convert { ref output } | Route::Copy { ref output, .. }
                if self.preserve_existing && output.exists() =>
            {
                Route::Skip {
                    reason: SkipReason::OutputExists(output.clone()),
                }
            }
            other => other,
        }
    }

    fn under_output_root(&self, relative: PathBuf) -> PathBuf {
        if self.fat32 {
            self.output_root.join(make_fat32_compatible(&relative))
        } else {
            self.output_root.join(relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn file(rel_dir: &str, name: &str, size: u64) -> DiscoveredFile {
        DiscoveredFile {
            path: PathBuf::from("/in").join(rel_dir).join(name),
            relative_dir: PathBuf::from(rel_dir),
            size,
        }
    }

    fn music() -> Classifier {
        Classifier::new(ExtensionMask::parse("flac,wav").unwrap(), "ogg", "/out")
    }

    #[test]
    fn test_matching_file_is_converted_with_new_extension() {
        let route = music().route(&file("Artist/Album", "01 Intro.FLAC", 10));
        assert_eq!(
            route,
            Route::Convert {
                output: PathBuf::from("/out/Artist/Album/01 Intro.ogg")
            }
        );
    }

    #[test]
    fn test_other_files_copied_by_default() {
        let route = music().route(&file("Album", "cover.jpg", 10));
        assert_eq!(
            route,
            Route::Copy {
                output: PathBuf::from("/out/Album/cover.jpg"),
                below_min_size: false
            }
        );
    }

    #[test]
    fn test_copy_mask_wildcard_skips_everything_else() {
        let c = music().copy_mask(CopyMask::ExcludeAll);
        assert_eq!(
            c.route(&file("", "notes.txt", 1)),
            Route::Skip {
                reason: SkipReason::NotSelected
            }
        );
        assert!(matches!(c.route(&file("", "a.wav", 1)), Route::Convert { .. }));
    }

    #[test]
    fn test_small_file_is_copied_not_converted() {
        let c = Classifier::new(ExtensionMask::parse("png").unwrap(), "jxl", "/out")
            .min_size(FileSize::parse("1MiB").unwrap())
            .copy_mask(CopyMask::ExcludeAll);
        let route = c.route(&file("", "icon.png", 500 * 1024));
        assert_eq!(
            route,
            Route::Copy {
                output: PathBuf::from("/out/icon.png"),
                below_min_size: true
            }
        );
        let big = c.route(&file("", "photo.png", 2 * 1024 * 1024));
        assert_eq!(
            big,
            Route::Convert {
                output: PathBuf::from("/out/photo.jxl")
            }
        );
    }

    #[test]
    fn test_fat32_applies_below_output_root_only() {
        let c = Classifier::new(ExtensionMask::parse("flac").unwrap(), "ogg", "/mnt/USB:1").fat32(true);
        let route = c.route(&file("AC/DC?", "Back: In Black.flac", 1));
        assert_eq!(
            route,
            Route::Convert {
                output: PathBuf::from("/mnt/USB:1/AC/DC_/Back_ In Black.ogg")
            }
        );
        assert_eq!(
            c.output_dir_for(Path::new("Sigur Rós")),
            PathBuf::from("/mnt/USB:1/Sigur Rós")
        );
    }

    #[test]
    fn test_preserve_skips_existing_outputs() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("done.ogg"), b"x").unwrap();

        let c = Classifier::new(ExtensionMask::parse("flac").unwrap(), "ogg", temp.path())
            .preserve_existing(true);
        assert_eq!(
            c.route(&file("", "done.flac", 1)),
            Route::Skip {
                reason: SkipReason::OutputExists(temp.path().join("done.ogg"))
            }
        );
        assert!(matches!(c.route(&file("", "todo.flac", 1)), Route::Convert { .. }));
    }

    #[test]
    fn test_same_dir_copy_is_skipped() {
        let c = Classifier::new(ExtensionMask::parse("png").unwrap(), "jxl", "/in");
        assert_eq!(
            c.route(&file("", "notes.txt", 1)),
            Route::Skip {
                reason: SkipReason::AlreadyInPlace
            }
        );
        assert!(matches!(c.route(&file("", "a.png", 1)), Route::Convert { .. }));
    }

    #[test]
    fn test_same_dir_never_converts_onto_source() {
        let mask = ExtensionMask::parse("flac,ogg").unwrap();

        // mask left alone: the ogg would be written over itself
        let c = Classifier::new(mask.clone(), "ogg", "/in");
        assert_eq!(
            c.route(&file("", "song.ogg", 1)),
            Route::Skip {
                reason: SkipReason::AlreadyInPlace
            }
        );

        let c = Classifier::new(mask, "OGG", "/in").same_dir(true);
        assert!(!c.convert_mask().contains("ogg"));
        assert_eq!(
            c.route(&file("", "song.ogg", 1)),
            Route::Skip {
                reason: SkipReason::AlreadyInPlace
            }
        );
        assert_eq!(
            c.route(&file("", "track.flac", 1)),
            Route::Convert {
                output: PathBuf::from("/in/track.ogg")
            }
        );
    }

    #[test]
    fn test_separate_output_keeps_full_mask() {
        let c = Classifier::new(ExtensionMask::parse("flac,ogg").unwrap(), "ogg", "/out").same_dir(false);
        assert!(c.convert_mask().contains("ogg"));
        assert!(matches!(c.route(&file("", "song.ogg", 1)), Route::Convert { .. }));
    }

    #[test]
    fn test_routes_partition_the_input() {
        let c = music().copy_mask(CopyMask::parse("log,cue").unwrap());
        let inputs = [
            file("", "a.flac", 1),
            file("", "b.wav", 1),
            file("", "c.log", 1),
            file("", "d.cue", 1),
            file("", "e.jpg", 1),
            file("", "f", 1),
        ];
        let (mut converted, mut copied, mut skipped) = (0, 0, 0);
        for f in &inputs {
            match c.route(f) {
                Route::Convert { .. } => converted += 1,
                Route::Copy { .. } => copied += 1,
                Route::Skip { .. } => skipped += 1,
            }
        }
        assert_eq!((converted, copied, skipped), (2, 2, 2));
        assert_eq!(converted + copied + skipped, inputs.len());
    }
}
