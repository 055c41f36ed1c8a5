//! Cover art extraction
//!
//! Players on phones and car stereos look for `cover.jpg` next to the
//! tracks. When a source folder has no cover image, the first converted
//! track of that folder donates its embedded picture. Any failure simply
//! means no cover art.

use shared_utils::file_copier::remove_if_present;
use shared_utils::tool_runner::{ToolRunner, ToolSpec};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub const COVER_FILE_NAME: &str = "cover.jpg";
const COVER_STEMS: &[&str] = &["cover", "folder", "front", "albumart"];
const COVER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Whether `dir` already holds an image that players pick up as cover.
pub fn has_cover_image(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let path = entry.path();
        let stem = path.file_stem().map(|s| s.to_string_lossy().to_lowercase());
        let ext = path.extension().map(|e| e.to_string_lossy().to_lowercase());
        matches!(
            (stem, ext),
            (Some(s), Some(e)) if COVER_STEMS.contains(&s.as_str()) && COVER_EXTENSIONS.contains(&e.as_str())
        )
    })
}

#[derive(Debug, Default)]
pub struct CoverExtractor {
    claimed: Mutex<HashSet<PathBuf>>,
}

impl CoverExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// First caller per output directory wins.
    fn claim(&self, output_dir: &Path) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(output_dir.to_path_buf())
    }

    /// Returns the written cover path, if any.
    pub fn extract(
        &self,
        runner: &ToolRunner,
        ffmpeg: &ToolSpec,
        track: &Path,
        output_dir: &Path,
    ) -> Option<PathBuf> {
        if !self.claim(output_dir) {
            return None;
        }
        let source_dir = track.parent()?;
        let cover = output_dir.join(COVER_FILE_NAME);
        if has_cover_image(source_dir) || cover.exists() {
            return None;
        }

        let invocation = ffmpeg
            .invocation()
            .args(["-y", "-loglevel", "error", "-i"])
            .path_arg(track)
            .args(["-an", "-frames:v", "1"])
            .path_arg(&cover);
        let produced = matches!(runner.run(&invocation), Ok(out) if out.success()) && cover.exists();
        if produced {
            tracing::info!(cover = %cover.display(), "🖼️ Extracted cover art");
            Some(cover)
        } else {
            remove_if_present(&cover);
            tracing::debug!(track = %track.display(), "No cover art found");
            None
        }
    }
}
