//! music-batch - mirror a music library through ffmpeg
//!
//! Matching audio files are transcoded (OGG/Vorbis by default, presets for
//! Opus and MP3), everything else is copied so the output is a complete,
//! playable copy of the library.

pub mod config;
pub mod converter;
pub mod cover_art;
pub mod loudness;
pub mod presets;

pub use config::{MusicCli, MusicConfig};
pub use converter::{run, FfmpegPlanner, MusicRun};
pub use presets::MusicPreset;
