//! Named ffmpeg argument bundles. A selected preset replaces the input mask
//! (when it has one), the output format and the codec arguments.

use clap::ValueEnum;

pub const DEFAULT_INPUT_MASK: &str = "flac,wav,aif,aiff,dsd";
pub const DEFAULT_OUTPUT_FORMAT: &str = "ogg";
pub const DEFAULT_FFMPEG_ARGS: &str =
    "-map 0:v? -c:v libtheora -q:v 9 -map 0:a -c:a libvorbis -q:a 7";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MusicPreset {
    /// Loudness-normalized Opus, also re-encodes lossy sources
    Normalized,
    /// Small Opus files for phones
    Smaller,
    /// 320 kbit/s MP3 for old players
    Compatible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetConfig {
    pub input_mask: Option<&'static str>,
    pub output_format: &'static str,
    pub ffmpeg_args: &'static str,
}

impl MusicPreset {
    pub fn config(self) -> PresetConfig {
        match self {
            MusicPreset::Normalized => PresetConfig {
                input_mask: Some("flac,wav,aif,aiff,dsd,mp3,wma,aac,m4a"),
                output_format: "ogg",
                ffmpeg_args: "-map 0:v? -c:v libtheora -q:v 9 -map 0:a -c:a libopus -b:a 256k \
                              -vbr constrained -af aresample=osf=flt,loudnorm,alimiter=limit=0.95:level=off",
            },
            MusicPreset::Smaller => PresetConfig {
                input_mask: None,
                output_format: "ogg",
                ffmpeg_args: "-map 0:v? -c:v libtheora -q:v 6 -map 0:a -c:a libopus -b:a 128k -vbr constrained",
            },
            MusicPreset::Compatible => PresetConfig {
                input_mask: None,
                output_format: "mp3",
                ffmpeg_args: "-c:a libmp3lame -b:a 320k",
            },
        }
    }
}
