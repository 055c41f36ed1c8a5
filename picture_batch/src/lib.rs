//! picture-batch - mirror a picture collection into JPEG XL
//!
//! Images matching the input mask are encoded with cjxl, falling back to an
//! ImageMagick-rendered PNG when cjxl cannot read the source. Encoding is
//! memory hungry, so at most three encoders run by default.

pub mod config;
pub mod converter;
pub mod presets;

pub use config::{PictureCli, PictureConfig};
pub use converter::{run, CjxlPlanner};
pub use presets::PicturePreset;
