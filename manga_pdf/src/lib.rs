//! manga-pdf - bind chapters and volumes of page images into one PDF
//!
//! Pages are read in natural order, pre-processed with ImageMagick where
//! the PDF needs it and bound with img2pdf.

pub mod builder;
pub mod config;
pub mod layout;
pub mod pages;
pub mod pdf;

pub use builder::{build_pdf, MangaRun};
pub use config::{MangaCli, MangaConfig};
pub use layout::{LayoutPreset, Length, PageSize, Rotation};
pub use pages::{collect_pages, Page, PageKind};
