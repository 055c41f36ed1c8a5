//! Page discovery and pre-processing
//!
//! Pages are collected in natural reading order. JPEGs go into the PDF as
//! they are; PNGs are flattened onto white and WebPs become JPEGs, both
//! written to numbered files in a scratch directory so the order survives.

use crate::config::MangaConfig;
use serde::Serialize;
use shared_utils::conversion::{ConversionTask, FallbackPlan};
use shared_utils::errors::Result;
use shared_utils::path_safety::safe_path_arg;
use shared_utils::tool_runner::{ToolInvocation, ToolSpec};
use shared_utils::walker::{TreeWalker, WalkEvent};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// Used unchanged.
    AsIs,
    /// PNG with its alpha channel removed.
    FlattenPng,
    /// WebP re-encoded as JPEG.
    WebpToJpeg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub number: usize,
    pub source: PathBuf,
    pub kind: PageKind,
}

impl Page {
    /// Scratch file name for pages that get pre-processed.
    pub fn prepared_name(&self) -> Option<String> {
        match self.kind {
            PageKind::AsIs => None,
            PageKind::FlattenPng => Some(format!("tmp{}.png", self.number)),
            PageKind::WebpToJpeg => Some(format!("tmp{}.jpg", self.number)),
        }
    }
}

fn classify(path: &Path, config: &MangaConfig) -> Option<PageKind> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some(PageKind::AsIs),
        "png" if config.flatten_png => Some(PageKind::FlattenPng),
        "webp" if config.webp_to_jpg => Some(PageKind::WebpToJpeg),
        "png" | "webp" => Some(PageKind::AsIs),
        _ => None,
    }
}

/// Walk `config.input_dir` in reading order and hand every page to
/// `on_page` as soon as it is found, numbered from 1. Files that are not
/// pages are logged and left out. Returns the number of pages handed over.
pub fn walk_pages<F>(config: &MangaConfig, mut on_page: F) -> Result<usize>
where
    F: FnMut(Page) -> ControlFlow<()>,
{
    let walker = TreeWalker::new(&config.input_dir).ignore_dir(config.run.ignore_dir.as_deref());
    let mut count = 0;
    for event in walker.walk() {
        match event? {
            WalkEvent::Directory { path, .. } => {
                tracing::info!(dir = %path.display(), "📂 Reading directory");
            }
            WalkEvent::File(file) => match classify(&file.path, config) {
                Some(kind) => {
                    count += 1;
                    let page = Page {
                        number: count,
                        source: file.path,
                        kind,
                    };
                    if on_page(page).is_break() {
                        break;
                    }
                }
                None => tracing::debug!(file = %file.path.display(), "Not a page, ignored"),
            },
        }
    }
    Ok(count)
}

/// Every page below `config.input_dir` in reading order.
pub fn collect_pages(config: &MangaConfig) -> Result<Vec<Page>> {
    let mut pages = Vec::new();
    walk_pages(config, |page| {
        pages.push(page);
        ControlFlow::Continue(())
    })?;
    Ok(pages)
}

/// `magick <in> <flags> <out>` for one page.
fn magick_page(magick: &ToolSpec, kind: PageKind, input: &Path, output: &Path) -> ToolInvocation {
    let invocation = magick
        .invocation()
        .path_arg(input)
        .args(["-background", "white", "-alpha", "remove"]);
    let invocation = match kind {
        PageKind::FlattenPng => invocation.args(["-define", "png:compression-level=9"]),
        PageKind::WebpToJpeg | PageKind::AsIs => invocation.args([
            "-quality",
            "90",
            "-colorspace",
            "YUV",
            "-define",
            "jpeg:dct-method=float",
        ]),
    };
    invocation.args(["-strip", "-auto-orient"]).path_arg(output)
}

/// Conversion of one page into `scratch`. The fallback renders only the
/// first frame, which rescues animated WebPs and multi-page files.
pub fn page_task(magick: &ToolSpec, page: &Page, scratch: &Path) -> Option<ConversionTask> {
    let output = scratch.join(page.prepared_name()?);
    let intermediate = scratch.join(format!("tmp{}.fallback.png", page.number));

    let mut first_frame = safe_path_arg(&page.source).into_owned();
    first_frame.push("[0]");

    Some(ConversionTask {
        input: page.source.clone(),
        primary: magick_page(magick, page.kind, &page.source, &output),
        fallback: Some(FallbackPlan {
            prepare: magick
                .invocation()
                .arg(first_frame)
                .args(["-render", "-auto-orient"])
                .path_arg(&intermediate),
            retry: magick_page(magick, page.kind, &intermediate, &output),
            intermediate,
        }),
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MangaCli;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn config(input: &Path, extra: &[&str]) -> MangaConfig {
        let input = input.display().to_string();
        let mut args = vec!["manga-pdf", input.as_str(), "out.pdf", "--no-nice"];
        args.extend_from_slice(extra);
        MangaCli::parse_from(args).resolve().unwrap()
    }

    fn names(pages: &[Page], root: &Path) -> Vec<String> {
        pages
            .iter()
            .map(|p| p.source.strip_prefix(root).unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn test_reading_order_volumes_then_chapters() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for dir in ["Chapter 2", "Chapter 10", "Volume 1/Chapter 1"] {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
        fs::write(root.join("Chapter 2/1.jpg"), b"x").unwrap();
        fs::write(root.join("Chapter 10/1.jpg"), b"x").unwrap();
        fs::write(root.join("Volume 1/Chapter 1/1.png"), b"x").unwrap();
        fs::write(root.join("Chapter 10/info.txt"), b"x").unwrap();

        let pages = collect_pages(&config(root, &[])).unwrap();
        assert_eq!(
            names(&pages, root),
            vec!["Volume 1/Chapter 1/1.png", "Chapter 2/1.jpg", "Chapter 10/1.jpg"]
        );
        assert_eq!(pages[0].kind, PageKind::FlattenPng);
        assert_eq!(pages[1].kind, PageKind::AsIs);
        assert_eq!(pages.iter().map(|p| p.number).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_pages_handed_over_during_walk() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("Chapter 1")).unwrap();
        fs::create_dir_all(root.join("Chapter 2")).unwrap();
        fs::write(root.join("Chapter 1/1.jpg"), b"x").unwrap();
        fs::write(root.join("Chapter 2/1.jpg"), b"x").unwrap();

        // a page added to a folder the walk has not opened yet still shows
        // up, so each page is handed over before the walk moves on
        let mut seen = Vec::new();
        let count = walk_pages(&config(root, &[]), |page| {
            if page.number == 1 {
                fs::write(root.join("Chapter 2/2.jpg"), b"x").unwrap();
            }
            seen.push(page.source.strip_prefix(root).unwrap().display().to_string());
            ControlFlow::Continue(())
        })
        .unwrap();

        assert_eq!(count, 3);
        assert_eq!(seen, vec!["Chapter 1/1.jpg", "Chapter 2/1.jpg", "Chapter 2/2.jpg"]);
    }

    #[test]
    fn test_walk_stops_on_break() {
        let temp = TempDir::new().unwrap();
        for n in 1..=5 {
            fs::write(temp.path().join(format!("{}.jpg", n)), b"x").unwrap();
        }
        let mut seen = 0;
        let count = walk_pages(&config(temp.path(), &[]), |page| {
            seen += 1;
            if page.number == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();
        assert_eq!((seen, count), (2, 2));
    }

    #[test]
    fn test_page_numbers_sort_naturally() {
        let temp = TempDir::new().unwrap();
        for n in [1, 2, 10, 11, 3] {
            fs::write(temp.path().join(format!("{}.jpg", n)), b"x").unwrap();
        }
        let pages = collect_pages(&config(temp.path(), &[])).unwrap();
        assert_eq!(
            names(&pages, temp.path()),
            vec!["1.jpg", "2.jpg", "3.jpg", "10.jpg", "11.jpg"]
        );
    }

    #[test]
    fn test_flags_keep_pages_as_is() {
        let cfg = config(Path::new("."), &["--no-png-alpha-removal", "--no-webp-to-jpg"]);
        assert_eq!(classify(Path::new("a.PNG"), &cfg), Some(PageKind::AsIs));
        assert_eq!(classify(Path::new("a.webp"), &cfg), Some(PageKind::AsIs));
        assert_eq!(classify(Path::new("a.gif"), &cfg), None);

        let cfg = config(Path::new("."), &[]);
        assert_eq!(classify(Path::new("a.WebP"), &cfg), Some(PageKind::WebpToJpeg));
    }

    #[test]
    fn test_magick_arguments() {
        let magick = ToolSpec::parse("magick").unwrap();
        let page = Page {
            number: 7,
            source: PathBuf::from("ch1/07.webp"),
            kind: PageKind::WebpToJpeg,
        };
        let task = page_task(&magick, &page, Path::new("/scratch")).unwrap();
        assert_eq!(task.output, PathBuf::from("/scratch/tmp7.jpg"));
        assert_eq!(
            task.primary.command_line(),
            "magick ch1/07.webp -background white -alpha remove -quality 90 -colorspace YUV \
             -define jpeg:dct-method=float -strip -auto-orient /scratch/tmp7.jpg"
        );
        let fb = task.fallback.unwrap();
        assert_eq!(
            fb.prepare.command_line(),
            "magick ch1/07.webp[0] -render -auto-orient /scratch/tmp7.fallback.png"
        );

        let png = Page {
            number: 1,
            source: PathBuf::from("01.png"),
            kind: PageKind::FlattenPng,
        };
        let task = page_task(&magick, &png, Path::new("/s")).unwrap();
        assert!(task.primary.command_line().contains("png:compression-level=9"));

        let jpg = Page {
            number: 2,
            source: PathBuf::from("02.jpg"),
            kind: PageKind::AsIs,
        };
        assert!(page_task(&magick, &jpg, Path::new("/s")).is_none());
    }
}
