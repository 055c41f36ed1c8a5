//! PDF assembly through img2pdf

use crate::layout::{PageSize, Rotation};
use shared_utils::errors::{BatchError, Result};
use shared_utils::file_copier::{ensure_parent_dir_exists, remove_if_present};
use shared_utils::tool_runner::{ToolInvocation, ToolRunner, ToolSpec};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct PdfLayout {
    pub page_size: PageSize,
    pub auto_orient: bool,
    pub rotation: Option<Rotation>,
}

/// `img2pdf [--pagesize WxH] [--auto-orient] [--rotation=X] -o <out> <pages…>`
pub fn img2pdf_invocation(
    img2pdf: &ToolSpec,
    layout: &PdfLayout,
    output: &Path,
    pages: &[PathBuf],
) -> ToolInvocation {
    let mut invocation = img2pdf.invocation();
    if let Some(size) = layout.page_size.img2pdf_arg() {
        invocation = invocation.arg("--pagesize").arg(size);
    }
    if layout.auto_orient {
        invocation = invocation.arg("--auto-orient");
    }
    if let Some(rotation) = layout.rotation {
        invocation = invocation.arg(format!("--rotation={}", rotation.as_str()));
    }
    invocation = invocation.arg("-o").path_arg(output);
    pages
        .iter()
        .fold(invocation, |inv, page| inv.path_arg(page))
}

pub fn assemble_pdf(
    runner: &ToolRunner,
    img2pdf: &ToolSpec,
    layout: &PdfLayout,
    output: &Path,
    pages: &[PathBuf],
) -> Result<()> {
    if pages.is_empty() {
        return Err(BatchError::PdfAssembly("no pages to bind".to_string()));
    }
    ensure_parent_dir_exists(output)?;

    let invocation = img2pdf_invocation(img2pdf, layout, output, pages);
    let result = runner.run(&invocation)?;
    if !result.success() {
        remove_if_present(output);
        let detail = result.output.trim();
        return Err(BatchError::PdfAssembly(match result.exit_code {
            Some(code) if detail.is_empty() => format!("img2pdf exited with status {}", code),
            Some(code) => format!("img2pdf exited with status {}: {}", code, detail),
            None => "img2pdf was terminated by a signal".to_string(),
        }));
    }
    if !output.exists() {
        return Err(BatchError::PdfAssembly(format!(
            "img2pdf produced no file at {}",
            output.display()
        )));
    }
    tracing::info!(pdf = %output.display(), pages = pages.len(), "📘 PDF written");
    Ok(())
}
