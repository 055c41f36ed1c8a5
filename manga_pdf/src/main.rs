use anyhow::Context;
use shared_utils::cli::{parse_args, EXIT_FAILURE};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::report::{print_simple_summary, print_summary_report};
use shared_utils::shutdown::Shutdown;
use std::time::Instant;

use manga_pdf::MangaCli;

fn main() {
    let cli: MangaCli = parse_args();
    if let Err(e) = run(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
}

fn run(cli: MangaCli) -> anyhow::Result<()> {
    let mut log_config = LogConfig::default().verbose(cli.common.verbose || cli.common.dry_run);
    if let Some(dir) = &cli.common.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    if let Err(e) = init_logging("manga_pdf", log_config) {
        eprintln!("⚠️  File logging disabled: {:#}", e);
    }

    let config = cli.resolve().context("Invalid arguments")?;
    config
        .magick
        .ensure_available(&["-version"])
        .context("This uses the `magick` command. Install ImageMagick 7, or point --magick-path at the executable")?;
    config
        .img2pdf
        .ensure_available(&["--version"])
        .context("This uses the `img2pdf` command. Install it (pip install img2pdf), or point --img2pdf-path at the executable")?;

    let shutdown = Shutdown::new();
    shutdown.install_handler()?;

    let chatty = !config.run.json;
    if chatty {
        println!("📘 Working through {}", config.input_dir.display());
        println!("   Output as {}", config.output_pdf.display());
        if let Some(size) = config.page_size.img2pdf_arg() {
            println!("   Page size {}", size);
        }
    }

    let start = Instant::now();
    let outcome = manga_pdf::build_pdf(&config, shutdown)
        .with_context(|| format!("Could not build {}", config.output_pdf.display()))?;

    if config.run.dry_run {
        if chatty {
            print_simple_summary(&outcome.result);
        }
    } else {
        print_summary_report(&outcome.result, start.elapsed(), "Manga PDF");
        println!(
            "📘 {} ({} pages)",
            config.output_pdf.display(),
            outcome.bound_pages
        );
    }
    Ok(())
}
