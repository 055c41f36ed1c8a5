use anyhow::Context;
use shared_utils::cli::{parse_args, EXIT_FAILURE};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::report::{print_simple_summary, print_summary_report};
use shared_utils::shutdown::Shutdown;
use std::time::Instant;

use picture_batch::PictureCli;

fn main() {
    let cli: PictureCli = parse_args();
    if let Err(e) = run(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
}

fn run(cli: PictureCli) -> anyhow::Result<()> {
    let mut log_config = LogConfig::default().verbose(cli.common.verbose || cli.common.dry_run);
    if let Some(dir) = &cli.common.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    if let Err(e) = init_logging("picture_batch", log_config) {
        eprintln!("⚠️  File logging disabled: {:#}", e);
    }

    let config = cli.resolve().context("Invalid arguments")?;
    config
        .cjxl
        .ensure_available(&["-h"])
        .context("This uses the `cjxl` command. Make sure libjxl's tools are installed, or point --cjxl-path at the executable")?;
    if let Err(e) = config.magick.ensure_available(&["-version"]) {
        eprintln!("⚠️  {}: images cjxl cannot read will fail", e);
    }

    let shutdown = Shutdown::new();
    shutdown.install_handler()?;

    let chatty = !config.run.json;
    if chatty {
        if config.preset.is_some() && cli.preset.is_none() {
            println!("💡 Neither a preset nor cjxl arguments given, using the balanced preset");
        }
        println!(
            "🖼️  Converting {} → {}",
            config.input_dir.display(),
            config.output_dir.display()
        );
        println!(
            "   Files ending in {} become .{}",
            config.mirror.input_mask, config.mirror.output_format
        );
        println!("   cjxl codec options: {}", config.cjxl_args.join(" "));
    }

    let start = Instant::now();
    let result = picture_batch::run(&config, shutdown)?;

    if !config.run.dry_run {
        print_summary_report(&result, start.elapsed(), "Picture Conversion");
    } else if chatty {
        print_simple_summary(&result);
    }
    Ok(())
}
