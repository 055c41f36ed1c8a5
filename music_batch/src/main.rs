use anyhow::Context;
use shared_utils::cli::{parse_args, EXIT_FAILURE};
use shared_utils::logging::{init_logging, LogConfig};
use shared_utils::report::{print_simple_summary, print_summary_report};
use shared_utils::shutdown::Shutdown;
use std::time::Instant;

use music_batch::loudness::print_loudness_report;
use music_batch::MusicCli;

fn main() {
    let cli: MusicCli = parse_args();
    if let Err(e) = run(cli) {
        eprintln!("❌ {:#}", e);
        std::process::exit(EXIT_FAILURE);
    }
}

fn run(cli: MusicCli) -> anyhow::Result<()> {
    let mut log_config = LogConfig::default().verbose(cli.common.verbose || cli.common.dry_run);
    if let Some(dir) = &cli.common.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    if let Err(e) = init_logging("music_batch", log_config) {
        eprintln!("⚠️  File logging disabled: {:#}", e);
    }

    let config = cli.resolve().context("Invalid arguments")?;
    config
        .ffmpeg
        .ensure_available(&["-version"])
        .context("This uses the `ffmpeg` command. Make sure ffmpeg and its codec libraries are installed, or point --ffmpeg-path at the executable")?;

    let shutdown = Shutdown::new();
    shutdown.install_handler()?;

    // JSON plans keep stdout machine-readable
    let chatty = !config.run.json;
    if chatty {
        println!(
            "🎵 Converting {} → {}",
            config.input_dir.display(),
            config.output_dir.display()
        );
        println!(
            "   Files ending in {} become .{}",
            config.mirror.input_mask, config.mirror.output_format
        );
        println!("   ffmpeg codec options: {}", config.ffmpeg_args.join(" "));
    }

    let start = Instant::now();
    let outcome = music_batch::run(&config, shutdown)?;

    if config.run.dry_run {
        if chatty {
            print_simple_summary(&outcome.result);
        }
    } else {
        print_summary_report(&outcome.result, start.elapsed(), "Music Conversion");
        print_loudness_report(&outcome.loudness);
    }
    Ok(())
}
