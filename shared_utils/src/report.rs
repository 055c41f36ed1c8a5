//! Report Module
//!
//! End-of-run summary box plus the list of files that failed.

use crate::batch::BatchResult;
use crate::progress::format_duration;
use console::style;
use std::time::Duration;

pub fn print_summary_report(result: &BatchResult, duration: Duration, operation_name: &str) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║  📊 {:<57}║", format!("{} Summary Report", operation_name));
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  📁 Files Seen:         {:>10}                           ║", result.total);
    println!("║  ✅ Converted:          {:>10}                           ║", result.converted);
    if result.converted_with_fallback > 0 {
        println!(
            "║  🔁   via fallback:     {:>10}                           ║",
            result.converted_with_fallback
        );
    }
    println!("║  📦 Copied:             {:>10}                           ║", result.copied);
    println!("║  ⏭️  Skipped:            {:>10}                           ║", result.skipped);
    println!("║  ❌ Failed:             {:>10}                           ║", result.failed);
    if result.cancelled > 0 {
        println!("║  🛑 Cancelled:          {:>10}                           ║", result.cancelled);
    }
    println!(
        "║  📈 Success Rate:       {:>9.1}%                           ║",
        result.success_rate()
    );
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!(
        "║  ⏱️  Total Time:         {:>10}                           ║",
        format_duration(duration)
    );
    println!("╚══════════════════════════════════════════════════════════════╝");

    print_failures(result);
}

pub fn print_failures(result: &BatchResult) {
    if result.errors.is_empty() {
        return;
    }
    println!();
    println!("{}", style("❌ Files that could not be processed:").red().bold());
    for (path, error) in &result.errors {
        println!("   • {}: {}", path.display(), error);
    }
}

/// One-line variant for dry runs and the manga tool.
pub fn print_simple_summary(result: &BatchResult) {
    println!(
        "✅ {} out of {} files converted, {} copied, {} failed",
        result.converted,
        result.total - result.skipped,
        result.copied,
        result.failed
    );
}
