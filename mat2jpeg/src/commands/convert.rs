//! Main extraction command.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use colored::Colorize;

use matimg_rs::{BatchReport, Extractor};

use crate::cli::Args;
use crate::output;

/// Run the convert command.
pub fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let config = args.config();

    output::print_verbose(
        &format!(
            "Scanning {} for '{}'",
            config.input_dir.display(),
            config.pattern
        ),
        args.verbose,
    );

    let extractor = Extractor::new(config).context("Invalid extraction settings")?;
    let variable = extractor.config().variable.clone();

    let report = extractor.run(|outcome| match &outcome.result {
        Ok(written) => {
            output::print_file_ok(&outcome.file_name(), written.len(), &variable, args.quiet);
            for path in written {
                output::print_verbose(&format!("wrote {}", path.display()), args.verbose);
            }
        }
        Err(e) => output::print_file_error(&outcome.file_name(), e),
    })?;

    if !args.quiet {
        print_summary(&report, start_time.elapsed());
    }

    Ok(())
}

/// Print extraction summary.
fn print_summary(report: &BatchReport, elapsed: Duration) {
    println!();
    println!(
        "{} Total extracted: {} images",
        "Done.".green().bold(),
        output::format_number(report.images)
    );
    println!("Output: {}", report.output_dir.display());

    println!();
    output::print_kv("Files processed", &report.outcomes.len().to_string(), 2);
    output::print_kv("Succeeded", &report.succeeded().to_string(), 2);
    if report.failed() > 0 {
        output::print_kv("Failed", &report.failed().to_string().red().to_string(), 2);
    }
    output::print_kv(
        "Processing time",
        &output::format_duration(elapsed.as_secs_f64()),
        2,
    );

    // Performance stat
    if elapsed.as_secs_f64() > 0.001 && report.images > 0 {
        let ips = report.images as f64 / elapsed.as_secs_f64();
        output::print_kv("Speed", &format!("{:.0} images/sec", ips), 2);
    }
}
