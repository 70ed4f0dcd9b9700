//! Dry-run validation command.

use anyhow::{Context, Result};
use colored::Colorize;

use matimg_rs::mat::format_dims;
use matimg_rs::{Extractor, FilePlan};

use crate::cli::Args;
use crate::output;

/// Run the validate (dry-run) command.
pub fn run(args: &Args) -> Result<()> {
    if !args.quiet {
        println!("{} (no files will be written)", "Dry run mode".yellow());
    }

    let extractor = Extractor::new(args.config()).context("Invalid extraction settings")?;
    let files = extractor.discover()?;
    let config = extractor.config();

    if !args.quiet {
        output::print_header("Extraction Plan");
        println!();
        output::print_kv("Input", &config.input_dir.display().to_string(), 2);
        output::print_kv("Output", &config.output_dir.display().to_string(), 2);
        output::print_kv("Files", &files.len().to_string(), 2);
        output::print_kv("Variable", &config.variable, 2);
        output::print_kv("Frames per file", &config.frames.to_string(), 2);
        output::print_kv("Quality", &config.quality.to_string(), 2);
        println!();
        output::print_separator();
    }

    let mut ready = 0;
    let mut images = 0;

    for path in &files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match extractor.plan_file(path) {
            Ok(plan) => {
                ready += 1;
                images += plan.frames.len();
                print_plan(&name, &plan, args);
            }
            Err(e) => output::print_file_error(&name, &e),
        }
    }

    if !args.quiet {
        println!();
        println!(
            "{} of {} files ready, {} images would be written",
            ready,
            files.len(),
            output::format_number(images)
        );
    }

    Ok(())
}

fn print_plan(name: &str, plan: &FilePlan, args: &Args) {
    if args.quiet {
        return;
    }

    println!(
        "{} {}: '{}' {} with {} frames, chip {}",
        "[OK]".green().bold(),
        name,
        plan.variable,
        plan.collection,
        plan.available,
        plan.chip_id
    );

    if args.verbose {
        for frame in &plan.frames {
            let file = frame
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            println!(
                "    {} {:>12} -> {:<12} {}",
                frame.index,
                format_dims(&frame.source_shape),
                format_dims(&frame.output_shape),
                file.dimmed()
            );
        }
    }
}
