//! List variables command (--list mode).

use anyhow::{Context, Result};
use colored::Colorize;

use matimg_rs::{Extractor, MatFile, MatValue};

use crate::cli::Args;
use crate::output;

/// Run the list command.
pub fn run(args: &Args) -> Result<()> {
    let extractor = Extractor::new(args.config()).context("Invalid extraction settings")?;
    let files = extractor.discover()?;

    output::print_verbose(
        &format!("Found {} matching files", files.len()),
        args.verbose,
    );

    for path in &files {
        println!();

        let mat = match MatFile::open(path) {
            Ok(mat) => mat,
            Err(e) => {
                output::print_warning(&format!("cannot read {}: {}", path.display(), e));
                continue;
            }
        };

        if mat.is_empty() {
            output::print_warning(&format!("No variables found in {}", path.display()));
            continue;
        }

        println!("{}", mat.describe());
        println!();
        println!("{} variables found", mat.len());
        print_hints(&mat, &args.variable);
    }

    Ok(())
}

/// Point at the frame variable, or at what could hold frames instead.
fn print_hints(mat: &MatFile, wanted: &str) {
    match mat.find_case_insensitive(wanted) {
        Some((name, value)) => {
            let frames = match value {
                MatValue::Cell(cell) => format!(" with {} frames", cell.len()),
                _ => String::new(),
            };
            println!(
                "{}: '{}' is a {}{}",
                "hint".cyan(),
                name,
                value.type_name(),
                frames
            );
        }
        None => {
            let candidates: Vec<_> = mat
                .iter()
                .filter(|(_, v)| matches!(v, MatValue::Cell(c) if !c.is_empty()))
                .map(|(n, _)| n)
                .collect();
            println!("{}: no variable matches '{}'", "hint".cyan(), wanted);
            if !candidates.is_empty() {
                println!(
                    "      Possible frame variables: {:?} (use --variable)",
                    candidates
                );
            }
        }
    }

    if !mat.globals().is_empty() {
        println!("{}: global variables: {:?}", "hint".cyan(), mat.globals());
    }
}
