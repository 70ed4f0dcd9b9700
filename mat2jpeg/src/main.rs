//! mat2jpeg - Extract image frames from MATLAB .mat files as JPEG.
//!
//! This tool scans a directory of MAT files, pulls the first frames out of
//! the `Icolor` cell array in each one and writes them as JPEG images.

mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Args;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    init_logging(args.verbose);

    // Run the appropriate command
    if let Err(e) = run(args) {
        output::print_error(&e);
        std::process::exit(1);
    }
}

/// Install the stderr log subscriber. `RUST_LOG` overrides the default.
fn init_logging(verbose: bool) {
    let default = if verbose {
        "matimg_rs=debug,mat2jpeg=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Main dispatch function.
fn run(args: Args) -> Result<()> {
    // Validate arguments
    args.validate().map_err(|e| anyhow::anyhow!("{}", e))?;

    // Dispatch to appropriate command
    if args.list {
        commands::list::run(&args)
    } else if args.dry_run {
        commands::validate::run(&args)
    } else {
        commands::convert::run(&args)
    }
}
