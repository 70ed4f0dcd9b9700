//! Command-line argument definitions using clap derive macros.

use clap::Parser;
use std::path::PathBuf;

use matimg_rs::pixel::DEFAULT_QUALITY;
use matimg_rs::{ExtractConfig, DEFAULT_FRAMES, DEFAULT_PATTERN, DEFAULT_PREFIX, DEFAULT_VARIABLE};

/// Convert image frames stored in MATLAB .mat files to JPEG.
///
/// mat2jpeg scans a directory for .mat files, reads the cell array of
/// frames each one holds (Icolor by default) and writes the first frames
/// as `<prefix>_<chip>_<n>.jpg` files.
#[derive(Parser, Debug)]
#[command(name = "mat2jpeg")]
#[command(author, version, about, long_about = None)]
#[command(after_help = EXAMPLES)]
pub struct Args {
    /// Directory containing the .mat files
    #[arg(value_name = "INPUT_DIR")]
    pub input_dir: PathBuf,

    /// Directory receiving the JPEG files (created if missing)
    #[arg(value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    // ========================================================================
    // Mode Selection
    // ========================================================================
    /// List variables in each matching MAT file and exit
    #[arg(short, long)]
    pub list: bool,

    /// Validate every file without writing output
    #[arg(long)]
    pub dry_run: bool,

    // ========================================================================
    // Input Selection
    // ========================================================================
    /// Glob selecting input files inside INPUT_DIR
    #[arg(short, long, value_name = "GLOB", default_value = DEFAULT_PATTERN)]
    pub pattern: String,

    /// Variable holding the frames (matched ignoring case)
    #[arg(long = "variable", value_name = "NAME", default_value = DEFAULT_VARIABLE)]
    pub variable: String,

    /// Number of frames to extract from each file
    #[arg(short = 'n', long, value_name = "N", default_value_t = DEFAULT_FRAMES)]
    pub frames: usize,

    // ========================================================================
    // Output Naming
    // ========================================================================
    /// Prefix of the output file names
    #[arg(long, value_name = "PREFIX", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// JPEG quality (1-100)
    #[arg(long, value_name = "Q", default_value_t = DEFAULT_QUALITY)]
    pub quality: u8,

    // ========================================================================
    // Output Control
    // ========================================================================
    /// Show detailed progress and information
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Validate argument combinations.
    pub fn validate(&self) -> Result<(), String> {
        // Quiet and verbose are mutually exclusive
        if self.quiet && self.verbose {
            return Err("Cannot use both --quiet and --verbose".to_string());
        }

        // List mode reads only
        if self.list {
            return Ok(());
        }

        if self.output_dir.is_none() {
            return Err("Output directory is required (or use --list)".to_string());
        }

        if !(1..=100).contains(&self.quality) {
            return Err(format!(
                "Quality must be between 1 and 100, got {}",
                self.quality
            ));
        }

        if self.frames == 0 {
            return Err("Frame count must be at least 1".to_string());
        }

        Ok(())
    }

    /// Build the extraction configuration.
    pub fn config(&self) -> ExtractConfig {
        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| self.input_dir.clone());

        ExtractConfig::new(&self.input_dir, output_dir)
            .pattern(&self.pattern)
            .variable(&self.variable)
            .prefix(&self.prefix)
            .frames(self.frames)
            .quality(self.quality)
    }
}

/// Example usage shown in --help.
const EXAMPLES: &str = r#"
EXAMPLES:
    # Convert every Chip_*.mat file
    mat2jpeg data/imagens_mat data/imagens_jpg

    # List the variables stored in each file
    mat2jpeg --list data/imagens_mat

    # Check every file without writing anything
    mat2jpeg --dry-run data/imagens_mat data/imagens_jpg

    # Different variable, naming and quality
    mat2jpeg data/mat out --variable Igray --prefix frame --quality 90

    # Take only the first three frames of any .mat file
    mat2jpeg data/mat out --pattern '*.mat' -n 3
"#;
