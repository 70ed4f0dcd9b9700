//! Extraction configuration.

use std::path::{Path, PathBuf};

use crate::pixel::DEFAULT_QUALITY;

/// Default filename pattern for input files.
pub const DEFAULT_PATTERN: &str = "Chip_*.mat";

/// Default prefix of output file names.
pub const DEFAULT_PREFIX: &str = "imagem";

/// Default name of the variable holding the frames.
pub const DEFAULT_VARIABLE: &str = "Icolor";

/// Default number of frames taken from each file.
pub const DEFAULT_FRAMES: usize = 5;

/// Configuration for a batch extraction.
///
/// # Example
///
/// ```
/// use matimg_rs::ExtractConfig;
///
/// let config = ExtractConfig::new("data/imagens_mat", "data/imagens_jpg")
///     .pattern("Chip_*.mat")
///     .prefix("imagem")
///     .quality(90);
///
/// assert_eq!(config.frames, 5);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Directory scanned for input files.
    pub input_dir: PathBuf,

    /// Directory receiving the JPEG files.
    pub output_dir: PathBuf,

    /// Glob applied to file names in `input_dir`.
    pub pattern: String,

    /// Prefix of output file names.
    pub prefix: String,

    /// Variable holding the frames, matched ignoring case.
    pub variable: String,

    /// Frames taken from each file.
    pub frames: usize,

    /// JPEG quality (1-100).
    pub quality: u8,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            pattern: DEFAULT_PATTERN.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            variable: DEFAULT_VARIABLE.to_string(),
            frames: DEFAULT_FRAMES,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ExtractConfig {
    /// Create a configuration with default naming for the given directories.
    pub fn new(input_dir: impl AsRef<Path>, output_dir: impl AsRef<Path>) -> Self {
        ExtractConfig {
            input_dir: input_dir.as_ref().to_path_buf(),
            output_dir: output_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Set the input file pattern.
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Set the output file prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the variable name.
    pub fn variable(mut self, name: impl Into<String>) -> Self {
        self.variable = name.into();
        self
    }

    /// Set the number of frames taken per file.
    pub fn frames(mut self, count: usize) -> Self {
        self.frames = count;
        self
    }

    /// Set the JPEG quality.
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Output path of frame `index` (1-based) for `chip_id`.
    pub fn output_path(&self, chip_id: &str, index: usize) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}_{}.jpg", self.prefix, chip_id, index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ExtractConfig::default();
        assert_eq!(config.pattern, "Chip_*.mat");
        assert_eq!(config.prefix, "imagem");
        assert_eq!(config.variable, "Icolor");
        assert_eq!(config.frames, 5);
        assert_eq!(config.quality, 95);
    }

    #[test]
    fn test_config_builder() {
        let config = ExtractConfig::new("in", "out")
            .pattern("*.mat")
            .prefix("frame")
            .variable("Igray")
            .frames(3)
            .quality(80);

        assert_eq!(config.input_dir, PathBuf::from("in"));
        assert_eq!(config.pattern, "*.mat");
        assert_eq!(config.variable, "Igray");
        assert_eq!(config.frames, 3);
        assert_eq!(config.quality, 80);
        assert_eq!(config.output_path("12", 3), PathBuf::from("out/frame_12_3.jpg"));
    }
}
