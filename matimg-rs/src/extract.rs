//! File discovery, per-file extraction and the batch driver.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use regex::Regex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ExtractConfig;
use crate::error::{Error, Result};
use crate::frames::resolve_frames;
use crate::mat::MatFile;
use crate::pixel;

/// File names that carry a numeric chip id.
const CHIP_ID_PATTERN: &str = r"(?i)^Chip_(\d+)\.mat$";

/// Planned output for one frame (dry-run).
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFrame {
    /// 1-based frame index.
    pub index: usize,
    /// Shape as stored in the file.
    pub source_shape: Vec<usize>,
    /// Shape after pixel normalization.
    pub output_shape: Vec<usize>,
    /// Destination path.
    pub path: PathBuf,
}

/// What extracting one file would do.
#[derive(Debug, Clone)]
pub struct FilePlan {
    /// Input file.
    pub source: PathBuf,
    /// Variable name as stored in the file.
    pub variable: String,
    /// Kind of collection the variable resolved to.
    pub collection: &'static str,
    /// Frames available in the collection.
    pub available: usize,
    /// Derived chip id.
    pub chip_id: String,
    /// Frames that would be written.
    pub frames: Vec<PlannedFrame>,
}

/// Result of processing one file in a batch.
#[derive(Debug)]
pub struct FileOutcome {
    /// Input file.
    pub path: PathBuf,
    /// Written JPEG paths, or the error that stopped the file.
    pub result: Result<Vec<PathBuf>>,
}

impl FileOutcome {
    /// File name of the input, for status lines.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Check if the file was fully extracted.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a batch run.
#[derive(Debug)]
pub struct BatchReport {
    /// Per-file outcomes, in processing order.
    pub outcomes: Vec<FileOutcome>,
    /// Images written by fully successful files.
    pub images: usize,
    /// Directory the images were written to.
    pub output_dir: PathBuf,
}

impl BatchReport {
    /// Number of files that succeeded.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ok()).count()
    }

    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }
}

/// Extracts image frames from MAT files according to an [`ExtractConfig`].
///
/// # Example
///
/// ```no_run
/// use matimg_rs::{ExtractConfig, Extractor};
///
/// let extractor = Extractor::new(ExtractConfig::new("imagens_mat", "imagens_jpg"))?;
/// let report = extractor.run(|outcome| match &outcome.result {
///     Ok(_) => println!("[OK] {}", outcome.file_name()),
///     Err(e) => println!("[ERRO] {}: {}", outcome.file_name(), e),
/// })?;
/// println!("Total: {} images", report.images);
/// # Ok::<(), matimg_rs::Error>(())
/// ```
#[derive(Debug)]
pub struct Extractor {
    config: ExtractConfig,
    pattern: Pattern,
    chip_re: Regex,
}

impl Extractor {
    /// Validate the configuration and build an extractor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an invalid glob, a quality
    /// outside 1..=100 or a frame count of zero.
    pub fn new(config: ExtractConfig) -> Result<Self> {
        let pattern = Pattern::new(&config.pattern).map_err(|e| {
            Error::invalid_config(format!("invalid pattern '{}': {}", config.pattern, e))
        })?;
        if !(1..=100).contains(&config.quality) {
            return Err(Error::invalid_config(format!(
                "JPEG quality must be between 1 and 100, got {}",
                config.quality
            )));
        }
        if config.frames == 0 {
            return Err(Error::invalid_config("frame count must be at least 1"));
        }
        let chip_re = Regex::new(CHIP_ID_PATTERN)
            .map_err(|e| Error::invalid_config(format!("chip id pattern: {}", e)))?;

        Ok(Extractor {
            config,
            pattern,
            chip_re,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Files in the input directory matching the pattern, sorted.
    ///
    /// Only direct children are considered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoInputFiles`] when nothing matches, including when
    /// the directory does not exist.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.config.input_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.pattern.matches(&e.file_name().to_string_lossy()))
            .map(|e| e.into_path())
            .collect();

        if files.is_empty() {
            return Err(Error::NoInputFiles {
                dir: self.config.input_dir.clone(),
                pattern: self.config.pattern.clone(),
            });
        }

        files.sort();
        debug!(
            "Found {} files matching '{}' in {}",
            files.len(),
            self.config.pattern,
            self.config.input_dir.display()
        );
        Ok(files)
    }

    /// Chip id of a file: the digits of `Chip_<digits>.mat`, else the stem.
    pub fn chip_id(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        match self.chip_re.captures(&name) {
            Some(caps) => caps[1].to_string(),
            None => path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Resolve and validate a file without writing anything.
    pub fn plan_file(&self, path: &Path) -> Result<FilePlan> {
        let mat = MatFile::open(path)?;
        let (name, value) = mat.require_case_insensitive(&self.config.variable)?;
        let frames = resolve_frames(name, value, self.config.frames)?;
        let chip_id = self.chip_id(path);

        let mut planned = Vec::with_capacity(self.config.frames);
        for index in 1..=self.config.frames {
            let frame = frames.frame(index - 1)?;
            planned.push(PlannedFrame {
                index,
                source_shape: frame.shape().to_vec(),
                output_shape: pixel::normalize(&frame).shape().to_vec(),
                path: self.config.output_path(&chip_id, index),
            });
        }

        Ok(FilePlan {
            source: path.to_path_buf(),
            variable: name.to_string(),
            collection: frames.kind(),
            available: frames.len(),
            chip_id,
            frames: planned,
        })
    }

    /// Extract the configured frames of one file.
    ///
    /// Frames are written in order; a failure on frame `i` leaves frames
    /// before it on disk.
    ///
    /// # Returns
    ///
    /// Paths of the written JPEG files.
    pub fn extract_file(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mat = MatFile::open(path)?;
        let (name, value) = mat.require_case_insensitive(&self.config.variable)?;
        let frames = resolve_frames(name, value, self.config.frames)?;
        let chip_id = self.chip_id(path);

        fs::create_dir_all(&self.config.output_dir)?;

        let mut written = Vec::with_capacity(self.config.frames);
        for index in 1..=self.config.frames {
            let frame = frames.frame(index - 1)?;
            let out = self.config.output_path(&chip_id, index);
            pixel::save_jpeg(&frame, &out, self.config.quality)?;
            debug!("Wrote {} ({:?})", out.display(), frame.shape());
            written.push(out);
        }

        Ok(written)
    }

    /// Process every discovered file, reporting each outcome to `on_file`.
    ///
    /// Per-file errors are reported and do not stop the batch.
    ///
    /// # Errors
    ///
    /// Only [`Error::NoInputFiles`] aborts the run.
    pub fn run(&self, mut on_file: impl FnMut(&FileOutcome)) -> Result<BatchReport> {
        let files = self.discover()?;
        info!(
            "Extracting '{}' from {} files into {}",
            self.config.variable,
            files.len(),
            self.config.output_dir.display()
        );

        let mut outcomes = Vec::with_capacity(files.len());
        let mut images = 0;

        for path in files {
            let result = self.extract_file(&path);
            match &result {
                Ok(written) => images += written.len(),
                Err(e) => warn!("Failed to extract {}: {}", path.display(), e),
            }
            let outcome = FileOutcome { path, result };
            on_file(&outcome);
            outcomes.push(outcome);
        }

        info!("Extraction complete: {} images", images);
        Ok(BatchReport {
            outcomes,
            images,
            output_dir: self.config.output_dir.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn extractor() -> Extractor {
        Extractor::new(ExtractConfig::new("in", "out")).unwrap()
    }

    #[test]
    fn test_chip_id_from_pattern() {
        let e = extractor();
        assert_eq!(e.chip_id(Path::new("/data/Chip_0042.mat")), "0042");
        assert_eq!(e.chip_id(Path::new("chip_7.MAT")), "7");
    }

    #[test]
    fn test_chip_id_falls_back_to_stem() {
        let e = extractor();
        assert_eq!(e.chip_id(Path::new("session_a.mat")), "session_a");
        assert_eq!(e.chip_id(Path::new("Chip_12b.mat")), "Chip_12b");
    }

    #[test]
    fn test_invalid_config() {
        let bad_quality = ExtractConfig::new("in", "out").quality(0);
        assert!(matches!(Extractor::new(bad_quality), Err(Error::InvalidConfig { .. })));

        let bad_frames = ExtractConfig::new("in", "out").frames(0);
        assert!(matches!(Extractor::new(bad_frames), Err(Error::InvalidConfig { .. })));

        let bad_pattern = ExtractConfig::new("in", "out").pattern("Chip_[.mat");
        assert!(matches!(Extractor::new(bad_pattern), Err(Error::InvalidConfig { .. })));
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        for name in ["Chip_2.mat", "Chip_10.mat", "Chip_1.mat", "notes.txt", "other.mat"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("Chip_dir.mat")).unwrap();

        let e = Extractor::new(ExtractConfig::new(dir.path(), dir.path().join("out"))).unwrap();
        let names: Vec<_> = e
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["Chip_1.mat", "Chip_10.mat", "Chip_2.mat"]);
    }

    #[test]
    fn test_discover_empty_names_directory() {
        let dir = TempDir::new().unwrap();
        let e = Extractor::new(ExtractConfig::new(dir.path(), "out")).unwrap();
        match e.discover() {
            Err(Error::NoInputFiles { dir: searched, .. }) => assert_eq!(searched, dir.path()),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
