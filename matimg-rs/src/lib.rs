//! # matimg-rs
//!
//! Extract image frames stored in MATLAB `.mat` files and write them as
//! JPEG images.
//!
//! Imaging rigs commonly export each capture session as a `.mat` file
//! holding a cell array of frames (`Icolor`). This crate decodes Level 5
//! MAT files, including cell and struct arrays, resolves the frame
//! collection, normalizes every frame to 8-bit pixels and encodes it.
//!
//! ## Quick Start
//!
//! ### Batch conversion
//!
//! ```no_run
//! use matimg_rs::{ExtractConfig, Extractor, Result};
//!
//! fn main() -> Result<()> {
//!     let config = ExtractConfig::new("imagens_mat", "imagens_jpg")
//!         .pattern("Chip_*.mat")
//!         .prefix("imagem");
//!
//!     let extractor = Extractor::new(config)?;
//!     let report = extractor.run(|outcome| match &outcome.result {
//!         Ok(files) => println!("[OK] {} -> {} images", outcome.file_name(), files.len()),
//!         Err(e) => println!("[ERRO] {}: {}", outcome.file_name(), e),
//!     })?;
//!
//!     println!("Total extracted: {} images", report.images);
//!     Ok(())
//! }
//! ```
//!
//! ### Inspecting a MAT file
//!
//! ```no_run
//! use matimg_rs::{resolve_frames, MatFile, Result};
//!
//! fn main() -> Result<()> {
//!     let mat = MatFile::open("Chip_1.mat")?;
//!     let (name, value) = mat.require_case_insensitive("Icolor")?;
//!     let frames = resolve_frames(name, value, 5)?;
//!
//!     for i in 0..frames.len() {
//!         println!("frame {}: {:?}", i + 1, frames.frame(i)?.shape());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pixel normalization
//!
//! See [`pixel`] for the exact rules: float frames with a maximum of at most
//! 1.0 are scaled by 255, everything is clipped to `[0, 255]`, and
//! channel-first arrays are transposed to channel-last.
//!
//! ## Feature Flags
//!
//! - `test-util`: expose [`testing`], a Level 5 writer for building fixtures

#![deny(missing_docs)]

// Modules
mod config;
mod data_type;
mod error;
mod extract;
mod frames;
pub mod mat;
pub mod pixel;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Public exports
pub use config::{
    ExtractConfig, DEFAULT_FRAMES, DEFAULT_PATTERN, DEFAULT_PREFIX, DEFAULT_VARIABLE,
};
pub use data_type::{DataType, MatClass};
pub use error::{Error, Result};
pub use extract::{BatchReport, Extractor, FileOutcome, FilePlan, PlannedFrame};
pub use frames::{resolve_frames, FrameCollection, ImageFrame};
pub use mat::{MatFile, MatValue};
