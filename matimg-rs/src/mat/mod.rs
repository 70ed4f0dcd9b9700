//! MAT file support for MATLAB/Octave file parsing.
//!
//! This module decodes Level 5 `.mat` files into a tree of [`MatValue`]s.
//! Unlike a numeric-only reader it keeps cell and struct arrays, which is
//! where image sequences exported from MATLAB usually live.
//!
//! # Overview
//!
//! - [`MatFile`] - Loads and provides access to MAT file contents
//! - [`MatValue`] - One decoded variable (numeric, char, cell, struct)
//! - [`NumericArray`] - A numeric array, convertible to an `ndarray`
//!
//! # Example
//!
//! ```no_run
//! use matimg_rs::{MatFile, MatValue};
//!
//! let mat = MatFile::open("Chip_7.mat")?;
//! println!("{}", mat.describe());
//!
//! if let Some(MatValue::Cell(cell)) = mat.get("Icolor") {
//!     println!("{} frames", cell.len());
//! }
//! # Ok::<(), matimg_rs::Error>(())
//! ```
//!
//! # Supported MAT Formats
//!
//! - Level 5 MAT files (MATLAB v5, v6, v7), little- and big-endian
//! - v7 compressed files
//!
//! # Not Supported
//!
//! - HDF5-based v7.3 files
//! - Sparse matrices, objects, function handles (listed, not decoded)

mod data;
mod file;
mod reader;

// Re-exports
pub use data::{
    format_dims, CellArray, CharArray, MatValue, NumericArray, NumericData, Record, StructArray,
};
pub use file::{MatFile, METADATA_PREFIX};
pub use reader::{ByteOrder, MatHeader};
