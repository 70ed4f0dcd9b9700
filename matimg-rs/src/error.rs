//! Error types for MAT decoding and frame extraction.
//!
//! This module provides the [`Error`] enum covering every failure mode of
//! loading a MAT file, resolving its image frames and writing them as JPEG,
//! along with a convenient [`Result`] type alias.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting frames from MAT files.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error from the underlying file system.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JPEG encoding failed.
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    /// The file is not a valid Level 5 MAT file or is truncated.
    #[error("Invalid MAT file format: {reason}")]
    InvalidFormat {
        /// Description of the format error.
        reason: String,
    },

    /// The file is a MAT flavour this crate does not decode (v7.3, Level 4).
    #[error("Unsupported MAT file: {reason}")]
    UnsupportedFormat {
        /// Description of what was found.
        reason: String,
    },

    /// The requested variable is not present in the file.
    #[error("Variable '{name}' not found. Available variables: {available:?}")]
    VariableNotFound {
        /// Name that was looked up.
        name: String,
        /// Non-metadata variable names present in the file.
        available: Vec<String>,
    },

    /// The variable exists but cannot be read as a collection of frames.
    #[error("Variable '{name}' found, but in an unexpected format: {found}")]
    UnexpectedCollection {
        /// Name of the variable.
        name: String,
        /// Observed MATLAB type.
        found: String,
    },

    /// The collection holds fewer frames than required.
    #[error("'{name}' contains {found} frame(s), expected >= {expected}")]
    NotEnoughFrames {
        /// Name of the variable.
        name: String,
        /// Number of frames found.
        found: usize,
        /// Number of frames required.
        expected: usize,
    },

    /// A collection element is not a numeric image.
    #[error("Frame {index} is a {found}, expected a numeric array")]
    InvalidFrame {
        /// 1-based frame index.
        index: usize,
        /// Observed MATLAB type.
        found: String,
    },

    /// The normalized frame has a shape JPEG cannot represent.
    #[error("Cannot encode frame of shape {shape:?} as JPEG")]
    UnsupportedFrameShape {
        /// Shape after normalization.
        shape: Vec<usize>,
    },

    /// No input files matched the configured pattern.
    #[error("No .mat files matching '{pattern}' found in {}", dir.display())]
    NoInputFiles {
        /// Directory that was searched.
        dir: PathBuf,
        /// Pattern that was applied.
        pattern: String,
    },

    /// The extraction configuration is not usable.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

impl Error {
    /// Create an InvalidFormat error with the given reason.
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat { reason: reason.into() }
    }

    /// Create an UnsupportedFormat error with the given reason.
    pub fn unsupported_format(reason: impl Into<String>) -> Self {
        Self::UnsupportedFormat { reason: reason.into() }
    }

    /// Create an InvalidConfig error with the given reason.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }

    /// Create an UnexpectedCollection error.
    pub fn unexpected_collection(name: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnexpectedCollection {
            name: name.into(),
            found: found.into(),
        }
    }

    /// Create an InvalidFrame error.
    pub fn invalid_frame(index: usize, found: impl Into<String>) -> Self {
        Self::InvalidFrame {
            index,
            found: found.into(),
        }
    }
}
