//! Frame collection resolution.
//!
//! The variable holding the frames can arrive in three shapes, and
//! [`FrameCollection`] classifies it once so later code never probes types
//! again:
//!
//! - a cell array (the normal MATLAB export), flattened in row-major order
//! - a struct array, seen as a sequence of records
//! - a bare numeric array (a single stored frame), iterated along its
//!   leading axis after dropping singleton dimensions

use ndarray::{ArrayD, Axis};

use crate::error::{Error, Result};
use crate::mat::{MatValue, NumericArray, Record};

/// One raw image array, before pixel normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFrame {
    pixels: ArrayD<f64>,
    float: bool,
}

impl ImageFrame {
    /// Wrap an array. `float` records whether the source type was floating-point.
    pub fn new(pixels: ArrayD<f64>, float: bool) -> Self {
        ImageFrame { pixels, float }
    }

    /// Build a frame from a decoded numeric array (real part only).
    pub fn from_numeric(array: &NumericArray) -> Result<Self> {
        Ok(ImageFrame {
            pixels: array.to_array()?,
            float: array.is_float(),
        })
    }

    /// Pixel values indexed like MATLAB.
    pub fn pixels(&self) -> &ArrayD<f64> {
        &self.pixels
    }

    /// Shape of the array.
    pub fn shape(&self) -> &[usize] {
        self.pixels.shape()
    }

    /// Whether the source element type was floating-point.
    pub fn is_float(&self) -> bool {
        self.float
    }
}

/// The frames held by one variable.
#[derive(Debug, Clone)]
pub enum FrameCollection<'a> {
    /// Cell array elements in row-major order.
    Objects(Vec<&'a MatValue>),
    /// Struct array elements in row-major order.
    Records(Vec<Record<'a>>),
    /// Sub-arrays of a single numeric array along its leading axis.
    Slices {
        /// The sub-arrays.
        frames: Vec<ArrayD<f64>>,
        /// Whether the source type was floating-point.
        float: bool,
    },
}

impl<'a> FrameCollection<'a> {
    /// Classify a decoded value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedCollection`] for values that cannot be
    /// iterated: char arrays, numeric scalars and undecoded classes.
    pub fn resolve(name: &str, value: &'a MatValue) -> Result<Self> {
        match value {
            MatValue::Cell(cell) => Ok(FrameCollection::Objects(cell.row_major())),
            MatValue::Struct(s) => Ok(FrameCollection::Records(s.records())),
            MatValue::Numeric(array) => {
                let mut pixels = array.to_array()?;
                for axis in (0..pixels.ndim()).rev() {
                    if pixels.shape()[axis] == 1 {
                        pixels = pixels.index_axis_move(Axis(axis), 0);
                    }
                }
                if pixels.ndim() == 0 {
                    return Err(Error::unexpected_collection(name, value.type_name()));
                }
                Ok(FrameCollection::Slices {
                    frames: pixels.outer_iter().map(|view| view.to_owned()).collect(),
                    float: array.is_float(),
                })
            }
            MatValue::Char(_) | MatValue::Unsupported { .. } => {
                Err(Error::unexpected_collection(name, value.type_name()))
            }
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        match self {
            FrameCollection::Objects(items) => items.len(),
            FrameCollection::Records(items) => items.len(),
            FrameCollection::Slices { frames, .. } => frames.len(),
        }
    }

    /// Check if there are no frames.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short description of the variant, for listings.
    pub fn kind(&self) -> &'static str {
        match self {
            FrameCollection::Objects(_) => "cell array",
            FrameCollection::Records(_) => "struct array",
            FrameCollection::Slices { .. } => "numeric array",
        }
    }

    /// Get frame `index` (0-based).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] (with a 1-based index) when the
    /// element is not a numeric array or the index is out of range.
    pub fn frame(&self, index: usize) -> Result<ImageFrame> {
        match self {
            FrameCollection::Objects(items) => match items.get(index) {
                Some(MatValue::Numeric(array)) => ImageFrame::from_numeric(array),
                Some(other) => Err(Error::invalid_frame(index + 1, other.type_name())),
                None => Err(Error::invalid_frame(index + 1, "missing element")),
            },
            FrameCollection::Records(items) => Err(Error::invalid_frame(
                index + 1,
                if index < items.len() { "struct record" } else { "missing element" },
            )),
            FrameCollection::Slices { frames, float } => frames
                .get(index)
                .map(|pixels| ImageFrame::new(pixels.clone(), *float))
                .ok_or_else(|| Error::invalid_frame(index + 1, "missing element")),
        }
    }
}

/// Resolve `value` into frames and require at least `required` of them.
///
/// # Errors
///
/// Returns [`Error::NotEnoughFrames`] with the observed count when the
/// collection is too short, or the errors of [`FrameCollection::resolve`].
pub fn resolve_frames<'a>(
    name: &str,
    value: &'a MatValue,
    required: usize,
) -> Result<FrameCollection<'a>> {
    let frames = FrameCollection::resolve(name, value)?;
    if frames.len() < required {
        return Err(Error::NotEnoughFrames {
            name: name.to_string(),
            found: frames.len(),
            expected: required,
        });
    }
    Ok(frames)
}
