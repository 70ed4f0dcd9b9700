//! Pixel normalization and JPEG output.
//!
//! Frames arrive with arbitrary element types and axis orders. They are
//! mapped to 8-bit samples first, then the layout is corrected to `(H, W)`
//! or `(H, W, C)`:
//!
//! 1. Floating-point frames whose NaN-ignoring maximum is `<= 1.0` are
//!    treated as normalized and multiplied by 255.
//! 2. Every value is clipped to `[0, 255]` and truncated to `u8`.
//! 3. A trailing singleton channel axis is dropped.
//! 4. A `(C, H, W)` array with `C` in {1, 3, 4} and both spatial sizes above
//!    [`CHANNEL_FIRST_MIN_EXTENT`] is transposed to `(H, W, C)`.
//!
//! Both heuristics can misfire (a float image that is genuinely dark, a
//! small multi-channel array); that behavior is kept as is.

use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;
use ndarray::{ArrayD, Axis};

use crate::error::{Error, Result};
use crate::frames::ImageFrame;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 95;

/// Spatial sizes must exceed this for the channel-first transpose.
pub const CHANNEL_FIRST_MIN_EXTENT: usize = 32;

/// Map a frame to 8-bit samples, keeping its shape.
pub fn to_uint8(frame: &ImageFrame) -> ArrayD<u8> {
    let pixels = frame.pixels();

    let scale = if frame.is_float() {
        let max = pixels
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));
        match max {
            Some(m) if m <= 1.0 => 255.0,
            _ => 1.0,
        }
    } else {
        1.0
    };

    // `as u8` truncates toward zero and maps NaN to 0.
    pixels.mapv(|v| (v * scale).clamp(0.0, 255.0) as u8)
}

/// Correct the axis order of an 8-bit array.
pub fn correct_layout(mut pixels: ArrayD<u8>) -> ArrayD<u8> {
    if pixels.ndim() == 3 && pixels.shape()[2] == 1 {
        pixels = pixels.index_axis_move(Axis(2), 0);
    }

    if pixels.ndim() == 3 {
        let shape = pixels.shape();
        if matches!(shape[0], 1 | 3 | 4)
            && shape[1] > CHANNEL_FIRST_MIN_EXTENT
            && shape[2] > CHANNEL_FIRST_MIN_EXTENT
        {
            pixels = pixels.permuted_axes(vec![1, 2, 0]);
        }
    }

    pixels
}

/// Full normalization: element type, then layout.
pub fn normalize(frame: &ImageFrame) -> ArrayD<u8> {
    correct_layout(to_uint8(frame))
}

/// Encode a normalized array as JPEG at `path`.
///
/// `(H, W)` and `(H, W, 1)` become grayscale, `(H, W, 3)` becomes RGB.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFrameShape`] for any other shape (JPEG has
/// no alpha channel, so `(H, W, 4)` is rejected), or I/O and encoding
/// errors.
pub fn write_jpeg(pixels: &ArrayD<u8>, path: impl AsRef<Path>, quality: u8) -> Result<()> {
    let shape = pixels.shape();
    let (height, width, color) = match *shape {
        [h, w] => (h, w, ExtendedColorType::L8),
        [h, w, 1] => (h, w, ExtendedColorType::L8),
        [h, w, 3] => (h, w, ExtendedColorType::Rgb8),
        _ => {
            return Err(Error::UnsupportedFrameShape {
                shape: shape.to_vec(),
            })
        }
    };
    if height == 0 || width == 0 {
        return Err(Error::UnsupportedFrameShape {
            shape: shape.to_vec(),
        });
    }

    let height = u32::try_from(height).map_err(|_| Error::UnsupportedFrameShape {
        shape: shape.to_vec(),
    })?;
    let width = u32::try_from(width).map_err(|_| Error::UnsupportedFrameShape {
        shape: shape.to_vec(),
    })?;

    // Row-major interleaved samples, whatever the memory layout is.
    let samples: Vec<u8> = pixels.iter().copied().collect();

    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality).encode(&samples, width, height, color)?;
    fs::write(path, encoded)?;
    Ok(())
}

/// Normalize a frame and write it as JPEG.
pub fn save_jpeg(frame: &ImageFrame, path: impl AsRef<Path>, quality: u8) -> Result<()> {
    write_jpeg(&normalize(frame), path, quality)
}
