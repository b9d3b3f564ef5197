//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::OutputFormat;
use crate::error::{ReduceError, Result};

/// Scale factor for a density against its baseline (`density / baseline`).
///
/// Fails with [`InvalidScale`](ReduceError::InvalidScale) unless both values are
/// finite and positive.
pub fn scale_factor(density: f64, baseline: f64) -> Result<f64> {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if !valid(density) || !valid(baseline) {
        return Err(ReduceError::InvalidScale { density, baseline });
    }
    Ok(density / baseline)
}

/// Calculate the output size for a density setting.
///
/// Both axes are multiplied by the same factor, so the aspect ratio is kept
/// up to rounding (at most one pixel per axis).
///
/// # Examples
/// ```
/// # use image_reducer::imaging::{Dimensions, compute_target_size};
/// let half = compute_target_size(Dimensions::new(800, 600), 36.0, 72.0).unwrap();
/// assert_eq!(half, Dimensions::new(400, 300));
///
/// let double = compute_target_size(Dimensions::new(800, 600), 144.0, 72.0).unwrap();
/// assert_eq!(double, Dimensions::new(1600, 1200));
/// ```
pub fn compute_target_size(original: Dimensions, density: f64, baseline: f64) -> Result<Dimensions> {
    let scale = scale_factor(density, baseline)?;

    let scaled = |edge: u32| (edge as f64 * scale).round();
    let (w, h) = (scaled(original.width), scaled(original.height));

    // A zero-area (or unrepresentable) surface is never produced.
    if w < 1.0 || h < 1.0 || w > u32::MAX as f64 || h > u32::MAX as f64 {
        return Err(ReduceError::InvalidScale { density, baseline });
    }

    Ok(Dimensions::new(w as u32, h as u32))
}

/// Reject a target the encoder for `format` cannot produce.
///
/// Runs before resampling, so an oversized density fails without
/// allocating the target surface.
pub fn check_encodable(target: Dimensions, format: OutputFormat) -> Result<()> {
    let max = format.max_dimension();
    if target.width > max || target.height > max {
        return Err(ReduceError::EncodingFailure(format!(
            "{format} sides are limited to {max}px, got {target}"
        )));
    }
    Ok(())
}
