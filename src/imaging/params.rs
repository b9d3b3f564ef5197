//! Parameter types for image operations.
//!
//! These types describe *what* to produce, not *how*. They are the interface
//! between the [`pipeline`](crate::pipeline) (which decides sizes and formats)
//! and the [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy quality hint (0.0–1.0, default 0.9). Clamped on construction.
//! - [`OutputFormat`]: Lossy target format, addressed by mime type.
//! - [`Resampling`]: Deterministic resampling filter used to reach the target size.
//! - [`DensityRange`]: The slider bounds UI collaborators offer for the density control.

use crate::error::{ReduceError, Result};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quality hint for lossy encoding, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Quality(f32);

impl Quality {
    /// Out-of-range values are clamped; NaN falls back to the default.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on libwebp's 0–100 scale.
    pub fn as_webp(self) -> f32 {
        self.0 * 100.0
    }

    /// Quality on the JPEG encoder's 1–100 scale.
    pub fn as_jpeg(self) -> u8 {
        ((self.0 * 100.0).round() as u8).clamp(1, 100)
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(0.9)
    }
}

/// Lossy output formats the encoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 2] = [OutputFormat::WebP, OutputFormat::Jpeg];

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::WebP => "image/webp",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// File extension used for exported files.
    pub fn extension(self) -> &'static str {
        match self {
            Self::WebP => "webp",
            Self::Jpeg => "jpg",
        }
    }

    /// Largest width or height the encoder accepts.
    pub fn max_dimension(self) -> u32 {
        match self {
            Self::WebP => 16383,
            Self::Jpeg => 65535,
        }
    }

    /// Parse a mime type. Anything that isn't a supported lossy target is an
    /// [`EncodingFailure`](ReduceError::EncodingFailure).
    pub fn from_mime(mime: &str) -> Result<Self> {
        let mime = mime.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.mime_type().eq_ignore_ascii_case(mime))
            .or_else(|| mime.eq_ignore_ascii_case("image/jpg").then_some(Self::Jpeg))
            .ok_or_else(|| {
                ReduceError::EncodingFailure(format!("no lossy encoder for {mime:?}"))
            })
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

impl FromStr for OutputFormat {
    type Err = ReduceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_mime(s)
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = ReduceError;

    fn try_from(value: String) -> Result<Self> {
        Self::from_mime(&value)
    }
}

impl From<OutputFormat> for String {
    fn from(value: OutputFormat) -> Self {
        value.mime_type().to_string()
    }
}

/// Resampling filter. All variants are deterministic for identical input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resampling {
    Nearest,
    #[default]
    Bilinear,
    CatmullRom,
    Lanczos3,
}

impl Resampling {
    pub fn filter_type(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Bilinear => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Bounds of the density control offered to users.
///
/// Advisory only: the scale transform accepts any positive density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityRange {
    pub min: f64,
    pub max: f64,
}

impl DensityRange {
    pub fn contains(&self, density: f64) -> bool {
        (self.min..=self.max).contains(&density)
    }

    pub fn clamp(&self, density: f64) -> f64 {
        density.clamp(self.min, self.max)
    }
}

impl Default for DensityRange {
    fn default() -> Self {
        Self {
            min: 10.0,
            max: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(-0.5).value(), 0.0);
        assert_eq!(Quality::new(0.5).value(), 0.5);
        assert_eq!(Quality::new(1.5).value(), 1.0);
        assert_eq!(Quality::new(f32::NAN), Quality::default());
    }

    #[test]
    fn quality_default_is_point_nine() {
        assert_eq!(Quality::default().value(), 0.9);
        assert_eq!(Quality::default().as_jpeg(), 90);
    }

    #[test]
    fn jpeg_quality_never_drops_to_zero() {
        assert_eq!(Quality::new(0.0).as_jpeg(), 1);
        assert_eq!(Quality::new(1.0).as_jpeg(), 100);
    }

    #[test]
    fn format_from_mime() {
        assert_eq!(OutputFormat::from_mime("image/webp").unwrap(), OutputFormat::WebP);
        assert_eq!(OutputFormat::from_mime("IMAGE/JPEG").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::from_mime("image/jpg").unwrap(), OutputFormat::Jpeg);
        assert!(matches!(
            OutputFormat::from_mime("image/png"),
            Err(ReduceError::EncodingFailure(_))
        ));
    }

    #[test]
    fn format_extensions() {
        assert_eq!(OutputFormat::WebP.extension(), "webp");
        assert_eq!(OutputFormat::Jpeg.extension(), "jpg");
        assert_eq!(OutputFormat::default(), OutputFormat::WebP);
    }

    #[test]
    fn bilinear_maps_to_triangle() {
        assert_eq!(Resampling::default().filter_type(), FilterType::Triangle);
        assert_eq!(Resampling::Nearest.filter_type(), FilterType::Nearest);
    }

    #[test]
    fn density_range_clamps_to_slider_bounds() {
        let range = DensityRange::default();
        assert!(range.contains(72.0));
        assert!(!range.contains(144.0));
        assert_eq!(range.clamp(5.0), 10.0);
        assert_eq!(range.clamp(300.0), 100.0);
    }
}
