//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: identify, decode, resize, and encode. All of them work on
//! in-memory buffers; nothing here touches the filesystem.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), wrapping the `image`
//! crate decoders and the libwebp lossy encoder.

use super::params::{OutputFormat, Quality};
use crate::error::Result;
use image::RgbaImage;
use serde::Serialize;
use std::fmt;

/// Width and height of a raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\u{d7}{}", self.width, self.height)
    }
}

/// Decoded, uncompressed RGBA8 raster.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelSurface {
    pixels: RgbaImage,
}

impl PixelSurface {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions().area() == 0
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Compressed output of an encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub byte_size: usize,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>) -> Self {
        let byte_size = bytes.len();
        Self { bytes, byte_size }
    }
}

/// Trait for image processing backends.
///
/// Error contract:
/// - `identify`/`decode` fail with `UnsupportedFormat` when the bytes are not
///   a recognised raster format, `CorruptData` when decoding starts but
///   cannot complete.
/// - `encode` fails with `EncodingFailure` for a zero-area surface or an
///   encoder error.
///
/// `Send + Sync` so one backend can be shared by parallel batch workers and
/// moved into blocking tasks.
pub trait ImageBackend: Send + Sync {
    /// Read dimensions from the header without decoding pixels.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions>;

    /// Decode raw file bytes into a pixel surface.
    fn decode(&self, bytes: &[u8]) -> Result<PixelSurface>;

    /// Resample a surface to exactly `target`. Must be deterministic.
    fn resize(&self, surface: &PixelSurface, target: Dimensions) -> PixelSurface;

    /// Compress a surface into the given lossy format.
    fn encode(
        &self,
        surface: &PixelSurface,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<EncodedImage>;
}
