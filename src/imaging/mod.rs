//! Image processing: decode, resample, lossy encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image` crate decoders, sniffed by content |
//! | **Resize** | `image::imageops::resize` (bilinear by default) |
//! | **Encode** | libwebp (lossy WebP) or `image`'s JPEG encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for density → size math (unit testable)
//! - **Parameters**: Quality, output format, resampling filter
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{Dimensions, EncodedImage, ImageBackend, PixelSurface};
pub use calculations::{check_encodable, compute_target_size, scale_factor};
pub use params::{DensityRange, OutputFormat, Quality, Resampling};
pub use rust_backend::RustBackend;
