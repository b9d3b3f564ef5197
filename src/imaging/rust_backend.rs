//! Pure Rust decoding and resampling, libwebp for lossy WebP output.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate decoders |
//! | Resize | `image::imageops::resize` with the configured [`Resampling`] filter |
//! | Encode → WebP (lossy) | `webp::Encoder` (libwebp) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Format detection is content-based (magic bytes); declared media types and
//! file names are never trusted here.

use super::backend::{Dimensions, EncodedImage, ImageBackend, PixelSurface};
use super::calculations::check_encodable;
use super::params::{OutputFormat, Quality, Resampling};
use crate::error::{ReduceError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, ImageReader, RgbaImage};
use std::io::Cursor;

/// Backend built on the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustBackend {
    resampling: Resampling,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resampling(resampling: Resampling) -> Self {
        Self { resampling }
    }
}

/// Open an in-memory reader with the format sniffed from the content.
fn open_reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ReduceError::CorruptData(e.to_string()))?;

    match reader.format() {
        Some(format) if format.reading_enabled() => Ok(reader),
        Some(format) => Err(ReduceError::UnsupportedFormat(format!(
            "no decoder compiled in for {format:?}"
        ))),
        None => Err(ReduceError::UnsupportedFormat(
            "unrecognised image signature".into(),
        )),
    }
}

/// Once the format is known, anything but an explicit "unsupported" or a
/// decoder limit means the data itself is broken.
fn decode_error(err: ImageError) -> ReduceError {
    match err {
        ImageError::Unsupported(e) => ReduceError::UnsupportedFormat(e.to_string()),
        ImageError::Limits(e) => ReduceError::UnsupportedFormat(format!(
            "image exceeds the decoder limits (512 MiB allocation by default): {e}"
        )),
        other => ReduceError::CorruptData(other.to_string()),
    }
}

fn encode_webp(pixels: &RgbaImage, quality: Quality) -> Result<Vec<u8>> {
    let (width, height) = pixels.dimensions();
    check_encodable(Dimensions::new(width, height), OutputFormat::WebP)?;
    let encoder = webp::Encoder::from_rgba(pixels.as_raw(), pixels.width(), pixels.height());
    let memory = encoder
        .encode_simple(false, quality.as_webp())
        .map_err(|e| ReduceError::EncodingFailure(format!("WebP encode failed: {e:?}")))?;
    Ok(memory.to_vec())
}

/// JPEG has no alpha channel; it is dropped before encoding.
fn encode_jpeg(pixels: &RgbaImage, quality: Quality) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(pixels.clone()).into_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.as_jpeg())
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| ReduceError::EncodingFailure(format!("JPEG encode failed: {e}")))?;
    Ok(bytes)
}

impl ImageBackend for RustBackend {
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions> {
        let (width, height) = open_reader(bytes)?
            .into_dimensions()
            .map_err(decode_error)?;
        Ok(Dimensions::new(width, height))
    }

    fn decode(&self, bytes: &[u8]) -> Result<PixelSurface> {
        let img = open_reader(bytes)?.decode().map_err(decode_error)?;
        Ok(PixelSurface::new(img.into_rgba8()))
    }

    fn resize(&self, surface: &PixelSurface, target: Dimensions) -> PixelSurface {
        if surface.dimensions() == target {
            return surface.clone();
        }
        PixelSurface::new(image::imageops::resize(
            surface.pixels(),
            target.width,
            target.height,
            self.resampling.filter_type(),
        ))
    }

    fn encode(
        &self,
        surface: &PixelSurface,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<EncodedImage> {
        if surface.is_empty() {
            return Err(ReduceError::EncodingFailure(format!(
                "cannot encode a zero-area surface ({})",
                surface.dimensions()
            )));
        }
        let bytes = match format {
            OutputFormat::WebP => encode_webp(surface.pixels(), quality)?,
            OutputFormat::Jpeg => encode_jpeg(surface.pixels(), quality)?,
        };
        Ok(EncodedImage::new(bytes))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::codecs::png::PngEncoder;
    use image::{Rgb, RgbImage};

    /// Encode a gradient of the given size as PNG bytes.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
            .unwrap();
        bytes
    }

    /// Encode a gradient of the given size as JPEG bytes.
    pub(crate) fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        let mut bytes = Vec::new();
        JpegEncoder::new(&mut bytes)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
            .unwrap();
        bytes
    }

    fn crc32(data: &[u8]) -> u32 {
        let mut crc = !0u32;
        for &byte in data {
            crc ^= byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 == 1 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            }
        }
        !crc
    }

    fn push_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        let start = out.len();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        let crc = crc32(&out[start..]);
        out.extend_from_slice(&crc.to_be_bytes());
    }

    /// A valid PNG header declaring an RGBA8 image of the given size, with a
    /// token IDAT. Enough for the decoder to size its buffer.
    fn png_header_only(width: u32, height: u32) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&width.to_be_bytes());
        ihdr.extend_from_slice(&height.to_be_bytes());
        ihdr.extend_from_slice(&[8, 6, 0, 0, 0]);

        let mut out = b"\x89PNG\r\n\x1a\n".to_vec();
        push_chunk(&mut out, b"IHDR", &ihdr);
        push_chunk(&mut out, b"IDAT", &[0x78, 0x9c, 0x03, 0x00]);
        push_chunk(&mut out, b"IEND", &[]);
        out
    }

    #[test]
    fn identify_synthetic_png() {
        let dims = RustBackend::new().identify(&png_bytes(200, 150)).unwrap();
        assert_eq!(dims, Dimensions::new(200, 150));
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let dims = RustBackend::new().identify(&jpeg_bytes(64, 48)).unwrap();
        assert_eq!(dims, Dimensions::new(64, 48));
    }

    #[test]
    fn decode_synthetic_png() {
        let surface = RustBackend::new().decode(&png_bytes(32, 16)).unwrap();
        assert_eq!(surface.dimensions(), Dimensions::new(32, 16));
        // Gradient survives the round trip into RGBA
        assert_eq!(surface.pixels().get_pixel(5, 7).0, [5, 7, 128, 255]);
    }

    #[test]
    fn decode_text_is_unsupported() {
        let err = RustBackend::new().decode(b"hello, world").unwrap_err();
        assert!(matches!(err, ReduceError::UnsupportedFormat(_)), "{err:?}");
    }

    #[test]
    fn decode_empty_is_unsupported() {
        assert!(matches!(
            RustBackend::new().decode(&[]),
            Err(ReduceError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn decode_truncated_png_is_corrupt() {
        let mut bytes = png_bytes(64, 64);
        bytes.truncate(bytes.len() / 2);
        let err = RustBackend::new().decode(&bytes).unwrap_err();
        assert!(matches!(err, ReduceError::CorruptData(_)), "{err:?}");
    }

    #[test]
    fn resize_reaches_exact_target() {
        let backend = RustBackend::new();
        let surface = backend.decode(&png_bytes(100, 80)).unwrap();
        let resized = backend.resize(&surface, Dimensions::new(50, 40));
        assert_eq!(resized.dimensions(), Dimensions::new(50, 40));
    }

    #[test]
    fn resize_is_deterministic() {
        let backend = RustBackend::with_resampling(Resampling::Lanczos3);
        let surface = backend.decode(&png_bytes(90, 60)).unwrap();
        let a = backend.resize(&surface, Dimensions::new(31, 20));
        let b = backend.resize(&surface, Dimensions::new(31, 20));
        assert_eq!(a, b);
    }

    #[test]
    fn resize_to_same_size_is_identity() {
        let backend = RustBackend::new();
        let surface = backend.decode(&png_bytes(20, 10)).unwrap();
        assert_eq!(backend.resize(&surface, Dimensions::new(20, 10)), surface);
    }

    #[test]
    fn encode_webp_produces_decodable_riff() {
        let backend = RustBackend::new();
        let surface = backend.decode(&png_bytes(120, 80)).unwrap();

        let encoded = backend
            .encode(&surface, OutputFormat::WebP, Quality::default())
            .unwrap();
        assert_eq!(encoded.byte_size, encoded.bytes.len());
        assert_eq!(&encoded.bytes[..4], b"RIFF");
        assert_eq!(&encoded.bytes[8..12], b"WEBP");

        let decoded = backend.decode(&encoded.bytes).unwrap();
        assert_eq!(decoded.dimensions(), Dimensions::new(120, 80));
    }

    #[test]
    fn encode_jpeg_produces_soi_marker() {
        let backend = RustBackend::new();
        let surface = backend.decode(&png_bytes(40, 30)).unwrap();

        let encoded = backend
            .encode(&surface, OutputFormat::Jpeg, Quality::new(0.8))
            .unwrap();
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(
            backend.identify(&encoded.bytes).unwrap(),
            Dimensions::new(40, 30)
        );
    }

    #[test]
    fn lower_quality_yields_smaller_webp() {
        let backend = RustBackend::new();
        let surface = backend.decode(&jpeg_bytes(256, 256)).unwrap();

        let high = backend
            .encode(&surface, OutputFormat::WebP, Quality::new(1.0))
            .unwrap();
        let low = backend
            .encode(&surface, OutputFormat::WebP, Quality::new(0.1))
            .unwrap();
        assert!(low.byte_size < high.byte_size);
    }

    #[test]
    fn encode_zero_area_fails() {
        let surface = PixelSurface::new(RgbaImage::new(0, 10));
        let err = RustBackend::new()
            .encode(&surface, OutputFormat::WebP, Quality::default())
            .unwrap_err();
        assert!(matches!(err, ReduceError::EncodingFailure(_)));
    }

    #[test]
    fn decoder_limit_is_not_corruption() {
        use image::error::{LimitError, LimitErrorKind};

        let err = decode_error(ImageError::Limits(LimitError::from_kind(
            LimitErrorKind::InsufficientMemory,
        )));
        match err {
            ReduceError::UnsupportedFormat(msg) => assert!(msg.contains("decoder limits"), "{msg}"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn oversized_png_header_reports_limit() {
        let bytes = png_header_only(20000, 20000);
        let err = RustBackend::new().decode(&bytes).unwrap_err();
        assert!(matches!(err, ReduceError::UnsupportedFormat(_)), "{err:?}");
    }
}
