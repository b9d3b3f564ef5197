//! Single-image conversion: decode → target size → resample → encode.
//!
//! The stages run strictly in that order, each consuming the previous one's
//! output. Any stage failure aborts the run and is returned exactly as the
//! stage produced it, so callers can tell an undecodable file
//! (`UnsupportedFormat`/`CorruptData`) from a bad density (`InvalidScale`)
//! from an encoder rejection (`EncodingFailure`). A target larger than the
//! output format allows is rejected before resampling starts.
//!
//! Results are produced fresh on every run; nothing is cached.

use crate::error::{ReduceError, Result};
use crate::imaging::{
    Dimensions, EncodedImage, ImageBackend, OutputFormat, Quality, check_encodable,
    compute_target_size,
};
use crate::registry::{SourceId, SourceImage};
use std::sync::Arc;

/// What to produce from a source image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionRequest {
    pub density: f64,
    /// Density at which the output keeps the original size.
    pub baseline: f64,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl ConversionRequest {
    /// Request with the default format (WebP) and quality (0.9).
    pub fn new(density: f64, baseline: f64) -> Self {
        Self {
            density,
            baseline,
            format: OutputFormat::default(),
            quality: Quality::default(),
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }
}

/// Output of one pipeline run, attributable to exactly one source.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub source_id: SourceId,
    pub encoded_bytes: Vec<u8>,
    pub output_width: u32,
    pub output_height: u32,
    pub output_byte_size: usize,
    pub format: OutputFormat,
    /// Size of the decoded source surface.
    pub source_dimensions: Dimensions,
}

impl ConversionResult {
    fn new(
        source_id: SourceId,
        source_dimensions: Dimensions,
        output: Dimensions,
        encoded: EncodedImage,
        format: OutputFormat,
    ) -> Self {
        Self {
            source_id,
            output_width: output.width,
            output_height: output.height,
            output_byte_size: encoded.byte_size,
            encoded_bytes: encoded.bytes,
            format,
            source_dimensions,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn output_dimensions(&self) -> Dimensions {
        Dimensions::new(self.output_width, self.output_height)
    }
}

/// Runs the decode → scale → encode sequence on a shared backend.
pub struct ConversionPipeline<B> {
    backend: Arc<B>,
}

impl<B> Clone for ConversionPipeline<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: ImageBackend> ConversionPipeline<B> {
    pub fn new(backend: B) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Convert one source image.
    pub fn run(&self, source: &SourceImage, request: &ConversionRequest) -> Result<ConversionResult> {
        let surface = self.backend.decode(&source.bytes)?;
        let original = surface.dimensions();
        tracing::debug!(source = %source.id, %original, "decoded");

        let target = compute_target_size(original, request.density, request.baseline)?;
        check_encodable(target, request.format)?;
        let resized = self.backend.resize(&surface, target);
        drop(surface);
        tracing::debug!(source = %source.id, %target, "resampled");

        let encoded = self
            .backend
            .encode(&resized, request.format, request.quality)?;
        tracing::debug!(
            source = %source.id,
            format = %request.format,
            bytes = encoded.byte_size,
            "encoded"
        );

        Ok(ConversionResult::new(
            source.id,
            original,
            target,
            encoded,
            request.format,
        ))
    }
}

impl<B: ImageBackend + 'static> ConversionPipeline<B> {
    /// Same sequence as [`run`](Self::run), with decode and encode moved to
    /// tokio's blocking pool. Each stage is awaited before the next starts.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn run_async(
        &self,
        source: &SourceImage,
        request: &ConversionRequest,
    ) -> Result<ConversionResult> {
        let backend = Arc::clone(&self.backend);
        let bytes = Arc::clone(&source.bytes);
        let surface = tokio::task::spawn_blocking(move || backend.decode(&bytes))
            .await
            .map_err(join_error)??;
        let original = surface.dimensions();
        tracing::debug!(source = %source.id, %original, "decoded");

        let target = compute_target_size(original, request.density, request.baseline)?;
        check_encodable(target, request.format)?;

        let backend = Arc::clone(&self.backend);
        let (format, quality) = (request.format, request.quality);
        let encoded = tokio::task::spawn_blocking(move || {
            let resized = backend.resize(&surface, target);
            backend.encode(&resized, format, quality)
        })
        .await
        .map_err(join_error)??;
        tracing::debug!(source = %source.id, %target, bytes = encoded.byte_size, "encoded");

        Ok(ConversionResult::new(
            source.id, original, target, encoded, format,
        ))
    }
}

fn join_error(err: tokio::task::JoinError) -> ReduceError {
    ReduceError::Task(err.to_string())
}
