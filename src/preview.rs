//! Before/after comparison for a single registered image.
//!
//! The coordinator resolves which image to convert, runs the pipeline once and
//! hands back both sides with their sizes. It only reads the registry and does
//! not keep the result.
//!
//! Selection rules:
//!
//! | `selection` | registry | outcome |
//! |---|---|---|
//! | `Some(id)` | contains `id` | that image |
//! | `Some(id)` | lacks `id` | `UnknownSource` |
//! | `None` | exactly one image | that image |
//! | `None` | empty | `EmptyRegistry` |
//! | `None` | several images | `AmbiguousSelection` |

use crate::error::{ReduceError, Result};
use crate::imaging::{Dimensions, ImageBackend};
use crate::naming;
use crate::pipeline::{ConversionPipeline, ConversionRequest, ConversionResult};
use crate::registry::{SourceId, SourceImage, SourceRegistry};

/// The "before" side of a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginalInfo {
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub original: OriginalInfo,
    pub converted: ConversionResult,
}

impl Preview {
    fn new(source: &SourceImage, converted: ConversionResult) -> Self {
        let Dimensions { width, height } = converted.source_dimensions;
        Self {
            original: OriginalInfo {
                width,
                height,
                byte_size: source.byte_size,
            },
            converted,
        }
    }

    /// Suggested file name when the converted image is downloaded on its own.
    pub fn download_name(&self) -> String {
        naming::single_download_name(self.converted.format)
    }

    /// Converted size as a fraction of the original size.
    pub fn size_ratio(&self) -> f64 {
        if self.original.byte_size == 0 {
            return 0.0;
        }
        self.converted.output_byte_size as f64 / self.original.byte_size as f64
    }
}

pub struct PreviewCoordinator<'a, B> {
    registry: &'a SourceRegistry,
    pipeline: &'a ConversionPipeline<B>,
}

impl<'a, B: ImageBackend> PreviewCoordinator<'a, B> {
    pub fn new(registry: &'a SourceRegistry, pipeline: &'a ConversionPipeline<B>) -> Self {
        Self { registry, pipeline }
    }

    /// Resolve the image a preview applies to. See the module docs for the rules.
    pub fn select(&self, selection: Option<SourceId>) -> Result<&'a SourceImage> {
        match selection {
            Some(id) => self.registry.get(id).ok_or(ReduceError::UnknownSource(id)),
            None => match self.registry.list() {
                [] => Err(ReduceError::EmptyRegistry),
                [only] => Ok(only),
                many => Err(ReduceError::AmbiguousSelection {
                    candidates: many.len(),
                }),
            },
        }
    }

    pub fn preview(
        &self,
        selection: Option<SourceId>,
        request: &ConversionRequest,
    ) -> Result<Preview> {
        let source = self.select(selection)?;
        let converted = self.pipeline.run(source, request)?;
        Ok(Preview::new(source, converted))
    }
}

impl<B: ImageBackend + 'static> PreviewCoordinator<'_, B> {
    /// [`preview`](Self::preview) on the async pipeline path.
    pub async fn preview_async(
        &self,
        selection: Option<SourceId>,
        request: &ConversionRequest,
    ) -> Result<Preview> {
        let source = self.select(selection)?;
        let converted = self.pipeline.run_async(source, request).await?;
        Ok(Preview::new(source, converted))
    }
}
