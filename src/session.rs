//! Per-widget session state and the embedding entry point.
//!
//! A [`Session`] owns everything one reducer instance needs: its
//! configuration, the registry of selected images, the current density and
//! the conversion pipeline. Two sessions never share state, and a session's
//! lifetime is explicit: [`Session::create`] to start, [`Session::dispose`]
//! to release the registered images.
//!
//! ```no_run
//! use image_reducer::config::ReducerConfig;
//! use image_reducer::registry::FileInput;
//! use image_reducer::session::Session;
//!
//! let mut session = Session::create(ReducerConfig::default());
//! let bytes = std::fs::read("photo.jpg").unwrap();
//! session.add_file(FileInput::new("photo.jpg", "image/jpeg", bytes)).unwrap();
//!
//! session.set_density(36.0).unwrap(); // half size against the 72 baseline
//! let preview = session.preview(None).unwrap();
//! println!("{} → {} bytes", preview.original.byte_size, preview.converted.output_byte_size);
//! session.dispose();
//! ```

use crate::config::{ReducerConfig, effective_threads};
use crate::error::Result;
use crate::export::{BatchExporter, CancelToken, ExportEvent, ExportOutcome};
use crate::imaging::{DensityRange, ImageBackend, RustBackend, scale_factor};
use crate::pipeline::{ConversionPipeline, ConversionRequest};
use crate::preview::{Preview, PreviewCoordinator};
use crate::registry::{FileInput, SourceId, SourceImage, SourceRegistry};
use std::sync::mpsc::Sender;

pub struct Session<B = RustBackend> {
    config: ReducerConfig,
    registry: SourceRegistry,
    pipeline: ConversionPipeline<B>,
    density: f64,
}

impl Session<RustBackend> {
    /// Start a session with the production backend.
    pub fn create(config: ReducerConfig) -> Self {
        let backend = RustBackend::with_resampling(config.output.resample);
        Self::with_backend(config, backend)
    }
}

impl<B: ImageBackend> Session<B> {
    pub fn with_backend(config: ReducerConfig, backend: B) -> Self {
        let density = config.density.default;
        tracing::debug!(density, baseline = config.density.baseline, "session created");
        Self {
            config,
            registry: SourceRegistry::new(),
            pipeline: ConversionPipeline::new(backend),
            density,
        }
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Registered images in insertion order.
    pub fn sources(&self) -> &[SourceImage] {
        self.registry.list()
    }

    pub fn add_file(&mut self, file: FileInput) -> Result<SourceId> {
        let source = self.registry.add(self.pipeline.backend(), file)?;
        tracing::debug!(id = %source.id, name = %source.name, bytes = source.byte_size, "image added");
        Ok(source.id)
    }

    pub fn remove(&mut self, id: SourceId) -> Result<SourceImage> {
        self.registry.remove(id)
    }

    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// Current (last used) density.
    pub fn density(&self) -> f64 {
        self.density
    }

    /// The range the density control should offer.
    pub fn density_range(&self) -> DensityRange {
        self.config.density.range()
    }

    /// Change the density. Non-positive values are rejected with
    /// `InvalidScale` and leave the current density unchanged.
    pub fn set_density(&mut self, density: f64) -> Result<()> {
        scale_factor(density, self.config.density.baseline)?;
        self.density = density;
        Ok(())
    }

    /// Conversion request for the current density and configured output.
    pub fn request(&self) -> ConversionRequest {
        ConversionRequest::new(self.density, self.config.density.baseline)
            .with_format(self.config.output.format)
            .with_quality(self.config.output.quality())
    }

    /// Before/after comparison of one image at the current density.
    pub fn preview(&self, selection: Option<SourceId>) -> Result<Preview> {
        PreviewCoordinator::new(&self.registry, &self.pipeline).preview(selection, &self.request())
    }

    /// Export every registered image at the current density.
    pub fn export_all(
        &self,
        cancel: &CancelToken,
        events: Option<Sender<ExportEvent>>,
    ) -> Vec<ExportOutcome> {
        BatchExporter::new(&self.registry, &self.pipeline)
            .with_workers(effective_threads(&self.config.processing))
            .export_all(&self.request(), cancel, events)
    }

    /// End the session, releasing every registered image.
    pub fn dispose(mut self) {
        tracing::debug!(released = self.registry.len(), "session disposed");
        self.registry.clear();
    }
}

impl<B: ImageBackend + 'static> Session<B> {
    /// [`preview`](Self::preview) with decode and encode awaited on tokio's
    /// blocking pool.
    pub async fn preview_async(&self, selection: Option<SourceId>) -> Result<Preview> {
        PreviewCoordinator::new(&self.registry, &self.pipeline)
            .preview_async(selection, &self.request())
            .await
    }
}
