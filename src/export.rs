//! Batch export: one reduced file per registered image.
//!
//! Every registry entry is converted independently on a scoped rayon pool.
//! A failing entry records its error and the rest of the batch carries on,
//! so the result is always one [`ExportOutcome`] per entry, in registry order:
//!
//! ```text
//! registry            outcomes
//! #1 dawn.jpg    →    reduced-1.webp  Ok(..)
//! #2 broken.png  →    reduced-2.webp  Err(CorruptData)
//! #3 dusk.png    →    reduced-3.webp  Ok(..)
//! ```
//!
//! File names are assigned from each entry's position before any work starts,
//! so they match insertion order even though conversions finish in any order.
//! Progress is reported as [`ExportEvent`]s over an optional channel, in
//! completion order; events carry the position and source id for correlation.
//!
//! ## Cancellation
//!
//! Raising the [`CancelToken`] stops entries that have not started yet (they
//! finish as `Cancelled`). Entries already converting run to completion.

use crate::error::{ReduceError, Result};
use crate::imaging::{Dimensions, ImageBackend};
use crate::naming;
use crate::pipeline::{ConversionPipeline, ConversionRequest};
use crate::registry::{SourceId, SourceImage, SourceRegistry};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;

/// Shared flag checked before each batch entry starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A downloadable artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub dimensions: Dimensions,
}

/// Result slot for one registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOutcome {
    /// 1-based registry position at export time.
    pub position: usize,
    pub source_id: SourceId,
    pub source_name: String,
    pub file_name: String,
    pub result: Result<ExportedFile>,
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Final state of one entry, as reported in events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryStatus {
    Exported {
        dimensions: Dimensions,
        byte_size: usize,
    },
    Failed {
        error: String,
    },
    Cancelled,
}

impl EntryStatus {
    pub fn of(result: &Result<ExportedFile>) -> Self {
        match result {
            Ok(file) => Self::Exported {
                dimensions: file.dimensions,
                byte_size: file.bytes.len(),
            },
            Err(ReduceError::Cancelled) => Self::Cancelled,
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Progress events emitted during a batch export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Started {
        total: usize,
    },
    EntryFinished {
        position: usize,
        source_id: SourceId,
        source_name: String,
        file_name: String,
        status: EntryStatus,
    },
    Finished(ExportSummary),
}

/// Tally of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub exported: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl ExportSummary {
    pub fn of(outcomes: &[ExportOutcome]) -> Self {
        outcomes
            .iter()
            .fold(Self::default(), |mut acc, o| {
                match &o.result {
                    Ok(_) => acc.exported += 1,
                    Err(ReduceError::Cancelled) => acc.cancelled += 1,
                    Err(_) => acc.failed += 1,
                }
                acc
            })
    }
}

impl std::fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} exported, {} failed, {} cancelled",
            self.exported, self.failed, self.cancelled
        )
    }
}

pub struct BatchExporter<'a, B> {
    registry: &'a SourceRegistry,
    pipeline: &'a ConversionPipeline<B>,
    workers: usize,
}

impl<'a, B: ImageBackend> BatchExporter<'a, B> {
    /// Exporter using one worker per available core.
    pub fn new(registry: &'a SourceRegistry, pipeline: &'a ConversionPipeline<B>) -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            registry,
            pipeline,
            workers: cores,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Convert every registered image. Never fails as a whole; see the
    /// module docs for the per-entry contract.
    pub fn export_all(
        &self,
        request: &ConversionRequest,
        cancel: &CancelToken,
        events: Option<Sender<ExportEvent>>,
    ) -> Vec<ExportOutcome> {
        let sources = self.registry.list();
        let emit = |event: ExportEvent| {
            if let Some(tx) = &events {
                // Receiver gone means nobody is listening; the export goes on.
                let _ = tx.send(event);
            }
        };

        tracing::info!(total = sources.len(), density = request.density, "export started");
        emit(ExportEvent::Started {
            total: sources.len(),
        });

        let run_all = || -> Vec<ExportOutcome> {
            sources
                .par_iter()
                .enumerate()
                .map(|(i, source)| {
                    let outcome = self.export_one(i + 1, source, request, cancel);
                    emit(ExportEvent::EntryFinished {
                        position: outcome.position,
                        source_id: outcome.source_id,
                        source_name: outcome.source_name.clone(),
                        file_name: outcome.file_name.clone(),
                        status: EntryStatus::of(&outcome.result),
                    });
                    outcome
                })
                .collect()
        };

        let outcomes = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                tracing::warn!(error = %e, "could not build export pool, using the global one");
                run_all()
            }
        };

        let summary = ExportSummary::of(&outcomes);
        tracing::info!(%summary, "export finished");
        emit(ExportEvent::Finished(summary));
        outcomes
    }

    fn export_one(
        &self,
        position: usize,
        source: &SourceImage,
        request: &ConversionRequest,
        cancel: &CancelToken,
    ) -> ExportOutcome {
        let file_name = naming::export_file_name(position, request.format);

        let result = if cancel.is_cancelled() {
            Err(ReduceError::Cancelled)
        } else {
            self.pipeline
                .run(source, request)
                .map(|converted| ExportedFile {
                    file_name: file_name.clone(),
                    dimensions: converted.output_dimensions(),
                    bytes: converted.encoded_bytes,
                })
        };

        match &result {
            Err(ReduceError::Cancelled) => {
                tracing::debug!(source = %source.id, "export entry cancelled")
            }
            Err(e) => {
                tracing::warn!(source = %source.id, name = %source.name, error = %e, "export entry failed")
            }
            Ok(_) => {}
        }

        ExportOutcome {
            position,
            source_id: source.id,
            source_name: source.name.clone(),
            file_name,
            result,
        }
    }
}
