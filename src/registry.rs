//! The ordered set of images selected during a session.
//!
//! Entries are appended by [`SourceRegistry::add`] and never mutated. Each gets
//! a [`SourceId`] that stays valid (and is never reused) for the lifetime of
//! the registry, so results can always be traced back to their source.
//!
//! Only inputs whose declared media type is `image/*` are accepted. Whether
//! the bytes really are an image is not checked here: a header probe records
//! the dimensions when it can, and undecodable entries fail later, at decode
//! time, without affecting their siblings.

use crate::error::{ReduceError, Result};
use crate::imaging::{Dimensions, ImageBackend};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Stable identifier of a registered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceId(u64);

impl SourceId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A file offered by the UI collaborator: name, declared media type, bytes.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl FileInput {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

/// A registered image. Cheap to clone: the bytes are shared.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub id: SourceId,
    pub name: String,
    pub media_type: String,
    pub bytes: Arc<[u8]>,
    /// Header dimensions, when the probe at intake could read them.
    pub dimensions: Option<Dimensions>,
    pub byte_size: usize,
}

/// True when a declared media type names an image (`image/...`).
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: Vec<SourceImage>,
    next_id: u64,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file. Non-image media types are rejected with
    /// [`InvalidInputKind`](ReduceError::InvalidInputKind) and leave the
    /// registry unchanged. Duplicates are stored as distinct entries.
    pub fn add(&mut self, backend: &impl ImageBackend, file: FileInput) -> Result<&SourceImage> {
        if !is_image_media_type(&file.media_type) {
            return Err(ReduceError::InvalidInputKind {
                name: file.name,
                media_type: file.media_type,
            });
        }

        let dimensions = match backend.identify(&file.bytes) {
            Ok(dims) => Some(dims),
            Err(e) => {
                tracing::debug!(name = %file.name, error = %e, "header probe failed");
                None
            }
        };

        self.next_id += 1;
        let byte_size = file.bytes.len();
        self.entries.push(SourceImage {
            id: SourceId(self.next_id),
            name: file.name,
            media_type: file.media_type,
            bytes: file.bytes.into(),
            dimensions,
            byte_size,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// All entries in insertion order.
    pub fn list(&self) -> &[SourceImage] {
        &self.entries
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceImage> {
        self.entries.iter().find(|s| s.id == id)
    }

    /// Remove one entry; the remaining entries keep their relative order.
    pub fn remove(&mut self, id: SourceId) -> Result<SourceImage> {
        let pos = self
            .entries
            .iter()
            .position(|s| s.id == id)
            .ok_or(ReduceError::UnknownSource(id))?;
        Ok(self.entries.remove(pos))
    }

    /// Empty the registry. Ids keep counting, so old ids never resolve again.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
