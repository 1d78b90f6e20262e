//! Image lifecycle shared by spaces and items
//!
//! Moves staged uploads into place, cleans up files a failed write left
//! behind, and removes images that a successful write replaced.

use crate::error::Result;
use crate::storage::{ImageKind, StagedUpload, UploadStore};

#[derive(Clone)]
pub struct ImageLifecycle {
    store: UploadStore,
    kind: ImageKind,
}

impl ImageLifecycle {
    pub fn new(store: UploadStore, kind: ImageKind) -> Self {
        Self { store, kind }
    }

    /// Move an optional staged upload into the permanent directory
    pub async fn place(&self, upload: Option<StagedUpload>) -> Result<Option<String>> {
        match upload {
            Some(staged) => Ok(Some(self.store.persist(self.kind, staged).await?)),
            None => Ok(None),
        }
    }

    /// Drop a staged upload whose record will not be written
    pub async fn discard(&self, upload: Option<StagedUpload>) {
        if let Some(staged) = upload {
            self.store.discard(staged).await;
        }
    }

    /// Remove a freshly placed file after the database write failed
    pub async fn undo_place(&self, placed: Option<&str>) {
        if let Some(path) = placed {
            self.store.delete(path).await;
        }
    }

    /// After a successful update, delete the previous file if a different one replaced it
    pub async fn retire(&self, previous: Option<&str>, placed: Option<&str>) {
        if let (Some(old), Some(new)) = (previous, placed) {
            if old != new {
                self.store.delete(old).await;
            }
        }
    }

    /// Delete a stored file, `false` when the file system refused
    pub async fn remove(&self, path: &str) -> bool {
        self.store.delete(path).await
    }
}
