//! Uploaded image storage
//!
//! Uploads are first written to a temp directory under the public root,
//! then renamed into a permanent per-entity directory under a UUID name.
//!
//! Example: `public/upload/temp/<uuid>.png` becomes
//! `public/upload/images/space/<uuid>.png`

use crate::config::{ITEM_IMAGE_DIR, MAX_EXTENSION_LENGTH, SPACE_IMAGE_DIR, TEMP_UPLOAD_DIR};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Entity an image belongs to, selects the permanent directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Space,
    Item,
}

impl ImageKind {
    fn dir(self) -> &'static str {
        match self {
            ImageKind::Space => SPACE_IMAGE_DIR,
            ImageKind::Item => ITEM_IMAGE_DIR,
        }
    }
}

/// A file sitting in the temp directory, waiting to be persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpload {
    path: PathBuf,
    extension: Option<String>,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// File store rooted at the public directory
#[derive(Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the temp and permanent directories
    pub async fn initialize(&self) -> Result<()> {
        for dir in [TEMP_UPLOAD_DIR, SPACE_IMAGE_DIR, ITEM_IMAGE_DIR] {
            fs::create_dir_all(self.root.join(dir)).await?;
        }
        tracing::info!("Upload store initialized at: {:?}", self.root);
        Ok(())
    }

    /// Write uploaded bytes into the temp directory
    pub async fn stage(&self, original_name: Option<&str>, data: &[u8]) -> Result<StagedUpload> {
        let extension = original_name.and_then(sanitize_extension);
        let path = self
            .root
            .join(TEMP_UPLOAD_DIR)
            .join(unique_file_name(extension.as_deref()));

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::debug!("Staged upload: {:?} ({} bytes)", path, data.len());

        Ok(StagedUpload { path, extension })
    }

    /// Move a staged file into the entity's directory, returning the stored path
    /// On failure the staged file is removed.
    pub async fn persist(&self, kind: ImageKind, staged: StagedUpload) -> Result<String> {
        let dir = self.root.join(kind.dir());
        let target = dir.join(unique_file_name(staged.extension.as_deref()));

        let moved = match fs::create_dir_all(&dir).await {
            Ok(()) => fs::rename(&staged.path, &target).await,
            Err(e) => Err(e),
        };

        if let Err(e) = moved {
            tracing::error!("Failed to persist upload {:?}: {}", staged.path, e);
            self.discard(staged).await;
            return Err(e.into());
        }

        let stored = target.to_string_lossy().into_owned();
        tracing::debug!("Persisted upload: {}", stored);

        Ok(stored)
    }

    /// Remove a staged file that will not be persisted
    pub async fn discard(&self, staged: StagedUpload) {
        if let Err(e) = fs::remove_file(&staged.path).await {
            tracing::warn!("Failed to discard staged upload {:?}: {}", staged.path, e);
        }
    }

    /// Delete a stored file. Failures are logged and reported as `false`.
    pub async fn delete(&self, stored_path: &str) -> bool {
        let path = Path::new(stored_path);

        // Only files under the public root are ever removed
        if !path.starts_with(&self.root) {
            tracing::warn!("Refusing to delete file outside upload root: {}", stored_path);
            return false;
        }

        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!("Deleted upload: {}", stored_path);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to delete upload {}: {}", stored_path, e);
                false
            }
        }
    }

    /// Stored path with the public root stripped, as served to clients
    pub fn public_path(&self, stored_path: &str) -> String {
        match Path::new(stored_path).strip_prefix(&self.root) {
            Ok(relative) => relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => stored_path.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn unique_file_name(extension: Option<&str>) -> String {
    let id = Uuid::new_v4();
    match extension {
        Some(ext) => format!("{}.{}", id, ext),
        None => id.to_string(),
    }
}

/// Lowercased alphanumeric extension of the client's file name, if usable
fn sanitize_extension(original_name: &str) -> Option<String> {
    let ext = Path::new(original_name).extension()?.to_str()?;

    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LENGTH
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(ext.to_ascii_lowercase())
}
