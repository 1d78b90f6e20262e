//! Spaces service
//!
//! Space lifecycle together with the space image: moved into place on
//! create, replaced or carried forward on update, removed on delete.

use crate::database::{Repository, Space, SpaceFields};
use crate::error::Result;
use crate::services::ImageLifecycle;
use crate::storage::StagedUpload;

/// Service for managing spaces
#[derive(Clone)]
pub struct SpacesService {
    repo: Repository,
    images: ImageLifecycle,
}

impl SpacesService {
    pub fn new(repo: Repository, images: ImageLifecycle) -> Self {
        Self { repo, images }
    }

    /// Create a space, storing the uploaded image if one came with it
    pub async fn create_space(
        &self,
        fields: SpaceFields,
        image: Option<StagedUpload>,
    ) -> Result<Space> {
        tracing::info!("Creating space: {}", fields.name);

        // Owner must exist before the upload is moved into place
        if let Err(e) = self.repo.get_user(fields.user_id).await {
            self.images.discard(image).await;
            return Err(e);
        }

        let img_path = self.images.place(image).await?;

        // Write the row, removing the placed file if that fails
        let space = match self.repo.create_space(&fields, img_path.as_deref()).await {
            Ok(space) => space,
            Err(e) => {
                self.images.undo_place(img_path.as_deref()).await;
                return Err(e);
            }
        };

        tracing::info!("Space created successfully: {}", space.space_id);
        Ok(space)
    }

    pub async fn get_space(&self, space_id: i64) -> Result<Space> {
        self.repo.get_space(space_id).await
    }

    pub async fn list_spaces_by_user(&self, user_id: i64) -> Result<Vec<Space>> {
        self.repo.list_spaces_by_user(user_id).await
    }

    /// Replace every field of a space. Without a new upload the current
    /// image path is kept.
    pub async fn update_space(
        &self,
        space_id: i64,
        fields: SpaceFields,
        image: Option<StagedUpload>,
    ) -> Result<Space> {
        tracing::debug!("Updating space: {}", space_id);

        let current = match self.repo.get_space(space_id).await {
            Ok(space) => space,
            Err(e) => {
                self.images.discard(image).await;
                return Err(e);
            }
        };

        // Ownership change
        if fields.user_id != current.user_id {
            if let Err(e) = self.repo.get_user(fields.user_id).await {
                self.images.discard(image).await;
                return Err(e);
            }
        }

        // Keep the current image unless a new one was uploaded
        let placed = self.images.place(image).await?;
        let img_path = placed.as_deref().or(current.img_path.as_deref());

        let space = match self.repo.update_space(space_id, &fields, img_path).await {
            Ok(space) => space,
            Err(e) => {
                self.images.undo_place(placed.as_deref()).await;
                return Err(e);
            }
        };

        // Old file goes only once the row points at the new one
        self.images
            .retire(current.img_path.as_deref(), placed.as_deref())
            .await;

        tracing::debug!("Space updated successfully: {}", space_id);
        Ok(space)
    }

    /// Delete a space with its grids and items, then their image files
    pub async fn delete_space(&self, space_id: i64) -> Result<Space> {
        tracing::info!("Deleting space: {}", space_id);

        // Collect item images first, the rows cascade away with the space
        let item_images = self.repo.list_item_images_by_space(space_id).await?;
        let space = self.repo.delete_space(space_id).await?;

        if let Some(path) = &space.img_path {
            self.images.remove(path).await;
        }
        for path in &item_images {
            self.images.remove(path).await;
        }

        tracing::info!("Space deleted successfully: {}", space_id);
        Ok(space)
    }

    /// Clear the space image. `true` when there was nothing to clear.
    pub async fn delete_space_image(&self, space_id: i64) -> Result<bool> {
        let space = self.repo.get_space(space_id).await?;

        let Some(path) = space.img_path else {
            return Ok(true);
        };

        self.repo.set_space_image(space_id, None).await?;
        Ok(self.images.remove(&path).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{memory_pool, CreateUserRequest, ItemFields, User};
    use crate::error::AppError;
    use crate::storage::{ImageKind, UploadStore};
    use std::path::Path;
    use tempfile::TempDir;

    struct Fixture {
        service: SpacesService,
        repo: Repository,
        store: UploadStore,
        user: User,
        _temp: TempDir,
    }

    async fn create_fixture() -> Fixture {
        let repo = Repository::new(memory_pool().await);

        let temp = TempDir::new().unwrap();
        let store = UploadStore::new(temp.path().join("public"));
        store.initialize().await.unwrap();

        let user = repo
            .create_user(CreateUserRequest {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            })
            .await
            .unwrap();

        let service = SpacesService::new(
            repo.clone(),
            ImageLifecycle::new(store.clone(), ImageKind::Space),
        );

        Fixture {
            service,
            repo,
            store,
            user,
            _temp: temp,
        }
    }

    fn fields(user_id: i64, name: &str) -> SpaceFields {
        SpaceFields {
            name: name.to_string(),
            location: "Home".to_string(),
            user_id,
        }
    }

    #[tokio::test]
    async fn test_create_without_image() {
        let f = create_fixture().await;

        let space = f
            .service
            .create_space(fields(f.user.user_id, "Garage"), None)
            .await
            .unwrap();

        assert!(space.img_path.is_none());
    }

    #[tokio::test]
    async fn test_create_with_image() {
        let f = create_fixture().await;
        let staged = f.store.stage(Some("shelf.png"), b"png").await.unwrap();

        let space = f
            .service
            .create_space(fields(f.user.user_id, "Garage"), Some(staged))
            .await
            .unwrap();

        let stored = space.img_path.unwrap();
        assert!(Path::new(&stored).exists());
        assert!(f
            .store
            .public_path(&stored)
            .starts_with("upload/images/space/"));
        assert!(stored.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_create_for_unknown_user_discards_upload() {
        let f = create_fixture().await;
        let staged = f.store.stage(Some("shelf.png"), b"png").await.unwrap();
        let staged_path = staged.path().to_path_buf();

        let result = f.service.create_space(fields(999, "Garage"), Some(staged)).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(!staged_path.exists());
    }

    #[tokio::test]
    async fn test_create_with_unplaceable_image_leaves_no_temp_file() {
        let f = create_fixture().await;

        let space_dir = f.store.root().join("upload/images/space");
        std::fs::remove_dir_all(&space_dir).unwrap();
        std::fs::write(&space_dir, b"blocked").unwrap();

        let staged = f.store.stage(Some("a.png"), b"png").await.unwrap();
        let staged_path = staged.path().to_path_buf();

        let result = f
            .service
            .create_space(fields(f.user.user_id, "Garage"), Some(staged))
            .await;

        assert!(matches!(result, Err(AppError::Io(_))));
        assert!(!staged_path.exists());
        assert!(f
            .repo
            .list_spaces_by_user(f.user.user_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_without_image_keeps_path() {
        let f = create_fixture().await;
        let staged = f.store.stage(Some("a.png"), b"a").await.unwrap();
        let space = f
            .service
            .create_space(fields(f.user.user_id, "Garage"), Some(staged))
            .await
            .unwrap();

        let updated = f
            .service
            .update_space(space.space_id, fields(f.user.user_id, "Shed"), None)
            .await
            .unwrap();

        assert_eq!(updated.name, "Shed");
        assert_eq!(updated.img_path, space.img_path);
        assert!(Path::new(updated.img_path.as_deref().unwrap()).exists());
    }

    #[tokio::test]
    async fn test_update_with_image_replaces_file() {
        let f = create_fixture().await;
        let first = f.store.stage(Some("a.png"), b"a").await.unwrap();
        let space = f
            .service
            .create_space(fields(f.user.user_id, "Garage"), Some(first))
            .await
            .unwrap();
        let old_path = space.img_path.clone().unwrap();

        let second = f.store.stage(Some("b.jpg"), b"b").await.unwrap();
        let updated = f
            .service
            .update_space(space.space_id, fields(f.user.user_id, "Garage"), Some(second))
            .await
            .unwrap();

        let new_path = updated.img_path.unwrap();
        assert_ne!(new_path, old_path);
        assert!(new_path.ends_with(".jpg"));
        assert!(Path::new(&new_path).exists());
        assert!(!Path::new(&old_path).exists());
    }

    #[tokio::test]
    async fn test_update_missing_space() {
        let f = create_fixture().await;

        let result = f
            .service
            .update_space(42, fields(f.user.user_id, "Nowhere"), None)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_space_and_item_images() {
        let f = create_fixture().await;
        let staged = f.store.stage(Some("a.png"), b"a").await.unwrap();
        let space = f
            .service
            .create_space(fields(f.user.user_id, "Garage"), Some(staged))
            .await
            .unwrap();

        let item_upload = f.store.stage(Some("drill.png"), b"d").await.unwrap();
        let item_path = f.store.persist(ImageKind::Item, item_upload).await.unwrap();
        f.repo
            .create_item(
                &ItemFields {
                    space_id: space.space_id,
                    grid_id: None,
                    name: "Drill".to_string(),
                    category: "tools".to_string(),
                    tags: String::new(),
                    color_code: None,
                    reminder_dtm: None,
                    reminder_complete: false,
                },
                Some(&item_path),
            )
            .await
            .unwrap();

        let deleted = f.service.delete_space(space.space_id).await.unwrap();

        assert_eq!(deleted.space_id, space.space_id);
        assert!(!Path::new(deleted.img_path.as_deref().unwrap()).exists());
        assert!(!Path::new(&item_path).exists());
        assert!(f.service.get_space(space.space_id).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_image_only() {
        let f = create_fixture().await;
        let staged = f.store.stage(Some("a.png"), b"a").await.unwrap();
        let space = f
            .service
            .create_space(fields(f.user.user_id, "Garage"), Some(staged))
            .await
            .unwrap();
        let path = space.img_path.clone().unwrap();

        assert!(f.service.delete_space_image(space.space_id).await.unwrap());
        assert!(!Path::new(&path).exists());

        let cleared = f.service.get_space(space.space_id).await.unwrap();
        assert!(cleared.img_path.is_none());

        // Nothing left to delete
        assert!(f.service.delete_space_image(space.space_id).await.unwrap());
    }
}
