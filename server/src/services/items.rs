//! Items service
//!
//! Item lifecycle with the same image handling as spaces, plus reminder
//! queries.

use crate::database::{Item, ItemFields, Repository};
use crate::error::{AppError, Result};
use crate::services::ImageLifecycle;
use crate::storage::StagedUpload;
use chrono::Utc;

/// Service for managing items
#[derive(Clone)]
pub struct ItemsService {
    repo: Repository,
    images: ImageLifecycle,
}

impl ItemsService {
    pub fn new(repo: Repository, images: ImageLifecycle) -> Self {
        Self { repo, images }
    }

    /// The space must exist and a grid, when given, must belong to it
    async fn check_placement(&self, fields: &ItemFields) -> Result<()> {
        self.repo.get_space(fields.space_id).await?;

        // No grid means the item is unplaced
        if let Some(grid_id) = fields.grid_id {
            let grid = self.repo.get_grid(grid_id).await?;
            if grid.space_id != fields.space_id {
                return Err(AppError::Validation(format!(
                    "\"gridId\" {} does not belong to space {}",
                    grid_id, fields.space_id
                )));
            }
        }

        Ok(())
    }

    pub async fn create_item(&self, fields: ItemFields, image: Option<StagedUpload>) -> Result<Item> {
        tracing::info!("Creating item: {} in space: {}", fields.name, fields.space_id);

        if let Err(e) = self.check_placement(&fields).await {
            self.images.discard(image).await;
            return Err(e);
        }

        let img_path = self.images.place(image).await?;

        // Write the row, removing the placed file if that fails
        let item = match self.repo.create_item(&fields, img_path.as_deref()).await {
            Ok(item) => item,
            Err(e) => {
                self.images.undo_place(img_path.as_deref()).await;
                return Err(e);
            }
        };

        tracing::info!("Item created successfully: {}", item.item_id);
        Ok(item)
    }

    pub async fn get_item(&self, item_id: i64) -> Result<Item> {
        self.repo.get_item(item_id).await
    }

    pub async fn list_items_by_space(&self, space_id: i64) -> Result<Vec<Item>> {
        self.repo.get_space(space_id).await?;
        self.repo.list_items_by_space(space_id).await
    }

    pub async fn list_items_by_grid(&self, grid_id: i64) -> Result<Vec<Item>> {
        self.repo.get_grid(grid_id).await?;
        self.repo.list_items_by_grid(grid_id).await
    }

    /// Replace every field of an item. Without a new upload the current
    /// image path is kept.
    pub async fn update_item(
        &self,
        item_id: i64,
        fields: ItemFields,
        image: Option<StagedUpload>,
    ) -> Result<Item> {
        tracing::debug!("Updating item: {}", item_id);

        let current = match self.repo.get_item(item_id).await {
            Ok(item) => item,
            Err(e) => {
                self.images.discard(image).await;
                return Err(e);
            }
        };

        if let Err(e) = self.check_placement(&fields).await {
            self.images.discard(image).await;
            return Err(e);
        }

        // Keep the current image unless a new one was uploaded
        let placed = self.images.place(image).await?;
        let img_path = placed.as_deref().or(current.img_path.as_deref());

        let item = match self.repo.update_item(item_id, &fields, img_path).await {
            Ok(item) => item,
            Err(e) => {
                self.images.undo_place(placed.as_deref()).await;
                return Err(e);
            }
        };

        // Old file goes only once the row points at the new one
        self.images
            .retire(current.img_path.as_deref(), placed.as_deref())
            .await;

        tracing::debug!("Item updated successfully: {}", item_id);
        Ok(item)
    }

    pub async fn delete_item(&self, item_id: i64) -> Result<Item> {
        tracing::info!("Deleting item: {}", item_id);

        let item = self.repo.delete_item(item_id).await?;

        if let Some(path) = &item.img_path {
            self.images.remove(path).await;
        }

        tracing::info!("Item deleted successfully: {}", item_id);
        Ok(item)
    }

    /// Clear the item image. `true` when there was nothing to clear.
    pub async fn delete_item_image(&self, item_id: i64) -> Result<bool> {
        let item = self.repo.get_item(item_id).await?;

        let Some(path) = item.img_path else {
            return Ok(true);
        };

        self.repo.set_item_image(item_id, None).await?;
        Ok(self.images.remove(&path).await)
    }

    /// Incomplete reminders of the user's items that are due now
    pub async fn list_due_reminders(&self, user_id: i64) -> Result<Vec<Item>> {
        self.repo.get_user(user_id).await?;
        self.repo.list_due_reminders(user_id, Utc::now()).await
    }

    pub async fn complete_reminder(&self, item_id: i64) -> Result<Item> {
        tracing::info!("Completing reminder for item: {}", item_id);
        self.repo.complete_reminder(item_id).await
    }
}
