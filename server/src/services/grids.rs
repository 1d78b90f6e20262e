//! Grids service
//!
//! Synchronizes the layout array the web client edits with the grids
//! table, and projects grids back with item tag and category rollups.
//!
//! A layout descriptor's `i` is the grid id as a string. New grids get
//! their id from the insert, so they are written twice: once with an
//! empty layout, then with the final layout carrying `i`.

use crate::database::{Grid, GridView, Item, LayoutDescriptor, Repository, Space};
use crate::error::{AppError, Result};
use crate::storage::UploadStore;
use serde_json::{Map, Value};
use sqlx::SqliteConnection;
use std::collections::HashSet;

/// Service for grid layouts
#[derive(Clone)]
pub struct GridsService {
    repo: Repository,
    store: UploadStore,
}

impl GridsService {
    pub fn new(repo: Repository, store: UploadStore) -> Self {
        Self { repo, store }
    }

    /// Persist a batch of layout descriptors for one space and return the
    /// space's full grid set.
    ///
    /// The batch is all-or-nothing: it runs in one transaction and any
    /// failing descriptor rolls back the writes made before it.
    pub async fn sync_grids(
        &self,
        space_id: i64,
        descriptors: Vec<LayoutDescriptor>,
    ) -> Result<Vec<GridView>> {
        tracing::info!(
            "Synchronizing {} grid layouts for space: {}",
            descriptors.len(),
            space_id
        );

        match self.apply_layouts(space_id, descriptors).await {
            Ok(views) => {
                tracing::info!("Grid layouts synchronized for space: {}", space_id);
                Ok(views)
            }
            Err(e) => {
                tracing::error!("Grid sync failed for space {}: {}", space_id, e);
                Err(e)
            }
        }
    }

    async fn apply_layouts(
        &self,
        space_id: i64,
        descriptors: Vec<LayoutDescriptor>,
    ) -> Result<Vec<GridView>> {
        let space = self.repo.get_space(space_id).await?;

        // Reject the batch before touching the database
        let mut layouts = Vec::with_capacity(descriptors.len());
        for (index, descriptor) in descriptors.into_iter().enumerate() {
            match descriptor.layout {
                Value::Object(layout) => layouts.push((descriptor.grid_id, layout)),
                _ => {
                    return Err(AppError::invalid(
                        &format!("grids[{}].layout", index),
                        "an object",
                    ))
                }
            }
        }

        let mut tx = self.repo.begin().await?;

        for (grid_id, layout) in layouts {
            if let Err(e) = write_layout(&mut *tx, space_id, grid_id, layout).await {
                // Undo every write of the batch
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!("Rollback of grid sync failed: {}", rollback_err);
                }
                return Err(e);
            }
        }

        tx.commit().await?;

        // Project after commit: the pool may hold a single connection
        self.project(&space).await
    }

    /// All grids of a space with rollups
    pub async fn list_grids(&self, space_id: i64) -> Result<Vec<GridView>> {
        let space = self.repo.get_space(space_id).await?;
        self.project(&space).await
    }

    /// Delete a grid and return its projection, without rollups. Its items
    /// stay in the space, unplaced.
    pub async fn delete_grid(&self, grid_id: i64) -> Result<GridView> {
        tracing::info!("Deleting grid: {}", grid_id);

        let grid = self.repo.delete_grid(grid_id).await?;
        let space = self.repo.get_space(grid.space_id).await?;

        tracing::info!("Grid deleted successfully: {}", grid_id);
        self.view(grid, &[], &space)
    }

    async fn project(&self, space: &Space) -> Result<Vec<GridView>> {
        let grids = self.repo.list_grids_by_space(space.space_id).await?;
        let items = self.repo.list_items_by_space(space.space_id).await?;

        grids
            .into_iter()
            .map(|grid| {
                let grid_items: Vec<Item> = items
                    .iter()
                    .filter(|item| item.grid_id == Some(grid.grid_id))
                    .cloned()
                    .collect();
                self.view(grid, &grid_items, space)
            })
            .collect()
    }

    fn view(&self, grid: Grid, items: &[Item], space: &Space) -> Result<GridView> {
        let layout: Value = serde_json::from_str(&grid.layout)?;
        let (tags_list, category_list) = rollup(items);

        Ok(GridView {
            grid_id: grid.grid_id,
            space_id: grid.space_id,
            layout,
            tags_list,
            category_list,
            img_path: space
                .img_path
                .as_deref()
                .map(|path| self.store.public_path(path)),
        })
    }
}

/// Create or update one grid inside the sync transaction, returning its id
async fn write_layout(
    conn: &mut SqliteConnection,
    space_id: i64,
    grid_id: Option<i64>,
    mut layout: Map<String, Value>,
) -> Result<i64> {
    let grid_id = match grid_id {
        None => Repository::insert_grid_in(&mut *conn, space_id, "{}")
            .await?
            .grid_id,
        Some(id) => {
            Repository::find_grid_in(&mut *conn, id)
                .await?
                .filter(|grid| grid.space_id == space_id)
                .ok_or_else(|| AppError::not_found("Grid", id))?
                .grid_id
        }
    };

    layout.insert("i".to_string(), Value::String(grid_id.to_string()));
    let serialized = serde_json::to_string(&Value::Object(layout))?;

    Repository::update_grid_layout_in(&mut *conn, grid_id, &serialized).await?;

    Ok(grid_id)
}

/// Deduplicated tags and categories, in first-seen order
fn rollup(items: &[Item]) -> (Vec<String>, Vec<String>) {
    let mut tags = Vec::new();
    let mut seen_tags = HashSet::new();
    let mut categories = Vec::new();
    let mut seen_categories = HashSet::new();

    for item in items {
        for tag in item.tag_list() {
            if seen_tags.insert(tag) {
                tags.push(tag.to_string());
            }
        }

        let category = item.category.trim();
        if !category.is_empty() && seen_categories.insert(category) {
            categories.push(category.to_string());
        }
    }

    (tags, categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{memory_pool, CreateUserRequest, ItemFields, SpaceFields};
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        service: GridsService,
        repo: Repository,
        space: Space,
        _temp: TempDir,
    }

    async fn create_fixture(space_image: Option<&str>) -> Fixture {
        let repo = Repository::new(memory_pool().await);

        let temp = TempDir::new().unwrap();
        let root = temp.path().join("public");
        let store = UploadStore::new(root.clone());
        store.initialize().await.unwrap();

        let user = repo
            .create_user(CreateUserRequest {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            })
            .await
            .unwrap();

        let img_path = space_image.map(|name| {
            root.join("upload/images/space")
                .join(name)
                .to_string_lossy()
                .into_owned()
        });

        let space = repo
            .create_space(
                &SpaceFields {
                    name: "Garage".to_string(),
                    location: "Home".to_string(),
                    user_id: user.user_id,
                },
                img_path.as_deref(),
            )
            .await
            .unwrap();

        Fixture {
            service: GridsService::new(repo.clone(), store),
            repo,
            space,
            _temp: temp,
        }
    }

    fn new_grid(x: i64) -> LayoutDescriptor {
        LayoutDescriptor {
            grid_id: None,
            layout: json!({"x": x, "y": 0, "w": 2, "h": 3}),
        }
    }

    async fn add_item(repo: &Repository, space_id: i64, grid_id: i64, category: &str, tags: &str) {
        repo.create_item(
            &ItemFields {
                space_id,
                grid_id: Some(grid_id),
                name: "thing".to_string(),
                category: category.to_string(),
                tags: tags.to_string(),
                color_code: None,
                reminder_dtm: None,
                reminder_complete: false,
            },
            None,
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_new_grid_gets_its_id_in_layout() {
        let f = create_fixture(None).await;

        let views = f
            .service
            .sync_grids(f.space.space_id, vec![new_grid(0)])
            .await
            .unwrap();

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!(view.layout["i"], json!(view.grid_id.to_string()));
        assert_eq!(view.layout["w"], json!(2));

        let stored = f.repo.get_grid(view.grid_id).await.unwrap();
        let persisted: Value = serde_json::from_str(&stored.layout).unwrap();
        assert_eq!(persisted["i"], json!(view.grid_id.to_string()));
    }

    #[tokio::test]
    async fn test_existing_grid_only_layout_changes() {
        let f = create_fixture(None).await;

        let created = f
            .service
            .sync_grids(f.space.space_id, vec![new_grid(0), new_grid(2)])
            .await
            .unwrap();
        let target = created[0].grid_id;
        let untouched = created[1].clone();

        let views = f
            .service
            .sync_grids(
                f.space.space_id,
                vec![LayoutDescriptor {
                    grid_id: Some(target),
                    layout: json!({"x": 5, "y": 1, "w": 1, "h": 1, "i": "stale"}),
                }],
            )
            .await
            .unwrap();

        assert_eq!(views.len(), 2);
        let moved = views.iter().find(|v| v.grid_id == target).unwrap();
        assert_eq!(moved.space_id, f.space.space_id);
        assert_eq!(moved.layout["x"], json!(5));
        assert_eq!(moved.layout["i"], json!(target.to_string()));

        let other = views.iter().find(|v| v.grid_id == untouched.grid_id).unwrap();
        assert_eq!(other, &untouched);
    }

    #[tokio::test]
    async fn test_unknown_grid_rolls_back_batch() {
        let f = create_fixture(None).await;

        let result = f
            .service
            .sync_grids(
                f.space.space_id,
                vec![
                    new_grid(0),
                    LayoutDescriptor {
                        grid_id: Some(9999),
                        layout: json!({"x": 0, "y": 0, "w": 1, "h": 1}),
                    },
                ],
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));

        let grids = f.repo.list_grids_by_space(f.space.space_id).await.unwrap();
        assert!(grids.is_empty());
    }

    #[tokio::test]
    async fn test_grid_of_other_space_is_not_found() {
        let f = create_fixture(None).await;

        let other = f
            .repo
            .create_space(
                &SpaceFields {
                    name: "Attic".to_string(),
                    location: "Home".to_string(),
                    user_id: f.space.user_id,
                },
                None,
            )
            .await
            .unwrap();
        let foreign = f
            .service
            .sync_grids(other.space_id, vec![new_grid(0)])
            .await
            .unwrap();

        let result = f
            .service
            .sync_grids(
                f.space.space_id,
                vec![LayoutDescriptor {
                    grid_id: Some(foreign[0].grid_id),
                    layout: json!({}),
                }],
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_object_layout_is_rejected() {
        let f = create_fixture(None).await;

        let result = f
            .service
            .sync_grids(
                f.space.space_id,
                vec![
                    new_grid(0),
                    LayoutDescriptor {
                        grid_id: None,
                        layout: json!([1, 2]),
                    },
                ],
            )
            .await;

        match result {
            Err(AppError::Validation(message)) => {
                assert_eq!(message, "\"grids[1].layout\" must be an object")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(f.repo.list_grids_by_space(f.space.space_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_projection_rollups_and_image() {
        let f = create_fixture(Some("garage.png")).await;

        let views = f
            .service
            .sync_grids(f.space.space_id, vec![new_grid(0), new_grid(4)])
            .await
            .unwrap();
        let first = views[0].grid_id;

        add_item(&f.repo, f.space.space_id, first, "tools", "power, garage").await;
        add_item(&f.repo, f.space.space_id, first, "tools", "garage,hand").await;
        add_item(&f.repo, f.space.space_id, first, "paint", "").await;

        let views = f.service.list_grids(f.space.space_id).await.unwrap();
        let rolled = views.iter().find(|v| v.grid_id == first).unwrap();
        assert_eq!(rolled.tags_list, vec!["power", "garage", "hand"]);
        assert_eq!(rolled.category_list, vec!["tools", "paint"]);
        assert_eq!(
            rolled.img_path.as_deref(),
            Some("upload/images/space/garage.png")
        );

        let empty = views.iter().find(|v| v.grid_id != first).unwrap();
        assert!(empty.tags_list.is_empty());
        assert!(empty.category_list.is_empty());
    }

    #[tokio::test]
    async fn test_delete_grid() {
        let f = create_fixture(None).await;

        let views = f
            .service
            .sync_grids(f.space.space_id, vec![new_grid(0)])
            .await
            .unwrap();
        let grid_id = views[0].grid_id;
        add_item(&f.repo, f.space.space_id, grid_id, "tools", "a").await;

        let deleted = f.service.delete_grid(grid_id).await.unwrap();
        assert_eq!(deleted.grid_id, grid_id);
        assert_eq!(deleted.space_id, f.space.space_id);
        assert_eq!(deleted.layout["i"], json!(grid_id.to_string()));
        assert!(deleted.tags_list.is_empty());
        assert!(deleted.category_list.is_empty());

        assert!(f.service.list_grids(f.space.space_id).await.unwrap().is_empty());
        let items = f.repo.list_items_by_space(f.space.space_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].grid_id.is_none());
    }

    #[tokio::test]
    async fn test_unknown_space() {
        let f = create_fixture(None).await;

        let result = f.service.sync_grids(f.space.space_id + 1, vec![new_grid(0)]).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
