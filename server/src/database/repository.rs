//! Repository layer for database operations
//!
//! CRUD operations for users, spaces, grids and items. Grid writes used by
//! layout synchronization take a connection so they can share a transaction.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Start a transaction on the pool
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    // ===== Users =====

    /// Create a user, `Conflict` when the email is taken
    pub async fn create_user(&self, req: CreateUserRequest) -> Result<User> {
        let now = Utc::now();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.email)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_to_conflict(e, "email already registered"))?;

        tracing::debug!("Created user: {}", user.user_id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("User", user_id))
    }

    // ===== Spaces =====

    pub async fn create_space(&self, fields: &SpaceFields, img_path: Option<&str>) -> Result<Space> {
        let now = Utc::now();

        let space = sqlx::query_as::<_, Space>(
            r#"
            INSERT INTO spaces (user_id, name, location, img_path, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(fields.user_id)
        .bind(&fields.name)
        .bind(&fields.location)
        .bind(img_path)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created space: {}", space.space_id);
        Ok(space)
    }

    pub async fn get_space(&self, space_id: i64) -> Result<Space> {
        sqlx::query_as::<_, Space>("SELECT * FROM spaces WHERE space_id = ?")
            .bind(space_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Space", space_id))
    }

    pub async fn list_spaces_by_user(&self, user_id: i64) -> Result<Vec<Space>> {
        let spaces = sqlx::query_as::<_, Space>(
            "SELECT * FROM spaces WHERE user_id = ? ORDER BY space_id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(spaces)
    }

    /// Overwrite every mutable column of a space
    pub async fn update_space(
        &self,
        space_id: i64,
        fields: &SpaceFields,
        img_path: Option<&str>,
    ) -> Result<Space> {
        let space = sqlx::query_as::<_, Space>(
            r#"
            UPDATE spaces
            SET user_id = ?, name = ?, location = ?, img_path = ?, updated_at = ?
            WHERE space_id = ?
            RETURNING *
            "#,
        )
        .bind(fields.user_id)
        .bind(&fields.name)
        .bind(&fields.location)
        .bind(img_path)
        .bind(Utc::now())
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Space", space_id))?;

        tracing::debug!("Updated space: {}", space_id);
        Ok(space)
    }

    pub async fn set_space_image(&self, space_id: i64, img_path: Option<&str>) -> Result<Space> {
        sqlx::query_as::<_, Space>(
            "UPDATE spaces SET img_path = ?, updated_at = ? WHERE space_id = ? RETURNING *",
        )
        .bind(img_path)
        .bind(Utc::now())
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Space", space_id))
    }

    /// Delete a space (grids and items cascade), returning the removed row
    pub async fn delete_space(&self, space_id: i64) -> Result<Space> {
        let space = sqlx::query_as::<_, Space>("DELETE FROM spaces WHERE space_id = ? RETURNING *")
            .bind(space_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Space", space_id))?;

        tracing::debug!("Deleted space: {}", space_id);
        Ok(space)
    }

    // ===== Grids =====

    pub async fn get_grid(&self, grid_id: i64) -> Result<Grid> {
        sqlx::query_as::<_, Grid>("SELECT * FROM grids WHERE grid_id = ?")
            .bind(grid_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Grid", grid_id))
    }

    pub async fn list_grids_by_space(&self, space_id: i64) -> Result<Vec<Grid>> {
        let grids = sqlx::query_as::<_, Grid>(
            "SELECT * FROM grids WHERE space_id = ? ORDER BY grid_id ASC",
        )
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(grids)
    }

    /// Delete a grid, its items are detached by the foreign key
    pub async fn delete_grid(&self, grid_id: i64) -> Result<Grid> {
        let grid = sqlx::query_as::<_, Grid>("DELETE FROM grids WHERE grid_id = ? RETURNING *")
            .bind(grid_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Grid", grid_id))?;

        tracing::debug!("Deleted grid: {}", grid_id);
        Ok(grid)
    }

    /// Insert a grid row inside a caller-owned transaction
    pub async fn insert_grid_in(
        conn: &mut SqliteConnection,
        space_id: i64,
        layout: &str,
    ) -> Result<Grid> {
        let grid = sqlx::query_as::<_, Grid>(
            "INSERT INTO grids (space_id, layout) VALUES (?, ?) RETURNING *",
        )
        .bind(space_id)
        .bind(layout)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Inserted grid: {} in space: {}", grid.grid_id, space_id);
        Ok(grid)
    }

    pub async fn find_grid_in(conn: &mut SqliteConnection, grid_id: i64) -> Result<Option<Grid>> {
        let grid = sqlx::query_as::<_, Grid>("SELECT * FROM grids WHERE grid_id = ?")
            .bind(grid_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(grid)
    }

    /// Overwrite only the layout column
    pub async fn update_grid_layout_in(
        conn: &mut SqliteConnection,
        grid_id: i64,
        layout: &str,
    ) -> Result<()> {
        let rows = sqlx::query("UPDATE grids SET layout = ? WHERE grid_id = ?")
            .bind(layout)
            .bind(grid_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Grid", grid_id));
        }

        tracing::debug!("Updated layout of grid: {}", grid_id);
        Ok(())
    }

    // ===== Items =====

    pub async fn create_item(&self, fields: &ItemFields, img_path: Option<&str>) -> Result<Item> {
        let now = Utc::now();

        let item = sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (
                space_id, grid_id, name, category, tags, color_code, img_path,
                reminder_dtm, reminder_complete, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(fields.space_id)
        .bind(fields.grid_id)
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(&fields.tags)
        .bind(&fields.color_code)
        .bind(img_path)
        .bind(fields.reminder_dtm)
        .bind(fields.reminder_complete)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created item: {} in space: {}", item.item_id, item.space_id);
        Ok(item)
    }

    pub async fn get_item(&self, item_id: i64) -> Result<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE item_id = ?")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Item", item_id))
    }

    pub async fn list_items_by_space(&self, space_id: i64) -> Result<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE space_id = ? ORDER BY item_id ASC",
        )
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn list_items_by_grid(&self, grid_id: i64) -> Result<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            "SELECT * FROM items WHERE grid_id = ? ORDER BY item_id ASC",
        )
        .bind(grid_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Image paths of every item in a space
    pub async fn list_item_images_by_space(&self, space_id: i64) -> Result<Vec<String>> {
        let paths = sqlx::query_scalar::<_, String>(
            "SELECT img_path FROM items WHERE space_id = ? AND img_path IS NOT NULL",
        )
        .bind(space_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(paths)
    }

    /// Overwrite every mutable column of an item
    pub async fn update_item(
        &self,
        item_id: i64,
        fields: &ItemFields,
        img_path: Option<&str>,
    ) -> Result<Item> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items
            SET space_id = ?, grid_id = ?, name = ?, category = ?, tags = ?,
                color_code = ?, img_path = ?, reminder_dtm = ?, reminder_complete = ?,
                updated_at = ?
            WHERE item_id = ?
            RETURNING *
            "#,
        )
        .bind(fields.space_id)
        .bind(fields.grid_id)
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(&fields.tags)
        .bind(&fields.color_code)
        .bind(img_path)
        .bind(fields.reminder_dtm)
        .bind(fields.reminder_complete)
        .bind(Utc::now())
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Item", item_id))?;

        tracing::debug!("Updated item: {}", item_id);
        Ok(item)
    }

    pub async fn set_item_image(&self, item_id: i64, img_path: Option<&str>) -> Result<Item> {
        sqlx::query_as::<_, Item>(
            "UPDATE items SET img_path = ?, updated_at = ? WHERE item_id = ? RETURNING *",
        )
        .bind(img_path)
        .bind(Utc::now())
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Item", item_id))
    }

    pub async fn delete_item(&self, item_id: i64) -> Result<Item> {
        let item = sqlx::query_as::<_, Item>("DELETE FROM items WHERE item_id = ? RETURNING *")
            .bind(item_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Item", item_id))?;

        tracing::debug!("Deleted item: {}", item_id);
        Ok(item)
    }

    /// Incomplete reminders of a user's items that are due at `now`,
    /// earliest first
    pub async fn list_due_reminders(&self, user_id: i64, now: DateTime<Utc>) -> Result<Vec<Item>> {
        let pending = sqlx::query_as::<_, Item>(
            r#"
            SELECT items.* FROM items
            JOIN spaces ON spaces.space_id = items.space_id
            WHERE spaces.user_id = ?
              AND items.reminder_dtm IS NOT NULL
              AND items.reminder_complete = 0
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        // Compared in Rust: stored timestamps vary in sub-second precision
        let mut due: Vec<Item> = pending
            .into_iter()
            .filter(|item| item.reminder_dtm.is_some_and(|at| at <= now))
            .collect();
        due.sort_by_key(|item| item.reminder_dtm);

        Ok(due)
    }

    pub async fn complete_reminder(&self, item_id: i64) -> Result<Item> {
        let item = sqlx::query_as::<_, Item>(
            "UPDATE items SET reminder_complete = 1, updated_at = ? WHERE item_id = ? RETURNING *",
        )
        .bind(Utc::now())
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Item", item_id))?;

        tracing::debug!("Marked reminder complete for item: {}", item_id);
        Ok(item)
    }
}

fn unique_to_conflict(err: sqlx::Error, message: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(message.to_string());
        }
    }
    AppError::Database(err)
}
