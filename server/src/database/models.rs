//! Database models
//!
//! Rust structs representing database entities.
//! Wire format is camelCase to match the web client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Owner of spaces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Create user request
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

/// A physical storage location (room, closet, shelf)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub space_id: i64,
    pub user_id: i64,
    pub name: String,
    pub location: String,
    pub img_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Mutable space fields. Updates replace all of them.
#[derive(Debug, Clone)]
pub struct SpaceFields {
    pub name: String,
    pub location: String,
    pub user_id: i64,
}

/// Grid row as stored
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Grid {
    pub grid_id: i64,
    pub space_id: i64,
    /// Serialized layout descriptor (`{x,y,w,h,i,...}`)
    pub layout: String,
}

/// A physical object kept in a space, optionally placed in one of its grids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: i64,
    pub space_id: i64,
    pub grid_id: Option<i64>,
    pub name: String,
    pub category: String,
    /// Comma-joined tag list
    pub tags: String,
    pub color_code: Option<String>,
    pub img_path: Option<String>,
    pub reminder_dtm: Option<DateTime<Utc>>,
    pub reminder_complete: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Trimmed, non-empty tags in stored order
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags.split(',').map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Mutable item fields. Updates replace all of them.
#[derive(Debug, Clone)]
pub struct ItemFields {
    pub space_id: i64,
    pub grid_id: Option<i64>,
    pub name: String,
    pub category: String,
    pub tags: String,
    pub color_code: Option<String>,
    pub reminder_dtm: Option<DateTime<Utc>>,
    pub reminder_complete: bool,
}

/// One entry of a grid synchronization batch
#[derive(Debug, Clone)]
pub struct LayoutDescriptor {
    /// `None` asks for a new grid
    pub grid_id: Option<i64>,
    pub layout: Value,
}

/// Client-facing grid projection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub grid_id: i64,
    pub space_id: i64,
    pub layout: Value,
    pub tags_list: Vec<String>,
    pub category_list: Vec<String>,
    /// Owning space's image, relative to the public root
    pub img_path: Option<String>,
}
