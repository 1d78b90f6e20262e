//! Grid endpoints

use crate::api::form::{parse_id, JsonFields};
use crate::api::response::{created, ok, ApiResult};
use crate::app::AppState;
use crate::database::{GridView, LayoutDescriptor};
use crate::error::{AppError, Result};
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde_json::Value;

/// Read `{spaceId, grids: [{gridId, layout}]}` in declared order
fn sync_request(body: &Bytes) -> Result<(i64, Vec<LayoutDescriptor>)> {
    let fields = JsonFields::parse(body)?;
    let space_id = fields.required_id("spaceId")?;

    let mut descriptors = Vec::new();
    for (index, entry) in fields.required_array("grids")?.iter().enumerate() {
        let Value::Object(map) = entry else {
            return Err(AppError::invalid(&format!("grids[{}]", index), "an object"));
        };
        let entry = JsonFields::from_map(map.clone());

        descriptors.push(LayoutDescriptor {
            grid_id: entry.optional_id("gridId")?,
            layout: entry
                .required_value("layout")
                .map_err(|_| AppError::required(&format!("grids[{}].layout", index)))?
                .clone(),
        });
    }

    Ok((space_id, descriptors))
}

pub async fn list_grids(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> ApiResult<Vec<GridView>> {
    let space_id = parse_id(&space_id, "spaceId")?;
    ok(state.grids.list_grids(space_id).await?)
}

pub async fn sync_grids(State(state): State<AppState>, body: Bytes) -> ApiResult<Vec<GridView>> {
    let (space_id, descriptors) = sync_request(&body)?;
    created(state.grids.sync_grids(space_id, descriptors).await?)
}

pub async fn delete_grid(
    State(state): State<AppState>,
    Path(grid_id): Path<String>,
) -> ApiResult<GridView> {
    let grid_id = parse_id(&grid_id, "gridId")?;
    ok(state.grids.delete_grid(grid_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    #[test]
    fn test_sync_request() {
        let (space_id, descriptors) = sync_request(&body(json!({
            "spaceId": 3,
            "grids": [
                {"gridId": null, "layout": {"x": 0}},
                {"gridId": 8, "layout": {"x": 2, "i": "8"}}
            ]
        })))
        .unwrap();

        assert_eq!(space_id, 3);
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].grid_id, None);
        assert_eq!(descriptors[1].grid_id, Some(8));
    }

    #[test]
    fn test_sync_request_field_order() {
        let err = sync_request(&body(json!({"grids": []}))).unwrap_err();
        assert_eq!(err.to_string(), "\"spaceId\" is required");

        let err = sync_request(&body(json!({"spaceId": 1}))).unwrap_err();
        assert_eq!(err.to_string(), "\"grids\" is required");

        let err = sync_request(&body(json!({"spaceId": 1, "grids": [{"gridId": 2}]}))).unwrap_err();
        assert_eq!(err.to_string(), "\"grids[0].layout\" is required");
    }
}
