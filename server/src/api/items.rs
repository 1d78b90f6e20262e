//! Item endpoints

use crate::api::form::{parse_id, FormData};
use crate::api::response::{created, ok, ApiResult};
use crate::app::AppState;
use crate::database::{Item, ItemFields};
use crate::error::Result;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};

/// Required in declared order: spaceId, name, category. The rest are
/// optional and reset to empty when omitted.
fn item_fields(form: &FormData) -> Result<ItemFields> {
    Ok(ItemFields {
        space_id: form.required_id("spaceId")?,
        name: form.required("name")?.to_string(),
        category: form.required("category")?.to_string(),
        grid_id: form.optional_id("gridId")?,
        tags: form.optional("tags").unwrap_or_default().to_string(),
        color_code: form.optional("colorCode").map(str::to_string),
        reminder_dtm: form.optional_datetime("reminderDtm")?,
        reminder_complete: form.flag("reminderComplete")?,
    })
}

pub async fn get_item(State(state): State<AppState>, Path(item_id): Path<String>) -> ApiResult<Item> {
    let item_id = parse_id(&item_id, "itemId")?;
    ok(state.items.get_item(item_id).await?)
}

pub async fn list_items_by_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> ApiResult<Vec<Item>> {
    let space_id = parse_id(&space_id, "spaceId")?;
    ok(state.items.list_items_by_space(space_id).await?)
}

pub async fn list_items_by_grid(
    State(state): State<AppState>,
    Path(grid_id): Path<String>,
) -> ApiResult<Vec<Item>> {
    let grid_id = parse_id(&grid_id, "gridId")?;
    ok(state.items.list_items_by_grid(grid_id).await?)
}

pub async fn list_due_reminders(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Item>> {
    let user_id = parse_id(&user_id, "userId")?;
    ok(state.items.list_due_reminders(user_id).await?)
}

pub async fn complete_reminder(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> ApiResult<Item> {
    let item_id = parse_id(&item_id, "itemId")?;
    created(state.items.complete_reminder(item_id).await?)
}

pub async fn create_item(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Item> {
    let mut form = FormData::read(&state.store, multipart).await?;

    let fields = match item_fields(&form) {
        Ok(fields) => fields,
        Err(e) => {
            form.discard(&state.store).await;
            return Err(e);
        }
    };

    created(state.items.create_item(fields, form.take_image()).await?)
}

pub async fn update_item(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Item> {
    let mut form = FormData::read(&state.store, multipart).await?;

    let parsed = parse_id(&item_id, "itemId").and_then(|id| Ok((id, item_fields(&form)?)));
    let (item_id, fields) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            form.discard(&state.store).await;
            return Err(e);
        }
    };

    created(
        state
            .items
            .update_item(item_id, fields, form.take_image())
            .await?,
    )
}

pub async fn delete_item(State(state): State<AppState>, Path(item_id): Path<String>) -> ApiResult<Item> {
    let item_id = parse_id(&item_id, "itemId")?;
    ok(state.items.delete_item(item_id).await?)
}

pub async fn delete_item_image(
    State(state): State<AppState>,
    Path(item_id): Path<String>,
) -> ApiResult<bool> {
    let item_id = parse_id(&item_id, "itemId")?;
    ok(state.items.delete_item_image(item_id).await?)
}
