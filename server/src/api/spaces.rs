//! Space endpoints

use crate::api::form::{parse_id, FormData};
use crate::api::response::{created, ok, ApiResult};
use crate::app::AppState;
use crate::database::{Space, SpaceFields};
use crate::error::Result;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};

/// Fields in declared order: name, location, userId
fn space_fields(form: &FormData) -> Result<SpaceFields> {
    Ok(SpaceFields {
        name: form.required("name")?.to_string(),
        location: form.required("location")?.to_string(),
        user_id: form.required_id("userId")?,
    })
}

pub async fn get_space(State(state): State<AppState>, Path(space_id): Path<String>) -> ApiResult<Space> {
    let space_id = parse_id(&space_id, "spaceId")?;
    ok(state.spaces.get_space(space_id).await?)
}

pub async fn list_spaces_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Vec<Space>> {
    let user_id = parse_id(&user_id, "userId")?;
    ok(state.spaces.list_spaces_by_user(user_id).await?)
}

pub async fn create_space(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Space> {
    let mut form = FormData::read(&state.store, multipart).await?;

    let fields = match space_fields(&form) {
        Ok(fields) => fields,
        Err(e) => {
            form.discard(&state.store).await;
            return Err(e);
        }
    };

    created(state.spaces.create_space(fields, form.take_image()).await?)
}

pub async fn update_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<Space> {
    let mut form = FormData::read(&state.store, multipart).await?;

    let parsed = parse_id(&space_id, "spaceId").and_then(|id| Ok((id, space_fields(&form)?)));
    let (space_id, fields) = match parsed {
        Ok(parsed) => parsed,
        Err(e) => {
            form.discard(&state.store).await;
            return Err(e);
        }
    };

    created(
        state
            .spaces
            .update_space(space_id, fields, form.take_image())
            .await?,
    )
}

pub async fn delete_space(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> ApiResult<Space> {
    let space_id = parse_id(&space_id, "spaceId")?;
    ok(state.spaces.delete_space(space_id).await?)
}

pub async fn delete_space_image(
    State(state): State<AppState>,
    Path(space_id): Path<String>,
) -> ApiResult<bool> {
    let space_id = parse_id(&space_id, "spaceId")?;
    ok(state.spaces.delete_space_image(space_id).await?)
}
