//! User endpoints

use crate::api::form::{parse_id, JsonFields};
use crate::api::response::{created, ok, ApiResult};
use crate::app::AppState;
use crate::database::User;
use axum::body::Bytes;
use axum::extract::{Path, State};

pub async fn create_user(State(state): State<AppState>, body: Bytes) -> ApiResult<User> {
    let fields = JsonFields::parse(&body)?;
    let name = fields.required_str("name")?.to_string();
    let email = fields.required_str("email")?.to_string();

    created(state.users.create_user(name, email).await?)
}

pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<String>) -> ApiResult<User> {
    let user_id = parse_id(&user_id, "userId")?;
    ok(state.users.get_user(user_id).await?)
}
