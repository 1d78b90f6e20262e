//! HTTP API
//!
//! Routes are grouped by entity and mounted under `/api`:
//! - `users`: account records
//! - `spaces`: space CRUD and space images
//! - `items`: item CRUD, item images and reminders
//! - `grids`: layout synchronization
//!
//! Every response uses the envelope in `response`.

pub mod form;
pub mod grids;
pub mod items;
pub mod response;
pub mod spaces;
pub mod users;

use crate::app::AppState;
use crate::config::MAX_UPLOAD_BYTES;
use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the application router
pub fn router(state: AppState, cors_permissive: bool) -> Router {
    let api = Router::new()
        .route("/user", post(users::create_user))
        .route("/user/{user_id}", get(users::get_user))
        .route("/space", post(spaces::create_space))
        .route(
            "/space/{space_id}",
            get(spaces::get_space)
                .put(spaces::update_space)
                .delete(spaces::delete_space),
        )
        .route("/space/user/{user_id}", get(spaces::list_spaces_by_user))
        .route("/space/image/{space_id}", delete(spaces::delete_space_image))
        .route("/item", post(items::create_item))
        .route(
            "/item/{item_id}",
            get(items::get_item)
                .put(items::update_item)
                .delete(items::delete_item),
        )
        .route("/item/space/{space_id}", get(items::list_items_by_space))
        .route("/item/grid/{grid_id}", get(items::list_items_by_grid))
        .route("/item/image/{item_id}", delete(items::delete_item_image))
        .route("/item/reminder/{item_id}", put(items::complete_reminder))
        .route(
            "/item/reminder/user/{user_id}",
            get(items::list_due_reminders),
        )
        .route("/grid", post(grids::sync_grids))
        .route("/grid/space/{space_id}", get(grids::list_grids))
        .route("/grid/{grid_id}", delete(grids::delete_grid));

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}
