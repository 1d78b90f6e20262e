//! Application state and initialization
//!
//! This module is the composition root: the pool, repository, upload
//! store and services are built here and handed to the router through
//! `AppState`.

use crate::config::Config;
use crate::database::{create_pool, Repository};
use crate::error::Result;
use crate::services::{GridsService, ImageLifecycle, ItemsService, SpacesService, UsersService};
use crate::storage::{ImageKind, UploadStore};
use std::path::PathBuf;

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub users: UsersService,
    pub spaces: SpacesService,
    pub items: ItemsService,
    pub grids: GridsService,
    pub store: UploadStore,
}

impl AppState {
    pub fn new(repo: Repository, store: UploadStore) -> Self {
        Self {
            users: UsersService::new(repo.clone()),
            spaces: SpacesService::new(
                repo.clone(),
                ImageLifecycle::new(store.clone(), ImageKind::Space),
            ),
            items: ItemsService::new(
                repo.clone(),
                ImageLifecycle::new(store.clone(), ImageKind::Item),
            ),
            grids: GridsService::new(repo, store.clone()),
            store,
        }
    }
}

/// Open the database and upload directories described by `config`
pub async fn setup(config: &Config) -> Result<AppState> {
    tracing::info!("Initializing application");

    let pool = create_pool(&config.database_path).await?;
    let repo = Repository::new(pool);

    let store = UploadStore::new(PathBuf::from(&config.public_root));
    store.initialize().await?;

    tracing::info!("Application initialized successfully");

    Ok(AppState::new(repo, store))
}
