//! Storage module
//!
//! File storage for uploaded space and item images.

pub mod upload_store;

pub use upload_store::{ImageKind, StagedUpload, UploadStore};
