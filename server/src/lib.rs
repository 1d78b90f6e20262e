//! Inventory server library
//!
//! Spaces, grids and items behind a REST API. Exposed as a library for
//! the binary and for integration tests.

pub mod api;
pub mod app;
pub mod config;
pub mod database;
pub mod error;
pub mod services;
pub mod storage;
