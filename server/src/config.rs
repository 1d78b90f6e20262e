//! Application configuration
//!
//! Constants for upload layout and limits, plus the runtime `Config`
//! read from the environment at startup.

use anyhow::Context;
use std::path::PathBuf;

// ===== Upload Layout =====

/// Directory (under the public root) where multipart uploads land first
pub const TEMP_UPLOAD_DIR: &str = "upload/temp";

/// Permanent directory (under the public root) for space images
pub const SPACE_IMAGE_DIR: &str = "upload/images/space";

/// Permanent directory (under the public root) for item images
pub const ITEM_IMAGE_DIR: &str = "upload/images/item";

/// Multipart part name carrying the uploaded image
pub const IMAGE_FIELD: &str = "imgFile";

/// Maximum accepted request body for uploads (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Maximum length of a stored file extension, longer ones are dropped
pub const MAX_EXTENSION_LENGTH: usize = 10;

// ===== Server Defaults =====

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_PATH: &str = "data/inventory.db";
pub const DEFAULT_PUBLIC_ROOT: &str = "public";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds on
    pub port: u16,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Root directory that uploaded files live under
    pub public_root: PathBuf,
    /// Allow any origin (the web client is served from another port in development)
    pub cors_permissive: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got {:?}", value))?,
            Err(_) => DEFAULT_PORT,
        };

        let database_path = std::env::var("DATABASE_PATH")
            .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string())
            .into();

        let public_root = std::env::var("PUBLIC_ROOT")
            .unwrap_or_else(|_| DEFAULT_PUBLIC_ROOT.to_string())
            .into();

        let cors_permissive = match std::env::var("CORS_PERMISSIVE") {
            Ok(value) => parse_flag(&value)
                .with_context(|| format!("CORS_PERMISSIVE must be true or false, got {:?}", value))?,
            Err(_) => true,
        };

        Ok(Config {
            port,
            database_path,
            public_root,
            cors_permissive,
        })
    }
}

/// Parse the boolean spellings accepted in env vars and form fields
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" ON "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
