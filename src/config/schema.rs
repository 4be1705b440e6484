//! Configuration schema for Bunch
//!
//! Configuration is stored at `~/.config/bunch/config.toml`, optionally
//! overridden per project by a `.bunch.toml`.

use crate::cache::locator::DEFAULT_ENDPOINT;
use crate::store::s3::DEFAULT_REGION;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Object store settings
    pub store: StoreConfig,

    /// Cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Record publishes and fetches in the audit log
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Object store configuration
///
/// Credentials are usually supplied through `S3_KEY`/`S3_SECRET`/`S3_BUCKET`
/// rather than written here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// S3-compatible endpoint, path-style
    pub endpoint: String,

    /// Signing region
    pub region: String,

    /// Bucket name
    pub bucket: Option<String>,

    /// Access key
    pub access_key: Option<String>,

    /// Secret key
    pub secret_key: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            region: DEFAULT_REGION.to_string(),
            bucket: None,
            access_key: None,
            secret_key: None,
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Platform discriminator override (default: `{os}-{arch}`)
    pub platform: Option<String>,

    /// Directory for staging blobs (default: system temp dir)
    pub staging_dir: Option<PathBuf>,
}
