//! Local cache marker
//!
//! A `.bunch` file inside a fetched directory records that the directory
//! holds a complete bundle. It is written only after a successful unpack;
//! a directory without it is treated as unpopulated.

use crate::cache::locator::ObjectLocation;
use crate::error::{BunchError, BunchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name of the marker inside a bundle directory
pub const MARKER_FILE: &str = ".bunch";

/// Provenance recorded in the marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMarker {
    /// Artifact key the directory was populated from
    pub key: String,
    /// Manifest fingerprint
    pub fingerprint: String,
    /// Platform discriminator
    pub platform: String,
    /// Remote URL of the blob
    pub source: String,
    /// When the bundle was fetched
    pub fetched_at: DateTime<Utc>,
    /// Version of bunch that wrote the marker
    pub version: String,
}

impl CacheMarker {
    /// Record provenance for a freshly fetched bundle
    pub fn new(location: &ObjectLocation) -> Self {
        Self {
            key: location.key.to_string(),
            fingerprint: location.key.fingerprint.clone(),
            platform: location.key.platform.to_string(),
            source: location.remote_url.clone(),
            fetched_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Path of the marker inside `dir`
pub fn marker_path(dir: &Path) -> PathBuf {
    dir.join(MARKER_FILE)
}

/// Whether `dir` carries a cache marker
pub fn is_cached(dir: &Path) -> bool {
    marker_path(dir).is_file()
}

/// Write the marker into an existing directory
pub fn write_marker(dir: &Path, marker: &CacheMarker) -> BunchResult<()> {
    if !dir.is_dir() {
        return Err(BunchError::MarkerWriteFailed {
            dir: dir.to_path_buf(),
            reason: "directory does not exist".to_string(),
        });
    }

    let content = serde_json::to_string_pretty(marker)?;
    fs::write(marker_path(dir), content).map_err(|e| BunchError::MarkerWriteFailed {
        dir: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    debug!("Wrote cache marker for {} in {}", marker.key, dir.display());
    Ok(())
}

/// Read marker provenance, if the marker exists and parses
pub fn read_marker(dir: &Path) -> Option<CacheMarker> {
    let path = marker_path(dir);
    let content = fs::read_to_string(&path).ok()?;

    match serde_json::from_str(&content) {
        Ok(marker) => Some(marker),
        Err(e) => {
            warn!("Unreadable cache marker {}: {}", path.display(), e);
            None
        }
    }
}
