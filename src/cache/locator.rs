//! Artifact naming and remote location
//!
//! Maps (prefix, fingerprint, platform) to the object name of a cached
//! bundle and joins it with the store endpoint and bucket. Pure functions,
//! no I/O.

use crate::cache::fingerprint::Fingerprint;
use crate::error::{BunchError, BunchResult};
use serde::Serialize;
use std::fmt;

/// Default S3 endpoint (path-style addressing)
pub const DEFAULT_ENDPOINT: &str = "https://s3.amazonaws.com";

/// Archive extension of every cached bundle
pub const ARCHIVE_EXTENSION: &str = ".tar.gz";

/// Platform discriminator embedded in artifact keys
///
/// Bundles built for one platform are never served to another.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Platform(String);

impl Platform {
    /// Platform of the running binary, e.g. `linux-x86_64`
    pub fn current() -> Self {
        Self(format!(
            "{}-{}",
            std::env::consts::OS,
            std::env::consts::ARCH
        ))
    }

    /// Use an explicit platform name
    pub fn new(name: impl Into<String>) -> BunchResult<Self> {
        let name = name.into();
        validate_component("platform", &name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Composite cache key: `{prefix}_{fingerprint}_{platform}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ArtifactKey {
    pub prefix: String,
    pub fingerprint: String,
    pub platform: Platform,
}

impl ArtifactKey {
    /// Build a key, validating the prefix
    pub fn new(prefix: &str, fingerprint: &Fingerprint, platform: &Platform) -> BunchResult<Self> {
        validate_prefix(prefix)?;

        Ok(Self {
            prefix: prefix.to_string(),
            fingerprint: fingerprint.as_str().to_string(),
            platform: platform.clone(),
        })
    }

    /// Remote object name including the archive extension
    pub fn object_name(&self) -> String {
        format!("{}{}", self, ARCHIVE_EXTENSION)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.prefix, self.fingerprint, self.platform)
    }
}

/// Where a cached bundle lives remotely
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectLocation {
    pub key: ArtifactKey,
    pub object_name: String,
    pub remote_url: String,
}

/// Joins artifact keys with a store endpoint
#[derive(Debug, Clone)]
pub struct Locator {
    endpoint: String,
}

impl Locator {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Derive the object name and URL for a bundle
    pub fn locate(
        &self,
        prefix: &str,
        fingerprint: &Fingerprint,
        platform: &Platform,
        bucket: &str,
    ) -> BunchResult<ObjectLocation> {
        if bucket.is_empty() {
            return Err(BunchError::InvalidLocatorInput(
                "bucket must not be empty".to_string(),
            ));
        }
        validate_component("bucket", bucket)?;

        let key = ArtifactKey::new(prefix, fingerprint, platform)?;
        let object_name = key.object_name();
        let remote_url = format!("{}/{}/{}", self.endpoint, bucket, object_name);

        Ok(ObjectLocation {
            key,
            object_name,
            remote_url,
        })
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

/// Locate a bundle on the default endpoint
pub fn locate(
    prefix: &str,
    fingerprint: &Fingerprint,
    platform: &Platform,
    bucket: &str,
) -> BunchResult<ObjectLocation> {
    Locator::default().locate(prefix, fingerprint, platform, bucket)
}

/// Check that `prefix` can be used in an artifact key
pub fn validate_prefix(prefix: &str) -> BunchResult<()> {
    validate_component("prefix", prefix)
}

/// Key components end up in URLs, keep them to a safe alphabet
fn validate_component(what: &str, value: &str) -> BunchResult<()> {
    if value.is_empty() {
        return Err(BunchError::InvalidLocatorInput(format!(
            "{} must not be empty",
            what
        )));
    }
    if let Some(c) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(BunchError::InvalidLocatorInput(format!(
            "{} contains invalid character {:?}: {}",
            what, c, value
        )));
    }
    Ok(())
}
