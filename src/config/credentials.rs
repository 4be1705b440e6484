//! Store settings resolution
//!
//! Command-line values (which clap already fills from `S3_KEY`, `S3_SECRET`
//! and `S3_BUCKET`) win over the config file.

use super::schema::StoreConfig;
use crate::error::{BunchError, BunchResult};
use crate::store::S3Credentials;
use crate::transfer::is_url;

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct StoreOverrides {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub region: Option<String>,
}

/// Fully resolved settings for talking to the object store
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub credentials: S3Credentials,
}

impl StoreSettings {
    /// Merge overrides with configuration, failing on the first missing value
    pub fn resolve(overrides: &StoreOverrides, config: &StoreConfig) -> BunchResult<Self> {
        let access_key = pick(&overrides.access_key, &config.access_key)
            .ok_or(BunchError::CredentialsMissing("S3 access key"))?;
        let secret_key = pick(&overrides.secret_key, &config.secret_key)
            .ok_or(BunchError::CredentialsMissing("S3 secret key"))?;
        let bucket = resolve_bucket(overrides, config)?;

        let endpoint = pick(&overrides.endpoint, &Some(config.endpoint.clone())).unwrap_or_default();
        if !is_url(&endpoint) {
            return Err(BunchError::InvalidLocatorInput(format!(
                "endpoint must be an http(s) URL: {:?}",
                endpoint
            )));
        }

        Ok(Self {
            endpoint,
            region: pick(&overrides.region, &Some(config.region.clone())).unwrap_or_default(),
            bucket,
            credentials: S3Credentials::new(access_key, secret_key),
        })
    }
}

/// Resolve only the bucket, for commands that never touch the network
pub fn resolve_bucket(overrides: &StoreOverrides, config: &StoreConfig) -> BunchResult<String> {
    pick(&overrides.bucket, &config.bucket).ok_or(BunchError::CredentialsMissing("S3 bucket name"))
}

fn pick(primary: &Option<String>, fallback: &Option<String>) -> Option<String> {
    primary
        .iter()
        .chain(fallback.iter())
        .find(|value| !value.is_empty())
        .cloned()
}
