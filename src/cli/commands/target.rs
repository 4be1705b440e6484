//! Turning command-line arguments into a concrete bundle and store

use crate::cli::args::{BundleArgs, StoreArgs};
use crate::config::{expand_path, Config, StoreOverrides};
use crate::cache::{detect_manifest, validate_prefix, Ecosystem, Platform};
use crate::error::{BunchError, BunchResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Bundle a command operates on, with every default filled in
#[derive(Debug, Clone)]
pub struct BundleTarget {
    pub manifest: PathBuf,
    pub path: PathBuf,
    pub prefix: String,
    pub platform: Platform,
    pub ecosystem: Option<Ecosystem>,
}

impl BundleTarget {
    /// Resolve against the current working directory
    pub fn resolve(args: &BundleArgs, config: &Config) -> BunchResult<Self> {
        let cwd = current_dir()?;
        Self::resolve_in(&cwd, args, config)
    }

    /// Resolve relative paths against `cwd`
    ///
    /// The manifest is detected in `cwd` when not given. The bundle directory
    /// defaults to the ecosystem's install directory next to the manifest and
    /// the prefix to the name of the manifest's directory.
    pub fn resolve_in(cwd: &Path, args: &BundleArgs, config: &Config) -> BunchResult<Self> {
        let (manifest, ecosystem) = match &args.manifest {
            Some(path) => {
                let path = absolutize(cwd, path);
                let ecosystem = Ecosystem::from_manifest(&path);
                (path, ecosystem)
            }
            None => {
                let found = detect_manifest(cwd)
                    .ok_or_else(|| BunchError::ManifestNotDetected(cwd.to_path_buf()))?;
                (found.path, Some(found.ecosystem))
            }
        };

        let project_dir = manifest
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());

        let path = match (&args.path, ecosystem) {
            (Some(path), _) => absolutize(cwd, path),
            (None, Some(ecosystem)) => project_dir.join(ecosystem.bundle_dir()),
            (None, None) => return Err(BunchError::BundleDirUnknown(manifest)),
        };

        let prefix = match &args.prefix {
            Some(prefix) => prefix.clone(),
            None => derive_prefix(&project_dir)?,
        };

        let platform = match args.platform.as_ref().or(config.cache.platform.as_ref()) {
            Some(name) => Platform::new(name.as_str())?,
            None => Platform::current(),
        };

        debug!(
            "Bundle target: manifest={} path={} prefix={} platform={}",
            manifest.display(),
            path.display(),
            prefix,
            platform
        );

        Ok(Self {
            manifest,
            path,
            prefix,
            platform,
            ecosystem,
        })
    }
}

/// Prefix taken from the project directory's name
fn derive_prefix(project_dir: &Path) -> BunchResult<String> {
    let name = project_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    validate_prefix(name).map_err(|e| BunchError::DerivedPrefixInvalid {
        dir: project_dir.to_path_buf(),
        reason: match e {
            BunchError::InvalidLocatorInput(reason) => reason,
            other => other.to_string(),
        },
    })?;
    Ok(name.to_string())
}

impl From<&StoreArgs> for StoreOverrides {
    fn from(args: &StoreArgs) -> Self {
        Self {
            access_key: args.s3_key.clone(),
            secret_key: args.s3_secret.clone(),
            bucket: args.s3_bucket.clone(),
            endpoint: args.endpoint.clone(),
            region: args.region.clone(),
        }
    }
}

/// Run a synchronous core operation off the async runtime
pub async fn blocking<T, F>(task: &'static str, f: F) -> BunchResult<T>
where
    F: FnOnce() -> BunchResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BunchError::Internal(format!("{} task failed: {}", task, e)))?
}

pub fn current_dir() -> BunchResult<PathBuf> {
    std::env::current_dir().map_err(|e| BunchError::io("getting current directory", e))
}

/// Expand `~/` and anchor relative paths at `cwd`
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let path = expand_path(path);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}
