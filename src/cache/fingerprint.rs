//! Manifest detection and fingerprinting for content-addressed caching
//!
//! Reads package manager manifests and derives a content fingerprint from
//! their bytes. Same manifest bytes = same fingerprint = same cache entry.
//!
//! The digest is SHA-1, lowercase hex. Artifacts already published under
//! SHA-1 names become unreachable if this changes.

use crate::error::{BunchError, BunchResult};
use sha1::{Digest, Sha1};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported package ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    /// RubyGems/Bundler (Gemfile.lock)
    Rubygems,
    /// npm (package-lock.json, npm-shrinkwrap.json)
    Npm,
    /// Yarn (yarn.lock)
    Yarn,
    /// pnpm (pnpm-lock.yaml)
    Pnpm,
    /// Cargo/Rust (Cargo.lock)
    Cargo,
    /// pip/Python (requirements.txt, Pipfile.lock)
    Pip,
    /// Poetry/Python (poetry.lock)
    Poetry,
    /// Go modules (go.sum)
    Go,
}

impl Ecosystem {
    /// Directory holding installed dependencies, relative to the project root
    pub fn bundle_dir(&self) -> &'static str {
        match self {
            Self::Rubygems => "vendor/bundle",
            Self::Npm | Self::Yarn | Self::Pnpm => "node_modules",
            Self::Cargo | Self::Go => "vendor",
            Self::Pip | Self::Poetry => ".venv",
        }
    }

    /// Get the manifest file names for this ecosystem
    fn manifest_patterns(&self) -> &'static [&'static str] {
        match self {
            Self::Rubygems => &["Gemfile.lock"],
            Self::Npm => &["package-lock.json", "npm-shrinkwrap.json"],
            Self::Yarn => &["yarn.lock"],
            Self::Pnpm => &["pnpm-lock.yaml"],
            Self::Cargo => &["Cargo.lock"],
            Self::Pip => &["requirements.txt", "Pipfile.lock"],
            Self::Poetry => &["poetry.lock"],
            Self::Go => &["go.sum"],
        }
    }

    /// Ecosystem owning a manifest, judged by its file name
    pub fn from_manifest(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::all()
            .iter()
            .copied()
            .find(|ecosystem| ecosystem.manifest_patterns().contains(&name))
    }

    /// All ecosystems in detection priority order
    fn all() -> &'static [Self] {
        &[
            Self::Rubygems,
            Self::Npm,
            Self::Yarn,
            Self::Pnpm,
            Self::Cargo,
            Self::Pip,
            Self::Poetry,
            Self::Go,
        ]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rubygems => "rubygems",
            Self::Npm => "npm",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Cargo => "cargo",
            Self::Pip => "pip",
            Self::Poetry => "poetry",
            Self::Go => "go",
        };
        write!(f, "{}", name)
    }
}

/// Hex digest of manifest bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint raw manifest bytes
    pub fn of(bytes: &[u8]) -> BunchResult<Self> {
        if bytes.is_empty() {
            return Err(BunchError::EmptyManifest);
        }
        Ok(Self(hex::encode(Sha1::digest(bytes))))
    }

    /// The lowercase hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fingerprint manifest bytes
pub fn fingerprint(bytes: &[u8]) -> BunchResult<Fingerprint> {
    Fingerprint::of(bytes)
}

/// Contents of a dependency manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Where the manifest was read from
    pub path: PathBuf,
    bytes: Vec<u8>,
}

impl Manifest {
    /// Read a manifest from disk, rejecting unreadable or empty files
    pub fn read(path: &Path) -> BunchResult<Self> {
        let bytes = fs::read(path).map_err(|e| BunchError::ManifestUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if bytes.is_empty() {
            return Err(BunchError::ManifestUnavailable {
                path: path.to_path_buf(),
                reason: "file is empty".to_string(),
            });
        }

        debug!("Read manifest {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// Raw manifest bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Fingerprint of the manifest bytes
    pub fn fingerprint(&self) -> BunchResult<Fingerprint> {
        Fingerprint::of(&self.bytes)
    }
}

/// A manifest found by scanning a project directory
#[derive(Debug, Clone)]
pub struct DetectedManifest {
    /// The ecosystem this manifest belongs to
    pub ecosystem: Ecosystem,
    /// Path to the manifest
    pub path: PathBuf,
}

/// Find the first known manifest in a project directory
///
/// Ecosystems are checked in priority order and the first existing file wins.
pub fn detect_manifest(project_dir: &Path) -> Option<DetectedManifest> {
    for ecosystem in Ecosystem::all() {
        for pattern in ecosystem.manifest_patterns() {
            let path = project_dir.join(pattern);
            if path.is_file() {
                debug!("Found {} manifest: {}", ecosystem, path.display());
                return Some(DetectedManifest {
                    ecosystem: *ecosystem,
                    path,
                });
            }
        }
    }

    debug!("No manifest found in {}", project_dir.display());
    None
}
