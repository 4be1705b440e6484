//! Error types for Bunch
//!
//! All modules use `BunchResult<T>` as their return type.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Bunch operations
pub type BunchResult<T> = Result<T, BunchError>;

/// Coarse classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A precondition of publish/fetch did not hold
    PreconditionFailed,
    /// Open/read/write/close failure on the filesystem or the remote store
    IoFailure,
    /// A blob could not be unpacked
    ExtractionFailed,
    /// A directory could not be packed
    ArchiveFailed,
    /// The cache marker could not be written
    MarkerWriteFailed,
    /// Configuration could not be loaded or saved
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreconditionFailed => "precondition failed",
            Self::IoFailure => "i/o failure",
            Self::ExtractionFailed => "extraction failed",
            Self::ArchiveFailed => "archive failed",
            Self::MarkerWriteFailed => "marker write failed",
            Self::Configuration => "configuration error",
        };
        write!(f, "{}", name)
    }
}

/// All errors that can occur in Bunch
#[derive(Error, Debug)]
pub enum BunchError {
    // Precondition errors
    #[error("Destination already exists: {}", path.display())]
    DestinationExists { path: PathBuf, cached: bool },

    #[error("Directory already holds a cached bundle: {}", .0.display())]
    AlreadyCached(PathBuf),

    #[error("Artifact already published: {0}")]
    AlreadyPublished(String),

    #[error("Manifest unavailable at {}: {reason}", path.display())]
    ManifestUnavailable { path: PathBuf, reason: String },

    #[error("Manifest content is empty")]
    EmptyManifest,

    #[error("No manifest found in {}", .0.display())]
    ManifestNotDetected(PathBuf),

    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Cannot infer the bundle directory for {}", .0.display())]
    BundleDirUnknown(PathBuf),

    #[error("Invalid locator input: {0}")]
    InvalidLocatorInput(String),

    #[error("Cannot use the name of {} as prefix: {reason}", dir.display())]
    DerivedPrefixInvalid { dir: PathBuf, reason: String },

    #[error("{0} is not set")]
    CredentialsMissing(&'static str),

    #[error("No cached artifact at {0}")]
    ArtifactNotFound(String),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object store error for {url}: {reason}")]
    Store { url: String, reason: String },

    // Archive errors
    #[error("Failed to extract {}: {reason}", archive.display())]
    ExtractionFailed { archive: PathBuf, reason: String },

    #[error("Failed to pack {}: {reason}", path.display())]
    ArchiveFailed { path: PathBuf, reason: String },

    // Marker errors
    #[error("Failed to write cache marker in {}: {reason}", dir.display())]
    MarkerWriteFailed { dir: PathBuf, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {}: {source}", path.display())]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BunchError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an object store error
    pub fn store(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Store {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DestinationExists { .. }
            | Self::AlreadyCached(_)
            | Self::AlreadyPublished(_)
            | Self::ManifestUnavailable { .. }
            | Self::EmptyManifest
            | Self::ManifestNotDetected(_)
            | Self::PathNotFound(_)
            | Self::BundleDirUnknown(_)
            | Self::InvalidLocatorInput(_)
            | Self::DerivedPrefixInvalid { .. }
            | Self::CredentialsMissing(_)
            | Self::ArtifactNotFound(_) => ErrorKind::PreconditionFailed,
            Self::Io { .. } | Self::Store { .. } | Self::Internal(_) => ErrorKind::IoFailure,
            Self::ExtractionFailed { .. } => ErrorKind::ExtractionFailed,
            Self::ArchiveFailed { .. } => ErrorKind::ArchiveFailed,
            Self::MarkerWriteFailed { .. } => ErrorKind::MarkerWriteFailed,
            Self::ConfigInvalid { .. }
            | Self::ConfigDirCreate { .. }
            | Self::Json(_)
            | Self::TomlSerialize(_) => ErrorKind::Configuration,
        }
    }

    /// Whether the error is a plain cache miss
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, Self::ArtifactNotFound(_))
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::DestinationExists { cached: true, .. } => {
                Some("The directory already holds a fetched bundle, nothing to do")
            }
            Self::DestinationExists { cached: false, .. } => {
                Some("Remove the directory first, fetch never merges into existing files")
            }
            Self::AlreadyCached(_) => {
                Some("This bundle was fetched from the cache, there is nothing new to publish")
            }
            Self::AlreadyPublished(_) => Some("Pass --force to overwrite the remote artifact"),
            Self::CredentialsMissing("S3 access key") => Some("Set S3_KEY or pass --s3-key"),
            Self::CredentialsMissing("S3 secret key") => Some("Set S3_SECRET or pass --s3-secret"),
            Self::CredentialsMissing("S3 bucket name") => Some("Set S3_BUCKET or pass --s3-bucket"),
            Self::ManifestNotDetected(_) => Some("Pass --manifest with the lockfile to key on"),
            Self::BundleDirUnknown(_) => Some("Pass --path with the directory to cache"),
            Self::DerivedPrefixInvalid { .. } => {
                Some("Pass --prefix using only letters, digits, '.', '_' and '-'")
            }
            Self::ArtifactNotFound(_) => Some("Install dependencies and run: bunch upload"),
            _ => None,
        }
    }
}
