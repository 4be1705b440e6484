//! Fingerprint-keyed artifact cache
//!
//! Provides content-addressed naming for dependency bundles, keyed by
//! manifest (lockfile) fingerprints.
//!
//! # Key Model
//!
//! - Cache keys derived from the manifest SHA-1 fingerprint
//! - `{prefix}_{fingerprint}_{platform}.tar.gz` names the remote object
//! - Changing dependencies requires a different manifest = different key
//! - Fetched directories carry a `.bunch` marker once fully unpacked
//!
//! # Local States
//!
//! | State | Marker | Description |
//! |-------|--------|-------------|
//! | Absent | - | Directory missing, fetch may populate it |
//! | Unmarked | no | Files present but not known to be a complete bundle |
//! | Cached | yes | Fetched and unpacked, publish refuses it |

pub mod fingerprint;
pub mod locator;
pub mod marker;

pub use fingerprint::{detect_manifest, fingerprint, DetectedManifest, Ecosystem, Fingerprint, Manifest};
pub use locator::{locate, validate_prefix, ArtifactKey, Locator, ObjectLocation, Platform};
pub use marker::{is_cached, read_marker, write_marker, CacheMarker, MARKER_FILE};
