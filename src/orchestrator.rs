//! Publish/fetch sequencing
//!
//! Drives a single operation through
//! `Idle → Fingerprinted → Located → CheckedLocal → Transferred → Finalized`,
//! dropping to `Aborted` on the first failure. Every step is synchronous.
//!
//! Fetch never leaves a half-populated destination: blobs are unpacked into
//! a sibling staging directory that is renamed into place, and the cache
//! marker is written last. Publish refuses directories that carry a marker
//! and keys that already exist remotely.

use crate::archive::Archiver;
use crate::cache::{is_cached, write_marker, CacheMarker, Locator, Manifest, ObjectLocation, Platform};
use crate::error::{BunchError, BunchResult};
use crate::store::ObjectStore;
use crate::transfer::{Location, Transfer};
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Where an operation currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Fingerprinted,
    Located,
    CheckedLocal,
    Transferred,
    Finalized,
    Aborted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fingerprinted => "fingerprinted",
            Self::Located => "located",
            Self::CheckedLocal => "checked",
            Self::Transferred => "transferred",
            Self::Finalized => "finalized",
            Self::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// Receives phase transitions, e.g. to drive a spinner
pub trait Reporter: Send + Sync {
    fn phase(&self, phase: Phase, detail: &str);
}

/// Reporter that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn phase(&self, _phase: Phase, _detail: &str) {}
}

static SILENT: SilentReporter = SilentReporter;

/// Inputs of a fetch
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub prefix: String,
    pub manifest_path: PathBuf,
    pub local_path: PathBuf,
    pub bucket: String,
    pub platform: Platform,
}

/// Inputs of a publish
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub prefix: String,
    pub path: PathBuf,
    pub manifest_path: PathBuf,
    pub bucket: String,
    pub platform: Platform,
    /// Overwrite an existing remote object
    pub force: bool,
}

/// Outcome of a completed operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub location: ObjectLocation,
    /// Blob bytes moved over the transport
    pub bytes: u64,
    pub phase: Phase,
}

/// Tracks the phase of one operation
struct Progress<'r> {
    operation: &'static str,
    phase: Phase,
    reporter: &'r dyn Reporter,
}

impl<'r> Progress<'r> {
    fn new(operation: &'static str, reporter: &'r dyn Reporter) -> Self {
        Self {
            operation,
            phase: Phase::Idle,
            reporter,
        }
    }

    fn advance(&mut self, next: Phase, detail: &str) {
        debug!("{}: {} -> {} ({})", self.operation, self.phase, next, detail);
        self.phase = next;
        self.reporter.phase(next, detail);
    }

    fn abort(&mut self, error: &BunchError) {
        warn!("{} aborted after {}: {}", self.operation, self.phase, error);
        self.phase = Phase::Aborted;
        self.reporter.phase(Phase::Aborted, &error.to_string());
    }
}

/// Sequences fingerprinting, location, transfer and archiving
pub struct Orchestrator<'a> {
    store: &'a dyn ObjectStore,
    archiver: &'a dyn Archiver,
    locator: Locator,
    staging_dir: Option<PathBuf>,
    reporter: &'a dyn Reporter,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a dyn ObjectStore, archiver: &'a dyn Archiver, locator: Locator) -> Self {
        Self {
            store,
            archiver,
            locator,
            staging_dir: None,
            reporter: &SILENT,
        }
    }

    /// Put staging blobs in `dir` instead of the system temp dir
    pub fn with_staging_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.staging_dir = dir;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Download and unpack the bundle for a manifest into a new directory
    pub fn fetch(&self, request: &FetchRequest) -> BunchResult<OperationReport> {
        let mut progress = Progress::new("fetch", self.reporter);
        let result = self.run_fetch(request, &mut progress);
        if let Err(e) = &result {
            progress.abort(e);
        }
        result
    }

    /// Pack a directory and upload it under the manifest's key
    pub fn publish(&self, request: &PublishRequest) -> BunchResult<OperationReport> {
        let mut progress = Progress::new("publish", self.reporter);
        let result = self.run_publish(request, &mut progress);
        if let Err(e) = &result {
            progress.abort(e);
        }
        result
    }

    fn run_fetch(
        &self,
        request: &FetchRequest,
        progress: &mut Progress<'_>,
    ) -> BunchResult<OperationReport> {
        let dest = &request.local_path;
        ensure_absent(dest)?;

        let location = self.fingerprint_and_locate(
            &request.prefix,
            &request.manifest_path,
            &request.platform,
            &request.bucket,
            progress,
        )?;

        ensure_absent(dest)?;
        progress.advance(Phase::CheckedLocal, &dest.display().to_string());

        let parent = parent_dir(dest);
        fs::create_dir_all(&parent)
            .map_err(|e| BunchError::io(format!("creating {}", parent.display()), e))?;

        let staging = self.staging_file()?;
        let bytes = Transfer::new(self.store).transfer(
            &Location::parse(&location.remote_url),
            &Location::local(staging.path()),
        )?;
        progress.advance(Phase::Transferred, &format!("{} bytes", bytes));

        let unpack_dir = tempfile::Builder::new()
            .prefix(".bunch-unpack-")
            .tempdir_in(&parent)
            .map_err(|e| BunchError::io(format!("creating staging directory in {}", parent.display()), e))?;

        // Dropping `staging` and `unpack_dir` on error removes both
        self.archiver.unpack(staging.path(), unpack_dir.path())?;
        drop(staging);

        let unpacked = unpack_dir.keep();
        if let Err(e) = fs::rename(&unpacked, dest) {
            if let Err(cleanup) = fs::remove_dir_all(&unpacked) {
                warn!("Failed to remove {}: {}", unpacked.display(), cleanup);
            }
            return Err(BunchError::io(format!("moving bundle into {}", dest.display()), e));
        }

        write_marker(dest, &CacheMarker::new(&location))?;
        progress.advance(Phase::Finalized, &dest.display().to_string());

        info!("Fetched {} into {}", location.object_name, dest.display());
        Ok(OperationReport {
            location,
            bytes,
            phase: progress.phase,
        })
    }

    fn run_publish(
        &self,
        request: &PublishRequest,
        progress: &mut Progress<'_>,
    ) -> BunchResult<OperationReport> {
        let source = &request.path;
        if is_cached(source) {
            return Err(BunchError::AlreadyCached(source.clone()));
        }
        if !source.is_dir() {
            return Err(BunchError::PathNotFound(source.clone()));
        }

        let location = self.fingerprint_and_locate(
            &request.prefix,
            &request.manifest_path,
            &request.platform,
            &request.bucket,
            progress,
        )?;

        if request.force {
            debug!("Skipping remote existence check for {}", location.object_name);
        } else if self.store.exists(&location.remote_url)? {
            return Err(BunchError::AlreadyPublished(location.object_name));
        }
        progress.advance(Phase::CheckedLocal, &location.remote_url);

        let staging = self.staging_file()?;
        self.archiver.pack(source, staging.path())?;

        let bytes = Transfer::new(self.store).transfer(
            &Location::local(staging.path()),
            &Location::parse(&location.remote_url),
        )?;
        progress.advance(Phase::Transferred, &format!("{} bytes", bytes));
        progress.advance(Phase::Finalized, &location.remote_url);

        info!("Published {} ({} bytes)", location.object_name, bytes);
        Ok(OperationReport {
            location,
            bytes,
            phase: progress.phase,
        })
    }

    fn fingerprint_and_locate(
        &self,
        prefix: &str,
        manifest_path: &Path,
        platform: &Platform,
        bucket: &str,
        progress: &mut Progress<'_>,
    ) -> BunchResult<ObjectLocation> {
        let manifest = Manifest::read(manifest_path)?;
        let fingerprint = manifest.fingerprint()?;
        debug!("Fingerprint of {}: {}", manifest.path.display(), fingerprint);
        progress.advance(Phase::Fingerprinted, fingerprint.as_str());

        let location = self.locator.locate(prefix, &fingerprint, platform, bucket)?;
        progress.advance(Phase::Located, &location.remote_url);
        Ok(location)
    }

    fn staging_file(&self) -> BunchResult<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(".bunch-").suffix(".tar.gz");

        let result = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        result.map_err(|e| BunchError::io("creating staging file", e))
    }
}

fn ensure_absent(dest: &Path) -> BunchResult<()> {
    if dest.exists() {
        return Err(BunchError::DestinationExists {
            path: dest.to_path_buf(),
            cached: is_cached(dest),
        });
    }
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::TarGz;
    use crate::cache::{locate, read_marker, Fingerprint};
    use crate::store::MemoryStore;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const BUCKET: &str = "deps";

    fn linux() -> Platform {
        Platform::new("linux-x86_64").unwrap()
    }

    struct Fixture {
        root: TempDir,
        store: MemoryStore,
        archiver: TarGz,
    }

    impl Fixture {
        fn new() -> Self {
            let root = TempDir::new().unwrap();
            fs::write(root.path().join("Gemfile.lock"), "X").unwrap();

            let bundle = root.path().join("vendor");
            fs::create_dir_all(bundle.join("gems/rack/lib")).unwrap();
            fs::create_dir_all(bundle.join("empty")).unwrap();
            fs::write(bundle.join("gems/rack/lib/rack.rb"), "module Rack; end\n").unwrap();

            Self {
                root,
                store: MemoryStore::new(),
                archiver: TarGz::new(),
            }
        }

        fn path(&self, rel: &str) -> PathBuf {
            self.root.path().join(rel)
        }

        fn orchestrator(&self) -> Orchestrator<'_> {
            Orchestrator::new(&self.store, &self.archiver, Locator::default())
                .with_staging_dir(Some(self.root.path().to_path_buf()))
        }

        fn publish_request(&self) -> PublishRequest {
            PublishRequest {
                prefix: "app".to_string(),
                path: self.path("vendor"),
                manifest_path: self.path("Gemfile.lock"),
                bucket: BUCKET.to_string(),
                platform: linux(),
                force: false,
            }
        }

        fn fetch_request(&self, dest: &str) -> FetchRequest {
            FetchRequest {
                prefix: "app".to_string(),
                manifest_path: self.path("Gemfile.lock"),
                local_path: self.path(dest),
                bucket: BUCKET.to_string(),
                platform: linux(),
            }
        }

        fn expected_url(&self) -> String {
            let fp = Fingerprint::of(b"X").unwrap();
            locate("app", &fp, &linux(), BUCKET).unwrap().remote_url
        }

        /// Staging leftovers in the fixture root
        fn leftovers(&self) -> Vec<String> {
            fs::read_dir(self.root.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .filter(|name| name.starts_with(".bunch-"))
                .collect()
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Phase>>);

    impl Reporter for Recorder {
        fn phase(&self, phase: Phase, _detail: &str) {
            self.0.lock().unwrap().push(phase);
        }
    }

    #[test]
    fn publish_then_fetch_end_to_end() {
        let fx = Fixture::new();

        let published = fx.orchestrator().publish(&fx.publish_request()).unwrap();
        let fp = Fingerprint::of(b"X").unwrap();
        assert_eq!(
            published.location.object_name,
            format!("app_{}_linux-x86_64.tar.gz", fp)
        );
        assert_eq!(fx.store.urls(), vec![fx.expected_url()]);
        assert_eq!(published.phase, Phase::Finalized);
        assert!(!is_cached(&fx.path("vendor")));

        let fetched = fx.orchestrator().fetch(&fx.fetch_request("restored")).unwrap();
        assert_eq!(fetched.location.remote_url, published.location.remote_url);
        assert_eq!(fetched.bytes, published.bytes);

        let restored = fx.path("restored");
        assert_eq!(
            fs::read_to_string(restored.join("gems/rack/lib/rack.rb")).unwrap(),
            "module Rack; end\n"
        );
        assert!(restored.join("empty").is_dir());
        assert!(is_cached(&restored));
        assert_eq!(
            read_marker(&restored).unwrap().key,
            published.location.key.to_string()
        );
        assert!(fx.leftovers().is_empty());
    }

    #[test]
    fn fetch_reports_phases_in_order() {
        let fx = Fixture::new();
        fx.orchestrator().publish(&fx.publish_request()).unwrap();

        let recorder = Recorder::default();
        fx.orchestrator()
            .with_reporter(&recorder)
            .fetch(&fx.fetch_request("restored"))
            .unwrap();

        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                Phase::Fingerprinted,
                Phase::Located,
                Phase::CheckedLocal,
                Phase::Transferred,
                Phase::Finalized
            ]
        );
    }

    #[test]
    fn fetch_into_existing_path_is_rejected() {
        let fx = Fixture::new();
        fx.orchestrator().publish(&fx.publish_request()).unwrap();
        fs::create_dir(fx.path("restored")).unwrap();

        let recorder = Recorder::default();
        let err = fx
            .orchestrator()
            .with_reporter(&recorder)
            .fetch(&fx.fetch_request("restored"))
            .unwrap_err();

        assert!(matches!(err, BunchError::DestinationExists { cached: false, .. }));
        assert_eq!(err.kind(), crate::error::ErrorKind::PreconditionFailed);
        assert_eq!(fx.store.reads(), 0);
        assert!(!is_cached(&fx.path("restored")));
        assert_eq!(*recorder.0.lock().unwrap(), vec![Phase::Aborted]);
    }

    #[test]
    fn fetch_miss_leaves_nothing_behind() {
        let fx = Fixture::new();

        let err = fx.orchestrator().fetch(&fx.fetch_request("restored")).unwrap_err();

        assert!(err.is_cache_miss());
        assert!(!fx.path("restored").exists());
        assert!(fx.leftovers().is_empty());
    }

    /// Unpacks normally, but something else claims the destination meanwhile
    struct RacingArchiver {
        dest: PathBuf,
    }

    impl Archiver for RacingArchiver {
        fn pack(&self, dir: &Path, blob: &Path) -> BunchResult<u64> {
            TarGz::new().pack(dir, blob)
        }

        fn unpack(&self, blob: &Path, dest: &Path) -> BunchResult<()> {
            fs::create_dir_all(&self.dest).unwrap();
            fs::write(self.dest.join("other.txt"), "not ours").unwrap();
            TarGz::new().unpack(blob, dest)
        }
    }

    #[test]
    fn fetch_failed_move_cleans_unpack_dir() {
        let fx = Fixture::new();
        fx.orchestrator().publish(&fx.publish_request()).unwrap();

        let archiver = RacingArchiver {
            dest: fx.path("restored"),
        };
        let err = Orchestrator::new(&fx.store, &archiver, Locator::default())
            .with_staging_dir(Some(fx.root.path().to_path_buf()))
            .fetch(&fx.fetch_request("restored"))
            .unwrap_err();

        assert!(matches!(err, BunchError::Io { .. }));
        assert!(fx.leftovers().is_empty());
        assert!(!is_cached(&fx.path("restored")));
        assert!(fx.path("restored/other.txt").exists());
    }

    #[test]
    fn fetch_corrupt_blob_is_extraction_failure() {
        let fx = Fixture::new();
        fx.store.insert(fx.expected_url(), b"not a tarball".to_vec());

        let err = fx.orchestrator().fetch(&fx.fetch_request("restored")).unwrap_err();

        assert!(matches!(err, BunchError::ExtractionFailed { .. }));
        assert!(!fx.path("restored").exists());
        assert!(fx.leftovers().is_empty());
    }

    #[test]
    fn fetch_without_manifest_fails() {
        let fx = Fixture::new();
        let mut request = fx.fetch_request("restored");
        request.manifest_path = fx.path("missing.lock");

        let err = fx.orchestrator().fetch(&request).unwrap_err();
        assert!(matches!(err, BunchError::ManifestUnavailable { .. }));
        assert!(!fx.path("restored").exists());
    }

    #[test]
    fn fetch_creates_missing_parents() {
        let fx = Fixture::new();
        fx.orchestrator().publish(&fx.publish_request()).unwrap();

        fx.orchestrator()
            .fetch(&fx.fetch_request("deep/nested/vendor"))
            .unwrap();
        assert!(is_cached(&fx.path("deep/nested/vendor")));
    }

    #[test]
    fn publish_from_cached_dir_is_rejected() {
        let fx = Fixture::new();
        fx.orchestrator().publish(&fx.publish_request()).unwrap();
        fx.orchestrator().fetch(&fx.fetch_request("restored")).unwrap();

        let mut request = fx.publish_request();
        request.path = fx.path("restored");
        request.force = true;

        let writes_before = fx.store.writes();
        let err = fx.orchestrator().publish(&request).unwrap_err();

        assert!(matches!(err, BunchError::AlreadyCached(_)));
        assert_eq!(err.kind(), crate::error::ErrorKind::PreconditionFailed);
        assert_eq!(fx.store.writes(), writes_before);
    }

    #[test]
    fn publish_existing_key_is_rejected_unless_forced() {
        let fx = Fixture::new();
        fx.orchestrator().publish(&fx.publish_request()).unwrap();

        let err = fx.orchestrator().publish(&fx.publish_request()).unwrap_err();
        assert!(matches!(err, BunchError::AlreadyPublished(_)));
        assert_eq!(fx.store.writes(), 1);

        let mut forced = fx.publish_request();
        forced.force = true;
        fx.orchestrator().publish(&forced).unwrap();
        assert_eq!(fx.store.writes(), 2);
    }

    #[test]
    fn publish_missing_path_fails() {
        let fx = Fixture::new();
        let mut request = fx.publish_request();
        request.path = fx.path("node_modules");

        let err = fx.orchestrator().publish(&request).unwrap_err();
        assert!(matches!(err, BunchError::PathNotFound(_)));
        assert!(fx.store.urls().is_empty());
    }

    #[test]
    fn publish_empty_manifest_fails() {
        let fx = Fixture::new();
        fs::write(fx.path("Gemfile.lock"), "").unwrap();

        let err = fx.orchestrator().publish(&fx.publish_request()).unwrap_err();
        assert!(matches!(err, BunchError::ManifestUnavailable { .. }));
        assert!(fx.store.urls().is_empty());
    }

    #[test]
    fn changed_manifest_changes_key() {
        let fx = Fixture::new();
        let first = fx.orchestrator().publish(&fx.publish_request()).unwrap();

        fs::write(fx.path("Gemfile.lock"), "Y").unwrap();
        let second = fx.orchestrator().publish(&fx.publish_request()).unwrap();

        assert_ne!(first.location.object_name, second.location.object_name);
        assert_eq!(fx.store.urls().len(), 2);
    }

    #[test]
    fn parent_dir_of_bare_name() {
        assert_eq!(parent_dir(Path::new("vendor")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("a/vendor")), PathBuf::from("a"));
    }
}
