//! Bundle packing and unpacking
//!
//! Turns a dependency directory into a single tar.gz blob and back. The full
//! tree is preserved, including empty directories and file modes.

use crate::error::{BunchError, BunchResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Pack/unpack capability used by the orchestrator
pub trait Archiver: Send + Sync {
    /// Pack `dir` into a blob written at `blob`, returning the blob size
    fn pack(&self, dir: &Path, blob: &Path) -> BunchResult<u64>;

    /// Materialize `blob` into `dest`, creating it if needed
    fn unpack(&self, blob: &Path, dest: &Path) -> BunchResult<()>;
}

/// Gzip-compressed tarball archiver
#[derive(Debug, Clone)]
pub struct TarGz {
    level: Compression,
}

impl TarGz {
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    fn write_tarball(&self, dir: &Path, blob: &Path) -> std::io::Result<()> {
        let file = File::create(blob)?;
        let encoder = GzEncoder::new(BufWriter::new(file), self.level);

        let mut builder = tar::Builder::new(encoder);
        builder.follow_symlinks(false);
        builder.append_dir_all(".", dir)?;

        let mut writer = builder.into_inner()?.finish()?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }
}

impl Default for TarGz {
    fn default() -> Self {
        Self::new()
    }
}

impl Archiver for TarGz {
    fn pack(&self, dir: &Path, blob: &Path) -> BunchResult<u64> {
        let fail = |reason: String| BunchError::ArchiveFailed {
            path: dir.to_path_buf(),
            reason,
        };

        if !dir.is_dir() {
            return Err(fail("not a directory".to_string()));
        }

        self.write_tarball(dir, blob).map_err(|e| fail(e.to_string()))?;

        let size = fs::metadata(blob).map_err(|e| fail(e.to_string()))?.len();
        debug!("Packed {} into {} ({} bytes)", dir.display(), blob.display(), size);
        Ok(size)
    }

    fn unpack(&self, blob: &Path, dest: &Path) -> BunchResult<()> {
        let fail = |reason: String| BunchError::ExtractionFailed {
            archive: blob.to_path_buf(),
            reason,
        };

        let file = File::open(blob).map_err(|e| fail(e.to_string()))?;
        fs::create_dir_all(dest).map_err(|e| fail(e.to_string()))?;

        // Entries resolving outside `dest` are skipped by tar
        let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
        archive.set_preserve_permissions(true);
        archive.set_preserve_mtime(true);
        archive.unpack(dest).map_err(|e| fail(e.to_string()))?;

        debug!("Unpacked {} into {}", blob.display(), dest.display());
        Ok(())
    }
}
