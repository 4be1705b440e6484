//! Blob transfer between the local filesystem and the object store
//!
//! Both ends of a transfer are a [`Location`], so the same copy loop moves
//! bytes in either direction.

use crate::error::{BunchError, BunchResult};
use crate::store::{BlobSink, ObjectStore};
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One end of a transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A file on the local filesystem
    Local(PathBuf),
    /// An object addressed by an http(s) URL
    Remote(String),
}

impl Location {
    /// Classify a string by its URL scheme
    pub fn parse(s: &str) -> Self {
        if is_url(s) {
            Self::Remote(s.to_string())
        } else {
            Self::Local(PathBuf::from(s))
        }
    }

    pub fn local(path: impl AsRef<Path>) -> Self {
        Self::Local(path.as_ref().to_path_buf())
    }

    pub fn remote(url: impl Into<String>) -> Self {
        Self::Remote(url.into())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => f.write_str(url),
        }
    }
}

/// Whether `s` is an http(s) URL
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Local file opened for writing, synced on finish
struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

impl BlobSink for FileSink {
    fn finish(mut self: Box<Self>) -> BunchResult<()> {
        self.writer
            .flush()
            .and_then(|_| self.writer.get_ref().sync_all())
            .map_err(|e| BunchError::io(format!("closing {}", self.path.display()), e))
    }
}

/// Copies blobs between locations
pub struct Transfer<'a> {
    store: &'a dyn ObjectStore,
}

impl<'a> Transfer<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self { store }
    }

    fn open(&self, location: &Location) -> BunchResult<Box<dyn Read>> {
        match location {
            Location::Local(path) => {
                let file = File::open(path)
                    .map_err(|e| BunchError::io(format!("opening {}", path.display()), e))?;
                Ok(Box::new(file))
            }
            Location::Remote(url) => self.store.open_read(url),
        }
    }

    fn create(&self, location: &Location) -> BunchResult<Box<dyn BlobSink + 'a>> {
        match location {
            Location::Local(path) => {
                let file = File::create(path)
                    .map_err(|e| BunchError::io(format!("creating {}", path.display()), e))?;
                Ok(Box::new(FileSink {
                    path: path.clone(),
                    writer: BufWriter::new(file),
                }))
            }
            Location::Remote(url) => {
                let store: &'a dyn ObjectStore = self.store;
                store.open_write(url)
            }
        }
    }

    /// Copy the full byte stream from `source` to `destination`
    ///
    /// Both ends are released on every return path. A partially written
    /// destination is left as is.
    pub fn transfer(&self, source: &Location, destination: &Location) -> BunchResult<u64> {
        let mut reader = self.open(source)?;
        let mut writer = self.create(destination)?;

        let copied = io::copy(&mut reader, &mut writer).map_err(|e| {
            BunchError::io(format!("copying {} to {}", source, destination), e)
        })?;
        writer.finish()?;

        debug!("Transferred {} bytes from {} to {}", copied, source, destination);
        Ok(copied)
    }
}
