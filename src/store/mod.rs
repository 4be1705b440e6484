//! Object store transport
//!
//! The orchestrator only needs three things from remote storage: stream an
//! object out, stream an object in, and ask whether an object exists.
//! [`ObjectStore`] is that seam; [`S3Store`] speaks S3 over HTTP and
//! [`MemoryStore`] keeps objects in process.

pub mod memory;
pub mod s3;
pub mod sign;

pub use memory::MemoryStore;
pub use s3::S3Store;
pub use sign::S3Credentials;

use crate::error::BunchResult;
use std::io::{Read, Write};

/// Writable end of a remote object
///
/// Bytes written are not visible remotely until [`BlobSink::finish`]
/// succeeds. Dropping a sink without finishing discards the upload.
pub trait BlobSink: Write {
    /// Commit the object
    fn finish(self: Box<Self>) -> BunchResult<()>;
}

/// Byte-stream access to remote objects keyed by URL
pub trait ObjectStore: Send + Sync {
    /// Open an object for reading
    ///
    /// A missing object is reported as `BunchError::ArtifactNotFound`.
    fn open_read(&self, url: &str) -> BunchResult<Box<dyn Read>>;

    /// Open an object for writing
    fn open_write<'a>(&'a self, url: &str) -> BunchResult<Box<dyn BlobSink + 'a>>;

    /// Whether an object exists
    fn exists(&self, url: &str) -> BunchResult<bool>;
}
