//! S3-compatible object store over HTTP
//!
//! Path-style URLs (`{endpoint}/{bucket}/{object}`), SigV4-signed requests.
//! Works against AWS S3 as well as MinIO, R2 and other compatible stores.

use super::sign::{self, S3Credentials};
use super::{BlobSink, ObjectStore};
use crate::error::{BunchError, BunchResult};
use chrono::Utc;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use tracing::{debug, warn};

/// Default signing region
pub const DEFAULT_REGION: &str = "us-east-1";

/// S3 client backed by a blocking HTTP agent
pub struct S3Store {
    agent: ureq::Agent,
    credentials: S3Credentials,
    region: String,
}

impl S3Store {
    pub fn new(credentials: S3Credentials, region: impl Into<String>) -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
            credentials,
            region: region.into(),
        }
    }

    fn signed(&self, method: &str, url: &str) -> BunchResult<Vec<(&'static str, String)>> {
        let mut headers = sign::sign(&self.credentials, &self.region, method, url, Utc::now())?;
        // ureq derives host from the URL itself
        headers.retain(|(name, _)| *name != "host");
        Ok(headers)
    }

    fn put(&self, url: &str, mut body: File) -> BunchResult<()> {
        let len = body
            .seek(SeekFrom::End(0))
            .and_then(|len| body.seek(SeekFrom::Start(0)).map(|_| len))
            .map_err(|e| BunchError::io(format!("rewinding upload buffer for {}", url), e))?;

        let mut request = self.agent.put(url);
        for (name, value) in self.signed("PUT", url)? {
            request = request.header(name, value);
        }

        debug!("PUT {} ({} bytes)", url, len);
        request
            .header("content-length", len.to_string())
            .header("content-type", "application/gzip")
            .send(body)
            .map_err(|e| BunchError::store(url, e))?;
        Ok(())
    }
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("credentials", &self.credentials)
            .field("region", &self.region)
            .finish()
    }
}

impl ObjectStore for S3Store {
    fn open_read(&self, url: &str) -> BunchResult<Box<dyn Read>> {
        let mut request = self.agent.get(url);
        for (name, value) in self.signed("GET", url)? {
            request = request.header(name, value);
        }

        debug!("GET {}", url);
        match request.call() {
            Ok(response) => Ok(Box::new(response.into_body().into_reader())),
            Err(ureq::Error::StatusCode(404)) => Err(BunchError::ArtifactNotFound(url.to_string())),
            Err(e) => Err(BunchError::store(url, e)),
        }
    }

    fn open_write<'a>(&'a self, url: &str) -> BunchResult<Box<dyn BlobSink + 'a>> {
        // S3 needs the length up front, so the upload is spooled to disk first
        let spool = tempfile::tempfile()
            .map_err(|e| BunchError::io(format!("creating upload buffer for {}", url), e))?;

        Ok(Box::new(S3Upload {
            store: self,
            url: url.to_string(),
            spool,
        }))
    }

    fn exists(&self, url: &str) -> BunchResult<bool> {
        let mut request = self.agent.head(url);
        for (name, value) in self.signed("HEAD", url)? {
            request = request.header(name, value);
        }

        debug!("HEAD {}", url);
        match request.call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::StatusCode(404)) => Ok(false),
            // Without s3:ListBucket a missing key answers 403
            Err(ureq::Error::StatusCode(403)) => {
                warn!("HEAD {} was forbidden, treating the object as absent", url);
                Ok(false)
            }
            Err(e) => Err(BunchError::store(url, e)),
        }
    }
}

/// Pending upload, committed by `finish`
struct S3Upload<'a> {
    store: &'a S3Store,
    url: String,
    spool: File,
}

impl Write for S3Upload<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.spool.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.spool.flush()
    }
}

impl BlobSink for S3Upload<'_> {
    fn finish(self: Box<Self>) -> BunchResult<()> {
        let Self { store, url, spool } = *self;
        store.put(&url, spool)
    }
}
