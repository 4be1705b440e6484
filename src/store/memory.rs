//! In-process object store
//!
//! Keeps objects in a shared map. Clones share the same objects, so a test
//! can hand one clone to the orchestrator and inspect another.

use super::{BlobSink, ObjectStore};
use crate::error::{BunchError, BunchResult};
use std::collections::HashMap;
use std::io::{self, Cursor, Read, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Inner {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Object store held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object directly
    pub fn insert(&self, url: impl Into<String>, bytes: Vec<u8>) {
        self.lock().insert(url.into(), bytes);
    }

    /// Copy of an object's bytes
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.lock().get(url).cloned()
    }

    /// URLs of all stored objects, sorted
    pub fn urls(&self) -> Vec<String> {
        let mut urls: Vec<_> = self.lock().keys().cloned().collect();
        urls.sort();
        urls
    }

    /// Number of objects opened for reading so far
    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of objects committed so far
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map still holds consistent objects
        self.inner
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ObjectStore for MemoryStore {
    fn open_read(&self, url: &str) -> BunchResult<Box<dyn Read>> {
        let bytes = self
            .get(url)
            .ok_or_else(|| BunchError::ArtifactNotFound(url.to_string()))?;
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn open_write<'a>(&'a self, url: &str) -> BunchResult<Box<dyn BlobSink + 'a>> {
        Ok(Box::new(MemoryUpload {
            store: self.clone(),
            url: url.to_string(),
            buffer: Vec::new(),
        }))
    }

    fn exists(&self, url: &str) -> BunchResult<bool> {
        Ok(self.lock().contains_key(url))
    }
}

struct MemoryUpload {
    store: MemoryStore,
    url: String,
    buffer: Vec<u8>,
}

impl Write for MemoryUpload {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl BlobSink for MemoryUpload {
    fn finish(self: Box<Self>) -> BunchResult<()> {
        let Self { store, url, buffer } = *self;
        store.insert(url, buffer);
        store.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_is_invisible_until_finished() {
        let store = MemoryStore::new();
        let mut sink = store.open_write("https://s3.amazonaws.com/b/o").unwrap();
        sink.write_all(b"payload").unwrap();

        assert!(!store.exists("https://s3.amazonaws.com/b/o").unwrap());
        sink.finish().unwrap();
        assert!(store.exists("https://s3.amazonaws.com/b/o").unwrap());
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn dropped_sink_discards() {
        let store = MemoryStore::new();
        {
            let mut sink = store.open_write("https://s3.amazonaws.com/b/o").unwrap();
            sink.write_all(b"partial").unwrap();
        }
        assert!(store.urls().is_empty());
    }

    #[test]
    fn read_missing_is_cache_miss() {
        let store = MemoryStore::new();
        let err = store.open_read("https://s3.amazonaws.com/b/missing").err().unwrap();
        assert!(err.is_cache_miss());
        assert_eq!(store.reads(), 0);
    }

    #[test]
    fn clones_share_objects() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.insert("https://s3.amazonaws.com/b/o", b"abc".to_vec());

        let mut read = String::new();
        other
            .open_read("https://s3.amazonaws.com/b/o")
            .unwrap()
            .read_to_string(&mut read)
            .unwrap();
        assert_eq!(read, "abc");
        assert_eq!(other.reads(), 1);
    }
}
