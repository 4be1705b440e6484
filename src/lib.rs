//! Bunch - content-addressed dependency bundle cache
//!
//! Fingerprints a lockfile, names a remote tar.gz after the fingerprint and
//! moves it between a local bundle directory and an S3-compatible bucket.

pub mod archive;
pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod store;
pub mod transfer;
pub mod ui;

pub use error::{BunchError, BunchResult};
