//! S3-compatible object storage client.
//!
//! This crate provides:
//! - Uploading staged media files to a bucket
//! - Shareable public URL construction for uploaded objects

pub mod client;
pub mod error;

pub use client::{ObjectStorageClient, StorageConfig};
pub use error::{StorageError, StorageResult};
