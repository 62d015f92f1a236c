//! Record-store REST client.
//!
//! This crate provides:
//! - Fetching a record's fields by id
//! - Setting a single field on a record
//! - Bearer-token authentication and status-code error mapping

pub mod client;
pub mod error;

pub use client::{RecordStoreClient, RecordStoreConfig};
pub use error::{RecordStoreError, RecordStoreResult};
