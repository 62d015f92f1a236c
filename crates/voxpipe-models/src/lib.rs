//! Shared data models for the VoxPipe backend.
//!
//! This crate provides:
//! - Task descriptors and their wire codec
//! - Record field names and the field map wrapper

pub mod record;
pub mod task;

pub use record::{fields, RecordFields};
pub use task::{MalformedTask, TaskDescriptor, TaskKind};
