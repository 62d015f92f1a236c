//! Redis list task queue.
//!
//! This crate provides:
//! - Task enqueueing onto a Redis list (FIFO)
//! - Blocking dequeue with a timeout for the worker poll loop
//! - `TaskSink`/`TaskSource` traits so producers and consumers can be
//!   exercised without Redis

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{QueueConfig, TaskQueue, TaskSink, TaskSource};
