//! Application state.

use std::sync::Arc;

use voxpipe_queue::{TaskQueue, TaskSink};

use crate::config::ApiConfig;

/// Shared application state.
///
/// The queue sink is the only resource the ingress handler touches; it is
/// created once per process and shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub queue: Arc<dyn TaskSink>,
}

impl AppState {
    /// Create application state with the process-owned Redis queue.
    pub fn new(config: ApiConfig) -> Result<Self, voxpipe_queue::QueueError> {
        let queue = TaskQueue::from_env()?;
        Ok(Self {
            config,
            queue: Arc::new(queue),
        })
    }

    /// Create application state with an injected sink (used by tests).
    pub fn with_sink(config: ApiConfig, queue: Arc<dyn TaskSink>) -> Self {
        Self { config, queue }
    }
}
