//! Task queue backed by a Redis list.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::{debug, info};

use crate::error::QueueResult;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// List key tasks are pushed onto
    pub list_name: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            list_name: "voxpipe:tasks".to_string(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            list_name: std::env::var("QUEUE_LIST")
                .unwrap_or_else(|_| "voxpipe:tasks".to_string()),
        }
    }
}

/// Producer side of the queue.
///
/// `enqueue` must be safe for concurrent callers; the ingress handler holds
/// one shared sink across all requests.
#[async_trait]
pub trait TaskSink: Send + Sync {
    /// Append an encoded task to the queue.
    async fn enqueue(&self, payload: &str) -> QueueResult<()>;
}

/// Consumer side of the queue.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Pop the oldest task, blocking up to `timeout`.
    ///
    /// Returns `Ok(None)` when the queue stayed empty for the whole timeout;
    /// an empty queue is not an error.
    async fn dequeue(&self, timeout: Duration) -> QueueResult<Option<String>>;
}

/// Task queue client over a Redis list.
///
/// Tasks are appended with RPUSH and popped with BLPOP, so insertion order
/// is processing order for a single consumer. BLPOP's atomic pop is the only
/// coordination between multiple consumers. Durability of accepted tasks is
/// Redis's concern.
pub struct TaskQueue {
    client: redis::Client,
    config: QueueConfig,
}

impl TaskQueue {
    /// Create a new task queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Get queue length.
    pub async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.llen(&self.config.list_name).await?;
        Ok(len)
    }
}

#[async_trait]
impl TaskSink for TaskQueue {
    async fn enqueue(&self, payload: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        conn.rpush::<_, _, ()>(&self.config.list_name, payload)
            .await?;

        info!("Enqueued task onto {}", self.config.list_name);
        Ok(())
    }
}

#[async_trait]
impl TaskSource for TaskQueue {
    async fn dequeue(&self, timeout: Duration) -> QueueResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // BLPOP returns (list, value) or nil on timeout.
        let popped: Option<(String, String)> = conn
            .blpop(&self.config.list_name, timeout.as_secs_f64())
            .await?;

        match popped {
            Some((_, payload)) => {
                debug!("Dequeued task from {}", self.config.list_name);
                Ok(Some(payload))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = QueueConfig::default();
        assert_eq!(config.redis_url, "redis://localhost:6379");
        assert_eq!(config.list_name, "voxpipe:tasks");
    }
}
