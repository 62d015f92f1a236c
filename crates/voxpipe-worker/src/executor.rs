//! Worker poll loop.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use voxpipe_models::TaskDescriptor;
use voxpipe_queue::TaskSource;

use crate::config::WorkerConfig;
use crate::context::PipelineContext;
use crate::error::WorkerResult;
use crate::pipeline::run_task;

/// Single-consumer loop: poll the queue, decode, execute.
///
/// One task is in flight at a time; pipeline steps run synchronously from
/// the loop's perspective. Shutdown is observed only between tasks, so an
/// in-flight pipeline always drains before the loop exits.
pub struct WorkerLoop {
    source: Arc<dyn TaskSource>,
    ctx: Arc<PipelineContext>,
    config: WorkerConfig,
    shutdown: watch::Sender<bool>,
}

impl WorkerLoop {
    /// Create a new worker loop.
    pub fn new(source: Arc<dyn TaskSource>, ctx: Arc<PipelineContext>, config: WorkerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            source,
            ctx,
            config,
            shutdown,
        }
    }

    /// Signal shutdown. The current task, if any, still finishes.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Run until shutdown.
    pub async fn run(&self) -> WorkerResult<()> {
        let shutdown_rx = self.shutdown.subscribe();

        info!(
            "Worker loop started, poll timeout {:?}",
            self.config.poll_timeout
        );

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // The poll is never raced against shutdown: BLPOP removes the
            // task server-side the moment it is served, so cancelling an
            // in-flight dequeue would lose that delivery. The shutdown flag
            // is re-checked between polls, bounding shutdown latency to one
            // poll timeout.
            match self.source.dequeue(self.config.poll_timeout).await {
                // Empty queue after the timeout is the idle case, not an
                // error; poll again.
                Ok(None) => {}
                Ok(Some(raw)) => self.dispatch(&raw).await,
                Err(e) => {
                    error!("Queue poll failed: {}", e);
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }
        }

        info!("Worker loop stopped");
        Ok(())
    }

    /// Decode one raw payload and run its pipeline.
    ///
    /// Malformed payloads are dropped, not requeued; requeueing would spin
    /// on the same poison task forever.
    pub async fn dispatch(&self, raw: &str) {
        let task = match TaskDescriptor::decode(raw) {
            Ok(task) => task,
            Err(e) => {
                warn!(payload = raw, "Dropping malformed task: {}", e);
                return;
            }
        };

        info!(record_id = %task.record_id, pipeline = %task.kind, "Executing task");

        match run_task(&self.ctx, &task).await {
            Ok(()) => {
                info!(record_id = %task.record_id, pipeline = %task.kind, "Task completed");
            }
            Err(e) => {
                // Pipeline failures are terminal for this delivery; the
                // original HTTP caller is long gone, so the log line is the
                // only place this surfaces.
                error!(
                    record_id = %task.record_id,
                    pipeline = %task.kind,
                    step = e.step(),
                    "Task failed: {}", e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    use voxpipe_api::{create_router, ApiConfig, AppState};
    use voxpipe_models::{fields, RecordFields};
    use voxpipe_queue::{QueueResult, TaskSink, TaskSource};

    use super::*;
    use crate::pipeline::tests::{context_with, StubHub};

    /// In-memory FIFO queue implementing both ends of the queue contract.
    #[derive(Default)]
    struct MemoryQueue {
        items: Mutex<VecDeque<String>>,
    }

    #[async_trait]
    impl TaskSink for MemoryQueue {
        async fn enqueue(&self, payload: &str) -> QueueResult<()> {
            self.items.lock().unwrap().push_back(payload.to_string());
            Ok(())
        }
    }

    #[async_trait]
    impl TaskSource for MemoryQueue {
        async fn dequeue(&self, timeout: Duration) -> QueueResult<Option<String>> {
            if let Some(item) = self.items.lock().unwrap().pop_front() {
                return Ok(Some(item));
            }
            // Emulate BLPOP: wait out the timeout on an empty queue.
            tokio::time::sleep(timeout).await;
            Ok(self.items.lock().unwrap().pop_front())
        }
    }

    /// Delivers like [`MemoryQueue`] but holds the popped task in transit
    /// for a while, like a BLPOP response still on the wire.
    struct SlowSource {
        inner: Arc<MemoryQueue>,
        delay: Duration,
    }

    #[async_trait]
    impl TaskSource for SlowSource {
        async fn dequeue(&self, timeout: Duration) -> QueueResult<Option<String>> {
            let item = self.inner.dequeue(timeout).await?;
            if item.is_some() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(item)
        }
    }

    fn test_config() -> WorkerConfig {
        WorkerConfig {
            poll_timeout: Duration::from_millis(50),
            ..WorkerConfig::default()
        }
    }

    fn worker_with(hub: &Arc<StubHub>, source: Arc<dyn TaskSource>) -> WorkerLoop {
        WorkerLoop::new(source, Arc::new(context_with(hub)), test_config())
    }

    #[tokio::test]
    async fn malformed_task_is_dropped_without_executing() {
        let hub = StubHub::with_record(RecordFields::new());
        let worker = worker_with(&hub, Arc::new(MemoryQueue::default()));

        worker.dispatch("no delimiter here").await;
        worker.dispatch("unknownKind:rec123").await;
        worker.dispatch("generateAudioVideo:").await;

        assert!(hub.call_names().is_empty());
    }

    #[tokio::test]
    async fn webhook_to_pipeline_end_to_end() {
        // Ingress and worker share one in-memory queue; the encoded task
        // must flow through it and drive the collaborators in order.
        let queue = Arc::new(MemoryQueue::default());

        let state = AppState::with_sink(ApiConfig::default(), Arc::clone(&queue) as _);
        let app = create_router(state);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"action":"generateAudioVideo","recordId":"rec123"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(queue.items.lock().unwrap().len(), 1);

        let mut record = RecordFields::new();
        record.set(fields::TEXT, "hello");
        let hub = StubHub::with_record(record);
        let worker = worker_with(&hub, Arc::clone(&queue) as _);

        let raw = queue
            .dequeue(Duration::from_secs(1))
            .await
            .unwrap()
            .expect("task should be queued");
        worker.dispatch(&raw).await;

        assert_eq!(hub.call_names(), ["fetch", "synthesize", "upload", "update"]);
        assert_eq!(hub.recorded_updates()[0].0, "rec123");
        assert_eq!(hub.recorded_updates()[0].1, "audioUrl");
    }

    #[tokio::test]
    async fn shutdown_waits_for_in_flight_dequeue() {
        // A task popped by BLPOP is already gone from the list; shutdown
        // arriving while the response is in transit must not cancel the
        // poll, or that delivery is lost forever.
        let queue = Arc::new(MemoryQueue::default());
        queue
            .enqueue("generateAudioVideo:rec123")
            .await
            .unwrap();
        let source = Arc::new(SlowSource {
            inner: Arc::clone(&queue),
            delay: Duration::from_millis(200),
        });

        let mut record = RecordFields::new();
        record.set(fields::TEXT, "hello");
        let hub = StubHub::with_record(record);
        let worker = Arc::new(worker_with(&hub, source as _));

        let runner = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move { worker.run().await })
        };

        // Let the loop pop the task, then fire shutdown mid-flight.
        tokio::time::sleep(Duration::from_millis(50)).await;
        worker.shutdown();

        tokio::time::timeout(Duration::from_secs(2), runner)
            .await
            .expect("loop should stop after shutdown")
            .unwrap()
            .unwrap();

        assert_eq!(hub.call_names(), ["fetch", "synthesize", "upload", "update"]);
        assert_eq!(hub.recorded_updates().len(), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_idle_loop() {
        let hub = StubHub::with_record(RecordFields::new());
        let worker = Arc::new(worker_with(&hub, Arc::new(MemoryQueue::default())));

        let runner = {
            let worker = Arc::clone(&worker);
            tokio::spawn(async move { worker.run().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        worker.shutdown();

        tokio::time::timeout(Duration::from_secs(1), runner)
            .await
            .expect("loop should stop after shutdown")
            .unwrap()
            .unwrap();
    }
}
