//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Failure of one pipeline step.
///
/// Pipelines short-circuit on the first failure; earlier side effects are
/// kept (at-least-once semantics, a retried task may re-synthesize and
/// re-upload).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Record fetch failed: {0}")]
    UpstreamFetchFailed(anyhow::Error),

    #[error("Speech synthesis failed: {0}")]
    SynthesisFailed(anyhow::Error),

    #[error("Download failed: {0}")]
    DownloadFailed(anyhow::Error),

    #[error("Transcription failed: {0}")]
    TranscriptionFailed(anyhow::Error),

    #[error("Merge failed: {0}")]
    MergeFailed(anyhow::Error),

    #[error("Upload failed: {0}")]
    UploadFailed(anyhow::Error),

    #[error("Record update failed: {0}")]
    UpdateFailed(anyhow::Error),

    #[error("Staging failed: {0}")]
    Staging(#[from] std::io::Error),
}

impl PipelineError {
    /// Step name for logs.
    pub fn step(&self) -> &'static str {
        match self {
            PipelineError::UpstreamFetchFailed(_) => "fetch",
            PipelineError::SynthesisFailed(_) => "synthesize",
            PipelineError::DownloadFailed(_) => "download",
            PipelineError::TranscriptionFailed(_) => "transcribe",
            PipelineError::MergeFailed(_) => "merge",
            PipelineError::UploadFailed(_) => "upload",
            PipelineError::UpdateFailed(_) => "update",
            PipelineError::Staging(_) => "staging",
        }
    }
}

/// Worker process errors.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Queue error: {0}")]
    Queue(#[from] voxpipe_queue::QueueError),

    #[error("Record store error: {0}")]
    Records(#[from] voxpipe_records::RecordStoreError),

    #[error("Storage error: {0}")]
    Storage(#[from] voxpipe_storage::StorageError),

    #[error("Speech error: {0}")]
    Speech(#[from] voxpipe_speech::SpeechError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
