//! Pipeline context: injected collaborator handles plus staging.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use voxpipe_records::RecordStoreClient;
use voxpipe_speech::SpeechClient;
use voxpipe_storage::ObjectStorageClient;

use crate::collaborators::{
    Downloader, FfmpegMerger, FileStorage, HttpDownloader, MediaMerger, RecordStore,
    SpeechSynthesizer, Transcriber,
};
use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Collaborator handles for one worker process.
///
/// Handles are created once at startup and shared across every pipeline run;
/// the pipelines themselves hold no connection state.
pub struct PipelineContext {
    pub records: Arc<dyn RecordStore>,
    pub storage: Arc<dyn FileStorage>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Arc<dyn Transcriber>,
    pub merger: Arc<dyn MediaMerger>,
    pub downloader: Arc<dyn Downloader>,
    pub work_dir: PathBuf,
}

impl PipelineContext {
    /// Wire up the production collaborators from the environment.
    pub fn new(config: &WorkerConfig) -> WorkerResult<Self> {
        let records = RecordStoreClient::from_env()?;
        let storage = ObjectStorageClient::from_env()?;
        let speech = SpeechClient::from_env()?;

        Ok(Self {
            records: Arc::new(records),
            storage: Arc::new(storage),
            synthesizer: Arc::new(speech.clone()),
            transcriber: Arc::new(speech),
            merger: Arc::new(FfmpegMerger),
            downloader: Arc::new(HttpDownloader),
            work_dir: config.work_dir.clone(),
        })
    }

    /// Create a fresh staging directory for one pipeline run.
    ///
    /// The directory is deleted when the returned guard drops, so reruns of
    /// the same task never collide on filenames.
    pub fn create_run_dir(&self) -> std::io::Result<TempDir> {
        std::fs::create_dir_all(&self.work_dir)?;
        tempfile::tempdir_in(&self.work_dir)
    }
}
