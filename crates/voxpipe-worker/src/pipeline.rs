//! Pipeline execution.
//!
//! Maps a task descriptor to an ordered sequence of collaborator calls and
//! short-circuits on the first failure. No step retries; retries happen at
//! the task level, outside this module.

use tracing::{info, warn};

use voxpipe_models::{fields, TaskDescriptor, TaskKind};

use crate::context::PipelineContext;
use crate::error::PipelineError;

/// Run the pipeline selected by `task`.
pub async fn run_task(ctx: &PipelineContext, task: &TaskDescriptor) -> Result<(), PipelineError> {
    match task.kind {
        TaskKind::GenerateAudioVideo => run_generate(ctx, &task.record_id).await,
        TaskKind::MergeAudioVideo => run_merge(ctx, &task.record_id).await,
    }
}

/// Synthesize speech for a record's text and attach the audio URL.
pub async fn run_generate(ctx: &PipelineContext, record_id: &str) -> Result<(), PipelineError> {
    let run_dir = ctx.create_run_dir()?;

    let record = ctx
        .records
        .fetch(record_id)
        .await
        .map_err(PipelineError::UpstreamFetchFailed)?;
    info!(record_id, step = "fetch", "Record fetched");

    // A record without text still produces (silent) audio; kept for
    // compatibility with the upstream automation that feeds these records.
    let text = record.get_or_empty(fields::TEXT);
    if text.is_empty() {
        warn!(record_id, "Record has no text, synthesizing empty input");
    }

    let audio_path = ctx
        .synthesizer
        .synthesize(text, run_dir.path())
        .await
        .map_err(PipelineError::SynthesisFailed)?;
    info!(record_id, step = "synthesize", path = %audio_path.display(), "Speech synthesized");

    let audio_url = ctx
        .storage
        .upload(&audio_path)
        .await
        .map_err(PipelineError::UploadFailed)?;
    info!(record_id, step = "upload", url = %audio_url, "Audio uploaded");

    ctx.records
        .update(record_id, fields::AUDIO_URL, &audio_url)
        .await
        .map_err(PipelineError::UpdateFailed)?;
    info!(record_id, step = "update", field = fields::AUDIO_URL, "Record updated");

    Ok(())
}

/// Merge a record's audio and video into a final asset.
pub async fn run_merge(ctx: &PipelineContext, record_id: &str) -> Result<(), PipelineError> {
    let run_dir = ctx.create_run_dir()?;

    let record = ctx
        .records
        .fetch(record_id)
        .await
        .map_err(PipelineError::UpstreamFetchFailed)?;
    info!(record_id, step = "fetch", "Record fetched");

    let audio_url = record.get_or_empty(fields::AUDIO_URL);
    let video_url = record.get_or_empty(fields::VIDEO_URL);
    if audio_url.is_empty() || video_url.is_empty() {
        warn!(record_id, "Record is missing audioUrl or videoUrl, download will fail");
    }

    let audio_path = ctx
        .downloader
        .download(audio_url, run_dir.path(), "audio.wav")
        .await
        .map_err(PipelineError::DownloadFailed)?;
    let video_path = ctx
        .downloader
        .download(video_url, run_dir.path(), "video.mp4")
        .await
        .map_err(PipelineError::DownloadFailed)?;
    info!(record_id, step = "download", "Assets staged");

    // Diagnostic only, but the merge must not proceed past a transcription
    // failure; downstream tooling relies on this ordering.
    let spans = ctx
        .transcriber
        .transcribe(&audio_path)
        .await
        .map_err(PipelineError::TranscriptionFailed)?;
    info!(record_id, step = "transcribe", spans = spans.len(), "Audio transcribed");

    let merged_path = ctx
        .merger
        .merge(&audio_path, &video_path, run_dir.path())
        .await
        .map_err(PipelineError::MergeFailed)?;
    info!(record_id, step = "merge", path = %merged_path.display(), "Streams merged");

    let final_url = ctx
        .storage
        .upload(&merged_path)
        .await
        .map_err(PipelineError::UploadFailed)?;
    info!(record_id, step = "upload", url = %final_url, "Merged video uploaded");

    ctx.records
        .update(record_id, fields::FINAL_URL, &final_url)
        .await
        .map_err(PipelineError::UpdateFailed)?;
    info!(record_id, step = "update", field = fields::FINAL_URL, "Record updated");

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use anyhow::{bail, Result};
    use async_trait::async_trait;

    use voxpipe_models::{RecordFields, TaskKind};
    use voxpipe_speech::SpeechSpan;

    use super::*;
    use crate::collaborators::{
        Downloader, FileStorage, MediaMerger, RecordStore, SpeechSynthesizer, Transcriber,
    };

    /// One stub standing in for every collaborator, recording call order.
    pub(crate) struct StubHub {
        pub record: RecordFields,
        pub fail_step: Option<&'static str>,
        pub calls: Mutex<Vec<String>>,
        pub updates: Mutex<Vec<(String, String, String)>>,
    }

    impl StubHub {
        pub fn with_record(record: RecordFields) -> Arc<Self> {
            Arc::new(Self {
                record,
                fail_step: None,
                calls: Mutex::new(Vec::new()),
                updates: Mutex::new(Vec::new()),
            })
        }

        pub fn failing_at(record: RecordFields, step: &'static str) -> Arc<Self> {
            Arc::new(Self {
                record,
                fail_step: Some(step),
                calls: Mutex::new(Vec::new()),
                updates: Mutex::new(Vec::new()),
            })
        }

        fn call(&self, name: &str) -> Result<()> {
            self.calls.lock().unwrap().push(name.to_string());
            if self.fail_step == Some(name) {
                bail!("{} stubbed to fail", name);
            }
            Ok(())
        }

        pub fn call_names(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn recorded_updates(&self) -> Vec<(String, String, String)> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecordStore for StubHub {
        async fn fetch(&self, _record_id: &str) -> Result<RecordFields> {
            self.call("fetch")?;
            Ok(self.record.clone())
        }

        async fn update(&self, record_id: &str, field: &str, value: &str) -> Result<()> {
            self.call("update")?;
            self.updates.lock().unwrap().push((
                record_id.to_string(),
                field.to_string(),
                value.to_string(),
            ));
            Ok(())
        }
    }

    #[async_trait]
    impl FileStorage for StubHub {
        async fn upload(&self, _path: &Path) -> Result<String> {
            self.call("upload")?;
            Ok("https://cdn.example/U".to_string())
        }
    }

    #[async_trait]
    impl SpeechSynthesizer for StubHub {
        async fn synthesize(&self, _text: &str, out_dir: &Path) -> Result<PathBuf> {
            self.call("synthesize")?;
            Ok(out_dir.join("speech.wav"))
        }
    }

    #[async_trait]
    impl Transcriber for StubHub {
        async fn transcribe(&self, _audio_path: &Path) -> Result<Vec<SpeechSpan>> {
            self.call("transcribe")?;
            Ok(vec![SpeechSpan { start: 0.0, end: 1.0 }])
        }
    }

    #[async_trait]
    impl MediaMerger for StubHub {
        async fn merge(
            &self,
            _audio_path: &Path,
            _video_path: &Path,
            out_dir: &Path,
        ) -> Result<PathBuf> {
            self.call("merge")?;
            Ok(out_dir.join("merged.mp4"))
        }
    }

    #[async_trait]
    impl Downloader for StubHub {
        async fn download(
            &self,
            _url: &str,
            out_dir: &Path,
            fallback_name: &str,
        ) -> Result<PathBuf> {
            self.call("download")?;
            Ok(out_dir.join(fallback_name))
        }
    }

    pub(crate) fn context_with(hub: &Arc<StubHub>) -> PipelineContext {
        PipelineContext {
            records: Arc::clone(hub) as _,
            storage: Arc::clone(hub) as _,
            synthesizer: Arc::clone(hub) as _,
            transcriber: Arc::clone(hub) as _,
            merger: Arc::clone(hub) as _,
            downloader: Arc::clone(hub) as _,
            work_dir: std::env::temp_dir().join("voxpipe-test"),
        }
    }

    fn generate_record() -> RecordFields {
        let mut record = RecordFields::new();
        record.set(fields::TEXT, "hello");
        record
    }

    fn merge_record() -> RecordFields {
        let mut record = RecordFields::new();
        record.set(fields::AUDIO_URL, "https://cdn.example/a.wav");
        record.set(fields::VIDEO_URL, "https://cdn.example/v.mp4");
        record
    }

    #[tokio::test]
    async fn generate_updates_audio_url_exactly_once() {
        let hub = StubHub::with_record(generate_record());
        let ctx = context_with(&hub);

        run_generate(&ctx, "rec123").await.unwrap();

        assert_eq!(hub.call_names(), ["fetch", "synthesize", "upload", "update"]);
        assert_eq!(
            hub.recorded_updates(),
            vec![(
                "rec123".to_string(),
                "audioUrl".to_string(),
                "https://cdn.example/U".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn generate_proceeds_with_missing_text() {
        let hub = StubHub::with_record(RecordFields::new());
        let ctx = context_with(&hub);

        run_generate(&ctx, "rec123").await.unwrap();

        assert_eq!(hub.recorded_updates().len(), 1);
    }

    #[tokio::test]
    async fn generate_stops_at_failed_synthesis() {
        let hub = StubHub::failing_at(generate_record(), "synthesize");
        let ctx = context_with(&hub);

        let err = run_generate(&ctx, "rec123").await.unwrap_err();

        assert!(matches!(err, PipelineError::SynthesisFailed(_)));
        assert_eq!(hub.call_names(), ["fetch", "synthesize"]);
        assert!(hub.recorded_updates().is_empty());
    }

    #[tokio::test]
    async fn merge_updates_final_url_exactly_once() {
        let hub = StubHub::with_record(merge_record());
        let ctx = context_with(&hub);

        run_merge(&ctx, "rec456").await.unwrap();

        assert_eq!(
            hub.call_names(),
            ["fetch", "download", "download", "transcribe", "merge", "upload", "update"]
        );
        assert_eq!(
            hub.recorded_updates(),
            vec![(
                "rec456".to_string(),
                "finalUrl".to_string(),
                "https://cdn.example/U".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn merge_failure_skips_upload_and_update() {
        let hub = StubHub::failing_at(merge_record(), "merge");
        let ctx = context_with(&hub);

        let err = run_merge(&ctx, "rec456").await.unwrap_err();

        assert!(matches!(err, PipelineError::MergeFailed(_)));
        assert!(!hub.call_names().contains(&"upload".to_string()));
        assert!(hub.recorded_updates().is_empty());
    }

    #[tokio::test]
    async fn transcription_failure_stops_before_merge() {
        let hub = StubHub::failing_at(merge_record(), "transcribe");
        let ctx = context_with(&hub);

        let err = run_merge(&ctx, "rec456").await.unwrap_err();

        assert!(matches!(err, PipelineError::TranscriptionFailed(_)));
        assert!(!hub.call_names().contains(&"merge".to_string()));
    }

    #[tokio::test]
    async fn duplicate_delivery_reruns_cleanly() {
        // At-least-once delivery: the executor keeps no state that would
        // block a second run of the same descriptor.
        let hub = StubHub::with_record(generate_record());
        let ctx = context_with(&hub);
        let task = TaskDescriptor::new(TaskKind::GenerateAudioVideo, "rec123");

        run_task(&ctx, &task).await.unwrap();
        run_task(&ctx, &task).await.unwrap();

        assert_eq!(hub.recorded_updates().len(), 2);
    }
}
