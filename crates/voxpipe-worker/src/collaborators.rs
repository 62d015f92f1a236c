//! Narrow collaborator interfaces and their production implementations.
//!
//! Each external system the pipelines touch is one trait with the smallest
//! surface the pipelines need. Pipeline logic only sees these traits; the
//! concrete clients are wired in by [`crate::context::PipelineContext`].

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;

use voxpipe_media::{download_to_dir, merge_audio_video};
use voxpipe_models::RecordFields;
use voxpipe_records::RecordStoreClient;
use voxpipe_speech::{SpeechClient, SpeechSpan};
use voxpipe_storage::ObjectStorageClient;

/// External record store (fields by name, string values).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch a record's fields.
    async fn fetch(&self, record_id: &str) -> Result<RecordFields>;

    /// Set one field on a record.
    async fn update(&self, record_id: &str, field: &str, value: &str) -> Result<()>;
}

/// File storage producing shareable URLs.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Upload a staged file; returns its public URL.
    async fn upload(&self, path: &Path) -> Result<String>;
}

/// Text to staged audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, out_dir: &Path) -> Result<PathBuf>;
}

/// Staged audio file to ordered time spans.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<SpeechSpan>>;
}

/// Merge staged audio and video into one staged output.
#[async_trait]
pub trait MediaMerger: Send + Sync {
    async fn merge(&self, audio_path: &Path, video_path: &Path, out_dir: &Path)
        -> Result<PathBuf>;
}

/// Remote URL to staged local file.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str, out_dir: &Path, fallback_name: &str) -> Result<PathBuf>;
}

#[async_trait]
impl RecordStore for RecordStoreClient {
    async fn fetch(&self, record_id: &str) -> Result<RecordFields> {
        Ok(self.get_record(record_id).await?)
    }

    async fn update(&self, record_id: &str, field: &str, value: &str) -> Result<()> {
        Ok(self.set_field(record_id, field, value).await?)
    }
}

#[async_trait]
impl FileStorage for ObjectStorageClient {
    async fn upload(&self, path: &Path) -> Result<String> {
        Ok(self.upload_media(path).await?)
    }
}

#[async_trait]
impl SpeechSynthesizer for SpeechClient {
    async fn synthesize(&self, text: &str, out_dir: &Path) -> Result<PathBuf> {
        Ok(SpeechClient::synthesize(self, text, out_dir).await?)
    }
}

#[async_trait]
impl Transcriber for SpeechClient {
    async fn transcribe(&self, audio_path: &Path) -> Result<Vec<SpeechSpan>> {
        Ok(SpeechClient::transcribe(self, audio_path).await?)
    }
}

/// FFmpeg-backed merger.
#[derive(Debug, Clone, Default)]
pub struct FfmpegMerger;

#[async_trait]
impl MediaMerger for FfmpegMerger {
    async fn merge(
        &self,
        audio_path: &Path,
        video_path: &Path,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        Ok(merge_audio_video(audio_path, video_path, out_dir).await?)
    }
}

/// Plain HTTP downloader.
#[derive(Debug, Clone, Default)]
pub struct HttpDownloader;

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str, out_dir: &Path, fallback_name: &str) -> Result<PathBuf> {
        Ok(download_to_dir(url, out_dir, fallback_name).await?)
    }
}
