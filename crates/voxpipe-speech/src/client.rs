//! Speech service HTTP client.
//!
//! The service exposes `POST /synthesize` (JSON text in, WAV bytes out) and
//! `POST /transcribe` (multipart audio in, JSON spans out).

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{SpeechError, SpeechResult};

/// Speech service configuration.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    /// Base URL of the speech service
    pub base_url: String,
    /// Request timeout; synthesis of long texts can be slow
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl SpeechConfig {
    /// Create config from environment variables.
    pub fn from_env() -> SpeechResult<Self> {
        let base_url = std::env::var("SPEECH_API_URL")
            .map_err(|_| SpeechError::config_error("SPEECH_API_URL not set"))?;

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(
                std::env::var("SPEECH_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            connect_timeout: Duration::from_secs(5),
        })
    }
}

/// One transcribed interval of speech.
///
/// Spans arrive earliest-first and non-overlapping, with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeechSpan {
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
}

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    spans: Vec<SpeechSpan>,
}

/// Speech service client.
#[derive(Clone)]
pub struct SpeechClient {
    http: Client,
    base_url: String,
}

impl SpeechClient {
    /// Create a new speech client.
    pub fn new(config: SpeechConfig) -> SpeechResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("voxpipe-speech/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(SpeechError::Network)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> SpeechResult<Self> {
        Self::new(SpeechConfig::from_env()?)
    }

    /// Synthesize speech for `text`, staging the WAV under `out_dir`.
    pub async fn synthesize(&self, text: &str, out_dir: &Path) -> SpeechResult<PathBuf> {
        debug!("Synthesizing {} chars of text", text.len());

        let response = self
            .http
            .post(format!("{}/synthesize", self.base_url))
            .json(&SynthesizeRequest { text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::synthesis_failed(format!(
                "speech service returned {}: {}",
                status, body
            )));
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(SpeechError::synthesis_failed(
                "speech service returned an empty body",
            ));
        }

        let path = out_dir.join(format!("speech-{}.wav", Uuid::new_v4()));
        tokio::fs::write(&path, &audio).await?;

        debug!("Staged synthesized audio at {}", path.display());
        Ok(path)
    }

    /// Transcribe a staged audio file into ordered time spans.
    pub async fn transcribe(&self, audio_path: &Path) -> SpeechResult<Vec<SpeechSpan>> {
        debug!("Transcribing {}", audio_path.display());

        let bytes = tokio::fs::read(audio_path).await?;
        let filename = audio_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio.wav")
            .to_string();

        let form = multipart::Form::new().part(
            "audio",
            multipart::Part::bytes(bytes)
                .file_name(filename)
                .mime_str("audio/wav")
                .map_err(|e| SpeechError::transcription_failed(e.to_string()))?,
        );

        let response = self
            .http
            .post(format!("{}/transcribe", self.base_url))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SpeechError::transcription_failed(format!(
                "speech service returned {}: {}",
                status, body
            )));
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::transcription_failed(e.to_string()))?;

        Ok(parsed.spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SpeechClient {
        SpeechClient::new(SpeechConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn synthesize_stages_audio_file() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"RIFFfake-wav".to_vec()))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio = client_for(&server)
            .synthesize("hello", dir.path())
            .await
            .unwrap();

        assert!(audio.starts_with(dir.path()));
        assert_eq!(std::fs::read(&audio).unwrap(), b"RIFFfake-wav");
    }

    #[tokio::test]
    async fn synthesize_failure_surfaces_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/synthesize"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = client_for(&server)
            .synthesize("hello", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, SpeechError::SynthesisFailed(_)));
    }

    #[tokio::test]
    async fn transcribe_parses_ordered_spans() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/transcribe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "spans": [
                    {"start": 0.0, "end": 1.5},
                    {"start": 2.0, "end": 3.25}
                ]
            })))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let audio = dir.path().join("voice.wav");
        std::fs::write(&audio, b"RIFFfake-wav").unwrap();

        let spans = client_for(&server).transcribe(&audio).await.unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0], SpeechSpan { start: 0.0, end: 1.5 });
        assert!(spans.windows(2).all(|w| w[0].end <= w[1].start));
    }
}
