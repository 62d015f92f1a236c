//! Task descriptors and their wire codec.
//!
//! A task is the unit of enqueued work: which pipeline to run and which
//! record it operates on. Tasks are stored in the queue as
//! `<kindToken>:<recordId>`. Kind tokens never contain `:`, so splitting on
//! the first delimiter is unambiguous even when the record id itself
//! contains one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delimiter between the kind token and the record id.
const DELIMITER: char = ':';

/// Errors produced when decoding a task payload.
///
/// A malformed task is dropped by the worker, never requeued.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedTask {
    #[error("task payload has no '{DELIMITER}' delimiter")]
    MissingDelimiter,

    #[error("unknown task kind: {0}")]
    UnknownKind(String),

    #[error("task payload has an empty record id")]
    EmptyRecordId,
}

/// The pipeline a task selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    /// Synthesize speech for a record's text and attach the audio URL.
    GenerateAudioVideo,
    /// Merge a record's audio and video into a final asset.
    MergeAudioVideo,
}

impl TaskKind {
    /// Wire token for this kind, also the `action` value accepted by the
    /// webhook.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::GenerateAudioVideo => "generateAudioVideo",
            TaskKind::MergeAudioVideo => "mergeAudioVideo",
        }
    }

    /// Parse a wire token or webhook action.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "generateAudioVideo" => Some(TaskKind::GenerateAudioVideo),
            "mergeAudioVideo" => Some(TaskKind::MergeAudioVideo),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of enqueued work. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// Which pipeline to run.
    pub kind: TaskKind,
    /// Opaque record id in the external record store.
    pub record_id: String,
}

impl TaskDescriptor {
    /// Create a new descriptor.
    pub fn new(kind: TaskKind, record_id: impl Into<String>) -> Self {
        Self {
            kind,
            record_id: record_id.into(),
        }
    }

    /// Encode into the queue wire format.
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.kind.as_str(), DELIMITER, self.record_id)
    }

    /// Decode from the queue wire format.
    ///
    /// The record id is trimmed; a payload whose id is empty after trimming
    /// is malformed.
    pub fn decode(payload: &str) -> Result<Self, MalformedTask> {
        let (token, rest) = payload
            .split_once(DELIMITER)
            .ok_or(MalformedTask::MissingDelimiter)?;

        let kind = TaskKind::parse(token)
            .ok_or_else(|| MalformedTask::UnknownKind(token.to_string()))?;

        let record_id = rest.trim();
        if record_id.is_empty() {
            return Err(MalformedTask::EmptyRecordId);
        }

        Ok(Self {
            kind,
            record_id: record_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_kind() {
        for kind in [TaskKind::GenerateAudioVideo, TaskKind::MergeAudioVideo] {
            let task = TaskDescriptor::new(kind, "rec123");
            assert_eq!(TaskDescriptor::decode(&task.encode()).unwrap(), task);
        }
    }

    #[test]
    fn round_trips_record_id_containing_delimiter() {
        let task = TaskDescriptor::new(TaskKind::MergeAudioVideo, "rec:with:colons");
        assert_eq!(TaskDescriptor::decode(&task.encode()).unwrap(), task);
    }

    #[test]
    fn rejects_payload_without_delimiter() {
        assert_eq!(
            TaskDescriptor::decode("generateAudioVideo"),
            Err(MalformedTask::MissingDelimiter)
        );
    }

    #[test]
    fn rejects_unknown_kind_token() {
        assert_eq!(
            TaskDescriptor::decode("transcodeAudio:rec123"),
            Err(MalformedTask::UnknownKind("transcodeAudio".to_string()))
        );
    }

    #[test]
    fn rejects_empty_record_id() {
        assert_eq!(
            TaskDescriptor::decode("mergeAudioVideo:"),
            Err(MalformedTask::EmptyRecordId)
        );
        assert_eq!(
            TaskDescriptor::decode("mergeAudioVideo:   "),
            Err(MalformedTask::EmptyRecordId)
        );
    }

    #[test]
    fn decode_trims_record_id() {
        let task = TaskDescriptor::decode("generateAudioVideo: rec123 ").unwrap();
        assert_eq!(task.record_id, "rec123");
    }

    #[test]
    fn parses_webhook_actions() {
        assert_eq!(
            TaskKind::parse("generateAudioVideo"),
            Some(TaskKind::GenerateAudioVideo)
        );
        assert_eq!(
            TaskKind::parse("mergeAudioVideo"),
            Some(TaskKind::MergeAudioVideo)
        );
        assert_eq!(TaskKind::parse("deleteRecord"), None);
    }
}
