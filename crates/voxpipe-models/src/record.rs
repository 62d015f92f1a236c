//! Record fields as seen through the record-store collaborator.
//!
//! The record store owns the schema; this side only assumes
//! "named field -> string value".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Field names the pipelines read and write.
pub mod fields {
    /// Source text for speech synthesis.
    pub const TEXT: &str = "text";
    /// Public URL of the synthesized audio.
    pub const AUDIO_URL: &str = "audioUrl";
    /// Public URL of the source video.
    pub const VIDEO_URL: &str = "videoUrl";
    /// Public URL of the merged output.
    pub const FINAL_URL: &str = "finalUrl";
}

/// A record's fields, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordFields(HashMap<String, String>);

impl RecordFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a field value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Look up a field value, falling back to the empty string.
    ///
    /// The pipelines deliberately proceed with missing fields instead of
    /// failing fast; callers log when the fallback fires.
    pub fn get_or_empty(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    /// Set a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<(String, String)> for RecordFields {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<HashMap<String, String>> for RecordFields {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}
