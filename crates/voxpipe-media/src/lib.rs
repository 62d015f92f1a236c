//! FFmpeg CLI wrapper and media download.
//!
//! This crate provides:
//! - An FFmpeg command builder and runner
//! - The audio/video merge operation (copy video, attach audio)
//! - HTTP download of remote media to staged local files

pub mod command;
pub mod download;
pub mod error;
pub mod merge;

pub use command::FfmpegCommand;
pub use download::download_to_dir;
pub use error::{MediaError, MediaResult};
pub use merge::merge_audio_video;
