//! Client for the external speech service.
//!
//! This crate provides:
//! - Speech synthesis: text in, staged audio file out
//! - Transcription: staged audio file in, ordered time spans out
//!
//! Model inference happens entirely on the far side of the HTTP boundary.

pub mod client;
pub mod error;

pub use client::{SpeechClient, SpeechConfig, SpeechSpan};
pub use error::{SpeechError, SpeechResult};
