//! Media pipeline worker.
//!
//! Dequeues task descriptors and runs the matching pipeline:
//! - `generateAudioVideo`: fetch record -> synthesize speech -> upload ->
//!   set `audioUrl`
//! - `mergeAudioVideo`: fetch record -> download assets -> transcribe ->
//!   merge -> upload -> set `finalUrl`
//!
//! Collaborators sit behind narrow traits so pipelines are testable against
//! stubs without any network dependency.

pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod pipeline;

pub use collaborators::{
    Downloader, FileStorage, MediaMerger, RecordStore, SpeechSynthesizer, Transcriber,
};
pub use config::WorkerConfig;
pub use context::PipelineContext;
pub use error::{PipelineError, WorkerError, WorkerResult};
pub use executor::WorkerLoop;
