//! Webhook ingress API server.
//!
//! Accepts action requests over HTTP, validates them, and enqueues task
//! descriptors for the worker. The handler never blocks on pipeline
//! completion; a 202 means "accepted", not "done".

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
