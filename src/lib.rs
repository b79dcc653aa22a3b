//! A command-line chat client for locally hosted language models.
//!
//! The library half holds everything but the terminal loop: the streaming client for
//! Ollama-compatible endpoints, the per-model client registry, token estimation, and the chat
//! session with its commands and autonomous mode.

pub mod chat;
pub mod client;
pub mod error;
pub mod ndjson;
pub mod observability;
pub mod registry;
pub mod render;
pub mod tokens;
pub mod types;
pub mod utils;

// Re-exports
pub use client::{ChatBackend, FragmentStream, Ollama};
pub use error::{Error, Result};
pub use observability::{emit_biometrics, register_biometrics};
pub use registry::{ChatClientRegistry, ClientFactory, OllamaFactory};
pub use tokens::{BpeEstimator, Encoding, EstimatorRegistry, TokenEstimator};
pub use types::*;
