//! Error types for the model runtime and the generation pipeline.
//!
//! Malformed model output has no error variant: the response parser absorbs
//! it by substituting a known-good question. Only infrastructure failures
//! reach the caller, and each carries the remedy text the user should see.

use std::path::PathBuf;

use thiserror::Error;

const REMEDY_DOWNLOAD_MODEL: &str =
    "download a GGUF model file and pass its path with --model or `model_path` in kotodrill.toml";
const REMEDY_REINSTALL_RUNTIME: &str =
    "reinstall llama.cpp and make sure `llama-server` for this machine's architecture is on PATH or set `runtime.server_binary`";

/// Errors raised by the model runtime handle.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// `infer` was called before `initialize` succeeded.
    #[error("model runtime is not initialized")]
    NotInitialized,

    /// The weights file is missing or could not be loaded.
    #[error(
        "failed to load model {}: {reason}; download a GGUF model file and pass its path with --model or `model_path` in kotodrill.toml",
        .path.display()
    )]
    ModelLoad { path: PathBuf, reason: String },

    /// The native runtime could not be started (missing binary, wrong architecture).
    #[error(
        "native runtime unavailable: {0}; reinstall llama.cpp and make sure `llama-server` for this machine's architecture is on PATH or set `runtime.server_binary`"
    )]
    Platform(String),

    /// The handle was used after `dispose`.
    #[error("model runtime has been disposed")]
    Disposed,

    /// The inference transport failed mid-stream.
    #[error("inference failed: {0}")]
    Inference(String),
}

impl RuntimeError {
    pub fn model_load(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        RuntimeError::ModelLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// User-facing remedy for initialization failures.
    pub fn remedy(&self) -> Option<&'static str> {
        match self {
            RuntimeError::ModelLoad { .. } => Some(REMEDY_DOWNLOAD_MODEL),
            RuntimeError::Platform(_) => Some(REMEDY_REINSTALL_RUNTIME),
            _ => None,
        }
    }

    /// Returns `true` if the handle that produced this error cannot be used again.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RuntimeError::ModelLoad { .. } | RuntimeError::Platform(_) | RuntimeError::Disposed
        )
    }
}

/// Errors surfaced by the generation service.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// `generate` was called before the service was initialized.
    #[error("generation service is not ready; initialize it with a model first")]
    NotReady,

    /// The request's cancel signal fired while text was streaming.
    #[error("generation cancelled")]
    Cancelled,

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
