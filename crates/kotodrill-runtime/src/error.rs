//! Sidecar transport errors.

use thiserror::Error;

use kotodrill_core::RuntimeError;

/// Errors that can occur while talking to a `llama-server` process.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The server could not be reached at all.
    #[error("llama-server not reachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("llama-server error (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    /// The request timed out.
    #[error("request to {0} timed out")]
    Timeout(String),

    /// The event stream broke off or carried something unreadable.
    #[error("completion stream failed: {0}")]
    Stream(String),
}

impl ServerError {
    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServerError::Timeout(url.to_string())
        } else if e.is_connect() {
            ServerError::Unreachable {
                url: url.to_string(),
                message: e.to_string(),
            }
        } else {
            ServerError::Stream(e.to_string())
        }
    }
}

impl From<ServerError> for RuntimeError {
    fn from(e: ServerError) -> Self {
        RuntimeError::Inference(e.to_string())
    }
}
