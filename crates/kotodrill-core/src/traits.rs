//! Core trait definitions for local model runtimes.
//!
//! These async traits are implemented by the `kotodrill-runtime` crate.
//! `ModelRuntime` in [`crate::runtime`] owns whichever implementation the
//! caller picks.

use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::Notify;

use crate::error::RuntimeError;

// ---------------------------------------------------------------------------
// Streaming
// ---------------------------------------------------------------------------

/// A finite, non-restartable stream of generated text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, RuntimeError>> + Send>>;

/// Cooperative cancellation flag shared between a caller and an inference.
///
/// Clones observe the same flag. Cancelling never touches model state; the
/// consumer stops pulling fragments, and anyone awaiting
/// [`cancelled`](Self::cancelled) wakes up even if no fragment is in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    state: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.state.flag.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.flag.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called on any clone.
    pub async fn cancelled(&self) {
        let notified = self.state.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent cancel is not missed.
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// A single bounded completion request.
#[derive(Debug, Clone)]
pub struct InferRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Maximum tokens the model may produce.
    pub max_tokens: u32,
    /// Generation stops as soon as any of these appears.
    pub stop_sequences: Vec<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Checked between fragments.
    pub cancel: CancelSignal,
}

// ---------------------------------------------------------------------------
// Runtime traits
// ---------------------------------------------------------------------------

/// Loads model weights and produces a ready inference context.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    /// Human-readable backend name (e.g. "llama-server").
    fn name(&self) -> &str;

    /// Load the weights at `model_path`. Expensive; called at most once per handle.
    async fn load(&self, model_path: &Path) -> Result<Box<dyn LoadedModel>, RuntimeError>;
}

/// Loaded weights plus an inference context.
#[async_trait]
pub trait LoadedModel: Send + Sync {
    /// Start a completion. Stop sequences, the token budget, and the cancel
    /// signal all end the stream.
    fn infer(&self, request: &InferRequest) -> TextStream;

    /// Release the context and the weights.
    async fn shutdown(&mut self);
}
