//! The model runtime handle.
//!
//! `ModelRuntime` owns a loader and, once initialized, the loaded model. It is
//! an ordinary owned value: whoever constructs it passes it (or the
//! [`GenerationService`](crate::service::GenerationService) wrapping it) to
//! the code that needs it. State only ever moves forward:
//! Uninitialized → Ready → Disposed.

use std::path::Path;

use crate::error::RuntimeError;
use crate::traits::{InferRequest, LoadedModel, ModelLoader, TextStream};

/// Observable lifecycle state of a [`ModelRuntime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    Uninitialized,
    Ready,
    Disposed,
}

enum Slot {
    Empty,
    Loaded(Box<dyn LoadedModel>),
    Disposed,
}

/// Exclusive owner of one loaded model.
pub struct ModelRuntime {
    loader: Box<dyn ModelLoader>,
    slot: Slot,
}

impl ModelRuntime {
    pub fn new(loader: Box<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slot: Slot::Empty,
        }
    }

    pub fn state(&self) -> RuntimeState {
        match self.slot {
            Slot::Empty => RuntimeState::Uninitialized,
            Slot::Loaded(_) => RuntimeState::Ready,
            Slot::Disposed => RuntimeState::Disposed,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state() == RuntimeState::Ready
    }

    /// Name of the backend doing the loading.
    pub fn backend(&self) -> &str {
        self.loader.name()
    }

    /// Load the model at `model_path`.
    ///
    /// A second call while Ready returns immediately without reloading.
    pub async fn initialize(&mut self, model_path: &Path) -> Result<(), RuntimeError> {
        match self.slot {
            Slot::Loaded(_) => {
                tracing::debug!("model already loaded, skipping initialize");
                return Ok(());
            }
            Slot::Disposed => return Err(RuntimeError::Disposed),
            Slot::Empty => {}
        }

        if !model_path.is_file() {
            return Err(RuntimeError::model_load(
                model_path,
                "model file not found",
            ));
        }

        tracing::info!(
            backend = self.loader.name(),
            path = %model_path.display(),
            "loading model"
        );
        let model = self.loader.load(model_path).await?;
        self.slot = Slot::Loaded(model);
        tracing::info!("model ready");
        Ok(())
    }

    /// Start a bounded completion on the loaded model.
    pub fn infer(&self, request: &InferRequest) -> Result<TextStream, RuntimeError> {
        match &self.slot {
            Slot::Loaded(model) => Ok(model.infer(request)),
            Slot::Empty => Err(RuntimeError::NotInitialized),
            Slot::Disposed => Err(RuntimeError::Disposed),
        }
    }

    /// Release the model. Later calls fail with [`RuntimeError::Disposed`].
    pub async fn dispose(&mut self) {
        match std::mem::replace(&mut self.slot, Slot::Disposed) {
            Slot::Loaded(mut model) => {
                model.shutdown().await;
                tracing::info!("model disposed");
            }
            Slot::Empty | Slot::Disposed => {}
        }
    }
}
