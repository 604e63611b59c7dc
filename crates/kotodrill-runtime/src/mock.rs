//! Mock runtime for testing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::{future, stream, StreamExt};

use kotodrill_core::traits::{InferRequest, LoadedModel, ModelLoader, TextStream};
use kotodrill_core::RuntimeError;

#[derive(Default)]
struct MockState {
    load_count: AtomicU32,
    infer_count: AtomicU32,
    shutdown_count: AtomicU32,
    last_request: Mutex<Option<InferRequest>>,
    last_model_path: Mutex<Option<PathBuf>>,
}

/// A scripted model runtime for exercising the generation pipeline without
/// real weights.
///
/// Each fragment stands in for one token: the token budget caps how many
/// are streamed, and the stream ends early at a stop sequence or when the
/// request is cancelled. Clones share their counters, so keep one clone
/// for assertions and hand the other to a `ModelRuntime`.
#[derive(Clone)]
pub struct MockLoader {
    fragments: Arc<Vec<String>>,
    state: Arc<MockState>,
}

impl MockLoader {
    /// Create a mock that streams the given fragments.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fragments: Arc::new(fragments.into_iter().map(Into::into).collect()),
            state: Arc::new(MockState::default()),
        }
    }

    /// Create a mock that always streams `response`, split at whitespace.
    pub fn with_fixed_response(response: &str) -> Self {
        Self::new(response.split_inclusive(char::is_whitespace))
    }

    /// Number of times a model was loaded.
    pub fn load_count(&self) -> u32 {
        self.state.load_count.load(Ordering::Relaxed)
    }

    /// Number of inference calls made on loaded models.
    pub fn infer_count(&self) -> u32 {
        self.state.infer_count.load(Ordering::Relaxed)
    }

    /// Number of times a loaded model was shut down.
    pub fn shutdown_count(&self) -> u32 {
        self.state.shutdown_count.load(Ordering::Relaxed)
    }

    /// The last inference request received.
    pub fn last_request(&self) -> Option<InferRequest> {
        self.state
            .last_request
            .lock()
            .ok()
            .and_then(|r| r.clone())
    }

    /// The path passed to the last load.
    pub fn last_model_path(&self) -> Option<PathBuf> {
        self.state
            .last_model_path
            .lock()
            .ok()
            .and_then(|p| p.clone())
    }
}

#[async_trait]
impl ModelLoader for MockLoader {
    fn name(&self) -> &str {
        "mock"
    }

    async fn load(&self, model_path: &Path) -> Result<Box<dyn LoadedModel>, RuntimeError> {
        self.state.load_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.state.last_model_path.lock() {
            *last = Some(model_path.to_path_buf());
        }
        Ok(Box::new(MockModel {
            fragments: Arc::clone(&self.fragments),
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockModel {
    fragments: Arc<Vec<String>>,
    state: Arc<MockState>,
}

impl MockModel {
    /// The fragments a real runtime would emit for `request`.
    fn script(&self, request: &InferRequest) -> Vec<String> {
        let mut emitted = Vec::new();
        let mut text = String::new();

        for fragment in self.fragments.iter().take(request.max_tokens as usize) {
            let start = text.len();
            text.push_str(fragment);

            let stop = request
                .stop_sequences
                .iter()
                .filter(|s| !s.is_empty())
                .filter_map(|s| text.find(s.as_str()))
                .min();
            if let Some(cut) = stop {
                if cut > start {
                    emitted.push(text[start..cut].to_string());
                }
                break;
            }
            emitted.push(fragment.clone());
        }
        emitted
    }
}

#[async_trait]
impl LoadedModel for MockModel {
    fn infer(&self, request: &InferRequest) -> TextStream {
        self.state.infer_count.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut last) = self.state.last_request.lock() {
            *last = Some(request.clone());
        }

        let cancel = request.cancel.clone();
        let fragments = self.script(request);
        Box::pin(
            stream::iter(fragments)
                .take_while(move |_| future::ready(!cancel.is_cancelled()))
                .map(Ok::<String, RuntimeError>),
        )
    }

    async fn shutdown(&mut self) {
        self.state.shutdown_count.fetch_add(1, Ordering::Relaxed);
    }
}
