//! Generation service façade: the only entry point front ends use.

use std::path::Path;

use crate::error::{GenerationError, RuntimeError};
use crate::generator::QuestionGenerator;
use crate::model::{Difficulty, Question};
use crate::runtime::{ModelRuntime, RuntimeState};
use crate::traits::CancelSignal;

/// Owns the model runtime and the generator, and refuses to generate until
/// the runtime is ready.
pub struct GenerationService {
    runtime: ModelRuntime,
    generator: QuestionGenerator,
}

impl GenerationService {
    pub fn new(runtime: ModelRuntime, generator: QuestionGenerator) -> Self {
        Self { runtime, generator }
    }

    /// Load the model. Calling it again once ready is a no-op.
    pub async fn initialize(&mut self, model_path: &Path) -> Result<(), RuntimeError> {
        self.runtime.initialize(model_path).await
    }

    pub fn is_ready(&self) -> bool {
        self.runtime.is_ready()
    }

    pub fn state(&self) -> RuntimeState {
        self.runtime.state()
    }

    /// Generate one question, failing fast with `NotReady` before any inference.
    pub async fn generate(
        &self,
        difficulty: Difficulty,
        cancel: &CancelSignal,
    ) -> Result<Question, GenerationError> {
        if !self.is_ready() {
            return Err(GenerationError::NotReady);
        }
        self.generator.generate(&self.runtime, difficulty, cancel).await
    }

    /// Release the model.
    pub async fn dispose(&mut self) {
        self.runtime.dispose().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::runtime::testing::{model_file, ScriptLoader};

    fn service(fragments: &[&str]) -> (GenerationService, std::sync::Arc<crate::runtime::testing::Counters>) {
        let (loader, counters) = ScriptLoader::new(fragments);
        let runtime = ModelRuntime::new(Box::new(loader));
        (
            GenerationService::new(runtime, QuestionGenerator::default()),
            counters,
        )
    }

    #[tokio::test]
    async fn generate_before_initialize_is_not_ready() {
        let (svc, counters) = service(&["QUESTION: a___\nANSWER: b"]);
        assert!(!svc.is_ready());

        let err = svc
            .generate(Difficulty::Beginner, &CancelSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::NotReady));
        assert_eq!(counters.loads.load(Ordering::SeqCst), 0);
        assert_eq!(counters.infers.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn initialize_then_generate() {
        let file = model_file();
        let (mut svc, counters) = service(&["QUESTION: 本___読む\nANSWER: を\n"]);

        svc.initialize(file.path()).await.unwrap();
        svc.initialize(file.path()).await.unwrap();
        assert!(svc.is_ready());
        assert_eq!(counters.loads.load(Ordering::SeqCst), 1);

        let q = svc
            .generate(Difficulty::Intermediate, &CancelSignal::new())
            .await
            .unwrap();
        assert_eq!(q.prompt_text(), "本___読む");
        assert_eq!(q.correct_answer(), "を");
        assert_eq!(q.difficulty(), Difficulty::Intermediate);
    }

    #[tokio::test]
    async fn generate_after_dispose_is_not_ready() {
        let file = model_file();
        let (mut svc, _) = service(&[]);
        svc.initialize(file.path()).await.unwrap();
        svc.dispose().await;

        assert_eq!(svc.state(), RuntimeState::Disposed);
        assert!(matches!(
            svc.generate(Difficulty::Beginner, &CancelSignal::new()).await,
            Err(GenerationError::NotReady)
        ));
        assert!(matches!(
            svc.initialize(file.path()).await,
            Err(RuntimeError::Disposed)
        ));
    }
}
