//! Question generation.
//!
//! Builds the few-shot prompt for a difficulty level, streams the model's
//! completion under a token budget, a character ceiling and a wall-clock
//! limit, and hands the collected text to the response parser.

use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;

use crate::error::GenerationError;
use crate::model::{Difficulty, Question};
use crate::parser::{parse_question, FALLBACK_ANSWER, FALLBACK_EXPLANATION, FALLBACK_PROMPT};
use crate::runtime::ModelRuntime;
use crate::traits::{CancelSignal, InferRequest};

/// Trailing instruction of the prompt. Used as a stop sequence so the model
/// cannot echo it back as content.
pub const TRAILING_INSTRUCTION: &str = "Now generate a new question";

/// Configuration for question generation.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Token budget passed to the runtime.
    pub max_tokens: u32,
    /// Collection stops once the text grows past this many characters.
    pub max_chars: usize,
    /// Sampling temperature.
    pub temperature: f32,
    /// Collection stops once a completion has been streaming this long,
    /// including time spent waiting for a fragment that never comes.
    pub max_duration: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_tokens: 256,
            max_chars: 1000,
            temperature: 0.7,
            max_duration: Duration::from_secs(120),
        }
    }
}

/// Why collection of a completion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The runtime ended the stream (its own stop condition or token budget).
    StreamEnd,
    /// A stop sequence showed up in the collected text.
    StopSequence,
    /// The character ceiling was exceeded.
    CharLimit,
    /// The wall-clock limit ran out.
    TimeLimit,
}

/// Render the generation prompt for `difficulty`.
pub fn build_prompt(difficulty: Difficulty) -> String {
    format!(
        "Generate a Japanese grammar fill-in-the-blank question at {difficulty} level.\n\
         \n\
         Format your response as follows:\n\
         QUESTION: [Japanese sentence with ___ for the blank]\n\
         ANSWER: [The correct word/particle to fill in the blank]\n\
         EXPLANATION: [Brief explanation in English]\n\
         \n\
         Example:\n\
         QUESTION: {FALLBACK_PROMPT}\n\
         ANSWER: {FALLBACK_ANSWER}\n\
         EXPLANATION: {FALLBACK_EXPLANATION}\n\
         \n\
         {TRAILING_INSTRUCTION}:"
    )
}

/// Generates grammar questions from a loaded model.
#[derive(Debug, Clone, Default)]
pub struct QuestionGenerator {
    config: GeneratorConfig,
}

impl QuestionGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The request sent to the runtime for `difficulty`.
    pub fn request_for(&self, difficulty: Difficulty, cancel: &CancelSignal) -> InferRequest {
        InferRequest {
            prompt: build_prompt(difficulty),
            max_tokens: self.config.max_tokens,
            stop_sequences: vec![TRAILING_INSTRUCTION.to_string()],
            temperature: self.config.temperature,
            cancel: cancel.clone(),
        }
    }

    /// Generate one question.
    ///
    /// Malformed output never fails this call; only runtime errors and
    /// cancellation do.
    pub async fn generate(
        &self,
        runtime: &ModelRuntime,
        difficulty: Difficulty,
        cancel: &CancelSignal,
    ) -> Result<Question, GenerationError> {
        let request = self.request_for(difficulty, cancel);
        tracing::debug!(%difficulty, prompt_len = request.prompt.len(), "starting generation");

        let (raw, reason) = self.collect(runtime, &request).await?;
        tracing::debug!(?reason, chars = raw.chars().count(), "generation finished");

        Ok(parse_question(&raw, difficulty))
    }

    /// Drain the completion stream into one string.
    ///
    /// Every wait for a fragment races the cancel signal and the wall-clock
    /// deadline, so a stalled stream cannot hold the caller.
    pub async fn collect(
        &self,
        runtime: &ModelRuntime,
        request: &InferRequest,
    ) -> Result<(String, StopReason), GenerationError> {
        let mut stream = runtime.infer(request)?;
        let deadline = Instant::now() + self.config.max_duration;
        let mut text = String::new();
        let mut chars = 0usize;

        loop {
            if request.cancel.is_cancelled() {
                tracing::debug!("generation cancelled by caller");
                return Err(GenerationError::Cancelled);
            }

            let next = tokio::select! {
                biased;
                _ = request.cancel.cancelled() => {
                    tracing::debug!("generation cancelled while waiting for output");
                    return Err(GenerationError::Cancelled);
                }
                next = tokio::time::timeout_at(deadline, stream.next()) => next,
            };
            let Ok(next) = next else {
                tracing::warn!(
                    limit_secs = self.config.max_duration.as_secs(),
                    chars,
                    "generation hit the time limit"
                );
                return Ok((text, StopReason::TimeLimit));
            };
            let Some(fragment) = next else {
                return Ok((text, StopReason::StreamEnd));
            };
            let fragment = fragment?;

            chars += fragment.chars().count();
            text.push_str(&fragment);

            if let Some(cut) = earliest_stop(&text, &request.stop_sequences) {
                text.truncate(cut);
                return Ok((text, StopReason::StopSequence));
            }
            if chars > self.config.max_chars {
                return Ok((text, StopReason::CharLimit));
            }
        }
    }
}

/// Byte offset of the earliest stop sequence in `text`.
fn earliest_stop(text: &str, stops: &[String]) -> Option<usize> {
    stops
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s.as_str()))
        .min()
}
