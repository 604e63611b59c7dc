//! Response parser for generated grammar questions.
//!
//! Model output is untrusted free text. [`parse_question`] pulls the
//! `QUESTION:` / `ANSWER:` / `EXPLANATION:` fields out of it and never fails:
//! when the question or answer cannot be recovered it returns the fixed
//! fallback question instead.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Difficulty, Question, BLANK_MARKER};

/// Prompt text of the fallback question.
pub const FALLBACK_PROMPT: &str = "私は毎日学校___行きます。";
/// Answer of the fallback question.
pub const FALLBACK_ANSWER: &str = "に";
/// Explanation of the fallback question.
pub const FALLBACK_EXPLANATION: &str =
    "The particle 'に' indicates the direction of movement towards a destination.";

static QUESTION_RE: OnceLock<Option<Regex>> = OnceLock::new();
static ANSWER_RE: OnceLock<Option<Regex>> = OnceLock::new();
static EXPLANATION_RE: OnceLock<Option<Regex>> = OnceLock::new();

const MARKERS: [&str; 3] = ["QUESTION:", "ANSWER:", "EXPLANATION:"];

/// Fields recovered from raw model output. Empty captures are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
}

impl ExtractedFields {
    /// Whether the fields are enough to build a usable question.
    pub fn is_complete(&self) -> bool {
        self.question.is_some() && self.answer.is_some()
    }
}

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::error!("invalid marker pattern {pattern:?}: {e}");
            None
        }
    })
    .as_ref()
}

/// Capture group 1 of the first match, trimmed; `None` when absent, blank,
/// or when the marker is directly followed by the next marker.
fn capture(re: Option<&Regex>, raw: &str) -> Option<String> {
    let caps = re?.captures(raw)?;
    let value = caps.get(1)?.as_str().trim();
    if value.is_empty() || MARKERS.iter().any(|m| value.starts_with(m)) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Extract the three marker fields without applying the fallback.
///
/// `QUESTION:` and `ANSWER:` take the first non-blank line after the marker,
/// which is usually the rest of the marker's own line. `EXPLANATION:` runs
/// until the first blank line after its content or the end of the text.
pub fn extract_fields(raw: &str) -> ExtractedFields {
    let question = capture(
        compiled(&QUESTION_RE, r"QUESTION:\s*([^\r\n]*)"),
        raw,
    );
    let answer = capture(compiled(&ANSWER_RE, r"ANSWER:\s*([^\r\n]*)"), raw);
    let explanation = capture(
        compiled(
            &EXPLANATION_RE,
            r"(?s)EXPLANATION:\s*(.*?)(?:\r?\n[ \t]*\r?\n|\z)",
        ),
        raw,
    );

    ExtractedFields {
        question,
        answer,
        explanation,
    }
}

/// The known-good question used whenever extraction fails.
pub fn fallback_question(difficulty: Difficulty) -> Question {
    Question::new(
        FALLBACK_PROMPT,
        FALLBACK_ANSWER,
        Vec::new(),
        Some(FALLBACK_EXPLANATION.to_string()),
        difficulty,
    )
}

/// Build a question from raw model output. Total: never fails.
pub fn parse_question(raw: &str, difficulty: Difficulty) -> Question {
    let fields = extract_fields(raw);

    match fields {
        ExtractedFields {
            question: Some(prompt),
            answer: Some(answer),
            explanation,
        } => {
            if !prompt.contains(BLANK_MARKER) {
                tracing::debug!(%prompt, "generated question has no blank marker");
            }
            Question::new(prompt, answer, Vec::new(), explanation, difficulty)
        }
        incomplete => {
            tracing::warn!(
                has_question = incomplete.question.is_some(),
                has_answer = incomplete.answer.is_some(),
                raw_len = raw.len(),
                "could not extract question from model output, using fallback"
            );
            fallback_question(difficulty)
        }
    }
}
