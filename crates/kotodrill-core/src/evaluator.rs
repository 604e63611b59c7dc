//! Answer evaluation.
//!
//! Comparison trims the submission and ignores case by mapping each
//! character to its simple (one-to-one) uppercase form, which does not
//! depend on the process locale. Full-width and half-width forms are *not*
//! unified: `Ａ` and `A` are different answers.

use crate::model::{Outcome, Question};

/// Whether two answers are equal ignoring case.
///
/// Neither side is trimmed here; [`is_correct`] trims the submission.
pub fn answers_match(a: &str, b: &str) -> bool {
    a.chars().map(simple_upper).eq(b.chars().map(simple_upper))
}

/// Uppercase `c` when that maps to exactly one character, else keep it.
fn simple_upper(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

/// Judge a submission against the canonical answer, then each alternate in order.
pub fn is_correct(submitted: &str, canonical: &str, alternates: &[String]) -> bool {
    let submitted = submitted.trim();
    answers_match(submitted, canonical) || alternates.iter().any(|alt| answers_match(submitted, alt))
}

/// Result of judging one answer, with learner-facing feedback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub correct: bool,
    pub feedback: String,
}

impl Evaluation {
    /// The outcome to record for `question`.
    pub fn outcome(&self, question: &Question) -> Outcome {
        Outcome {
            question_id: question.id(),
            correct: self.correct,
        }
    }
}

/// Judge `submitted` against `question` and build the feedback line.
pub fn evaluate(question: &Question, submitted: &str) -> Evaluation {
    let correct = is_correct(
        submitted,
        question.correct_answer(),
        question.accepted_alternates(),
    );

    let mut feedback = if correct {
        format!("Correct! The answer is: {}", question.correct_answer())
    } else {
        format!(
            "Incorrect. The correct answer is: {}",
            question.correct_answer()
        )
    };
    if !question.accepted_alternates().is_empty() {
        feedback.push_str(&format!(
            " (Also acceptable: {})",
            question.accepted_alternates().join(", ")
        ));
    }

    Evaluation { correct, feedback }
}
