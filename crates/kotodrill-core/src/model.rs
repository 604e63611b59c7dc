//! Core data model types for kotodrill.
//!
//! These are the types shared by the generator, the evaluator, and the
//! file-backed collaborators: questions, difficulty levels, vocabulary items,
//! and the progress aggregate.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder that marks where the learner's answer belongs.
pub const BLANK_MARKER: &str = "___";

/// Difficulty levels for questions and vocabulary items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// All levels, easiest first.
    pub const ALL: [Difficulty; 3] = [
        Difficulty::Beginner,
        Difficulty::Intermediate,
        Difficulty::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Intermediate => "Intermediate",
            Difficulty::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "easy" => Ok(Difficulty::Beginner),
            "intermediate" | "medium" => Ok(Difficulty::Intermediate),
            "advanced" | "hard" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// A fill-in-the-blank item presented to the learner.
///
/// Questions are immutable once built. Both generated grammar questions and
/// static vocabulary items end up as a `Question` so they share one
/// evaluation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    id: Uuid,
    prompt_text: String,
    correct_answer: String,
    #[serde(default)]
    accepted_alternates: Vec<String>,
    #[serde(default)]
    explanation: Option<String>,
    difficulty: Difficulty,
    created_at: DateTime<Utc>,
}

impl Question {
    /// Build a new question with a fresh id and creation timestamp.
    pub fn new(
        prompt_text: impl Into<String>,
        correct_answer: impl Into<String>,
        accepted_alternates: Vec<String>,
        explanation: Option<String>,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt_text: prompt_text.into(),
            correct_answer: correct_answer.into(),
            accepted_alternates,
            explanation,
            difficulty,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn accepted_alternates(&self) -> &[String] {
        &self.accepted_alternates
    }

    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A Chinese → Japanese vocabulary entry from the static bank.
///
/// JSON files use camelCase keys; PascalCase keys written by older tooling
/// are accepted on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyItem {
    #[serde(alias = "ChineseText")]
    pub chinese_text: String,
    #[serde(alias = "JapaneseAnswer")]
    pub japanese_answer: String,
    #[serde(default, alias = "AlternativeAnswers")]
    pub alternative_answers: Vec<String>,
    #[serde(default = "default_difficulty_level", alias = "DifficultyLevel")]
    pub difficulty_level: String,
    #[serde(default, alias = "Hint")]
    pub hint: Option<String>,
    #[serde(default, alias = "WeekNumber")]
    pub week_number: u32,
}

fn default_difficulty_level() -> String {
    Difficulty::Beginner.to_string()
}

impl VocabularyItem {
    /// Convert into a `Question` for display and evaluation.
    ///
    /// Unrecognized difficulty labels map to `Beginner`.
    pub fn to_question(&self) -> Question {
        let difficulty = self.difficulty_level.parse().unwrap_or_default();
        let explanation = self
            .hint
            .as_ref()
            .filter(|h| !h.trim().is_empty())
            .map(|h| format!("Hint: {h}"));

        Question::new(
            self.chinese_text.clone(),
            self.japanese_answer.clone(),
            self.alternative_answers.clone(),
            explanation,
            difficulty,
        )
    }
}

/// One judged answer, as handed to the progress aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub question_id: Uuid,
    pub correct: bool,
}

/// Aggregate answer counters for a learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressAggregate {
    #[serde(default)]
    pub total_answered: u32,
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub incorrect: u32,
    #[serde(default)]
    pub answered_question_ids: Vec<Uuid>,
    #[serde(default = "Utc::now")]
    pub last_activity_at: DateTime<Utc>,
}

impl Default for ProgressAggregate {
    fn default() -> Self {
        Self {
            total_answered: 0,
            correct: 0,
            incorrect: 0,
            answered_question_ids: Vec::new(),
            last_activity_at: Utc::now(),
        }
    }
}

impl ProgressAggregate {
    /// Append exactly one outcome.
    pub fn record(&mut self, outcome: Outcome) {
        self.total_answered += 1;
        if outcome.correct {
            self.correct += 1;
        } else {
            self.incorrect += 1;
        }
        self.answered_question_ids.push(outcome.question_id);
        self.last_activity_at = Utc::now();
    }

    /// Accuracy as a percentage, 0 when nothing has been answered.
    pub fn accuracy_rate(&self) -> f64 {
        if self.total_answered == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total_answered) * 100.0
    }
}
