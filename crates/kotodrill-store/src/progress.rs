//! Learner progress and the generated question log.

use std::path::{Path, PathBuf};

use anyhow::Result;

use kotodrill_core::{ProgressAggregate, Question};

use crate::{read_json_or_default, write_json};

const PROGRESS_FILE: &str = "progress.json";
const QUESTIONS_FILE: &str = "questions.json";

/// Persists the progress aggregate and the question log in a data directory.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    dir: PathBuf,
}

impl ProgressStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir.join(PROGRESS_FILE)
    }

    pub fn questions_path(&self) -> PathBuf {
        self.dir.join(QUESTIONS_FILE)
    }

    /// The stored aggregate, or a fresh one when the file is missing or corrupt.
    pub fn load(&self) -> ProgressAggregate {
        read_json_or_default(&self.progress_path())
    }

    pub fn save(&self, progress: &ProgressAggregate) -> Result<()> {
        write_json(&self.progress_path(), progress)
    }

    /// Start over with an empty aggregate.
    pub fn reset(&self) -> Result<ProgressAggregate> {
        let fresh = ProgressAggregate::default();
        self.save(&fresh)?;
        tracing::info!("progress reset");
        Ok(fresh)
    }

    /// Logged questions, oldest first; empty when missing or corrupt.
    pub fn load_questions(&self) -> Vec<Question> {
        read_json_or_default(&self.questions_path())
    }

    pub fn save_questions(&self, questions: &[Question]) -> Result<()> {
        write_json(&self.questions_path(), questions)
    }

    /// Append one question to the log.
    pub fn append_question(&self, question: &Question) -> Result<()> {
        let mut questions = self.load_questions();
        questions.push(question.clone());
        self.save_questions(&questions)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use kotodrill_core::{Difficulty, Outcome};

    use super::*;

    fn store() -> (tempfile::TempDir, ProgressStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ProgressStore::new(dir.path().join("data"));
        (dir, store)
    }

    #[test]
    fn missing_progress_is_fresh() {
        let (_dir, store) = store();
        let progress = store.load();
        assert_eq!(progress.total_answered, 0);
        assert_eq!(progress.accuracy_rate(), 0.0);
    }

    #[test]
    fn corrupt_progress_is_fresh() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.progress_path(), "[1, 2").unwrap();
        assert_eq!(store.load().total_answered, 0);
    }

    #[test]
    fn save_and_load_progress() {
        let (_dir, store) = store();
        let mut progress = store.load();
        let id = uuid::Uuid::new_v4();
        progress.record(Outcome {
            question_id: id,
            correct: true,
        });
        progress.record(Outcome {
            question_id: uuid::Uuid::new_v4(),
            correct: false,
        });
        store.save(&progress).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.total_answered, 2);
        assert_eq!(loaded.correct, 1);
        assert_eq!(loaded.incorrect, 1);
        assert_eq!(loaded.answered_question_ids[0], id);
        assert_eq!(loaded.accuracy_rate(), 50.0);
    }

    #[test]
    fn reset_clears_progress() {
        let (_dir, store) = store();
        let mut progress = ProgressAggregate::default();
        progress.record(Outcome {
            question_id: uuid::Uuid::new_v4(),
            correct: true,
        });
        store.save(&progress).unwrap();

        store.reset().unwrap();
        assert_eq!(store.load().total_answered, 0);
    }

    #[test]
    fn question_log_appends_in_order() {
        let (_dir, store) = store();
        assert!(store.load_questions().is_empty());

        let first = Question::new("私___学生です。", "は", vec![], None, Difficulty::Beginner);
        let second = Question::new(
            "駅___行きます。",
            "に",
            vec!["へ".into()],
            Some("direction".into()),
            Difficulty::Intermediate,
        );
        store.append_question(&first).unwrap();
        store.append_question(&second).unwrap();

        let log = store.load_questions();
        assert_eq!(log, vec![first, second]);
    }
}
