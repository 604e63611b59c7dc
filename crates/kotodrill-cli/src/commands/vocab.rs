//! The `kotodrill vocab` command.

use std::path::PathBuf;

use anyhow::Result;

use kotodrill_core::evaluator::{answers_match, evaluate};
use kotodrill_core::selector::ALL_DIFFICULTIES;
use kotodrill_store::{ProgressStore, VocabularyRepository};

use super::{load_settings, AnswerReader};

pub async fn execute(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    week: u32,
    difficulty: String,
    count: u32,
) -> Result<()> {
    let settings = load_settings(config.as_deref(), data_dir)?;
    let repo = VocabularyRepository::new(&settings.data_dir);
    let store = ProgressStore::new(&settings.data_dir);

    let mut progress = store.load();
    let mut answers: Option<AnswerReader> = None;
    let mut asked = 0u32;
    let mut right = 0u32;

    for n in 1..=count {
        let Some(item) = repo.pick_random(week, &difficulty) else {
            println!(
                "No vocabulary found for week {week}{}. Please check your data files or select a different filter.",
                filter_note(&difficulty)
            );
            return Ok(());
        };

        let question = item.to_question();
        println!("\n[{n}/{count}] Translate into Japanese: {}", question.prompt_text());
        if let Some(hint) = question.explanation() {
            println!("  {hint}");
        }

        let reader = answers.get_or_insert_with(AnswerReader::spawn);
        let Some(answer) = reader.next("Your answer: ").await else {
            break;
        };
        let evaluation = evaluate(&question, &answer);
        println!("{}", evaluation.feedback);

        progress.record(evaluation.outcome(&question));
        store.save(&progress)?;
        asked += 1;
        if evaluation.correct {
            right += 1;
        }
    }

    if asked > 1 {
        println!("\nSession: {right}/{asked} correct.");
    }
    Ok(())
}

fn filter_note(difficulty: &str) -> String {
    let difficulty = difficulty.trim();
    if difficulty.is_empty() || answers_match(difficulty, ALL_DIFFICULTIES) {
        String::new()
    } else {
        format!(" with difficulty '{difficulty}'")
    }
}
