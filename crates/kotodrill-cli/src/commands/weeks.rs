//! The `kotodrill weeks` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use kotodrill_core::evaluator::answers_match;
use kotodrill_core::{Difficulty, VocabularyItem};
use kotodrill_store::VocabularyRepository;

use super::load_settings;

pub fn execute(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config.as_deref(), data_dir)?;
    let repo = VocabularyRepository::new(&settings.data_dir);
    let weeks = repo.list_weeks()?;

    if weeks.is_empty() {
        println!(
            "No vocabulary weeks in {}. Run `kotodrill init` to create a sample week.",
            repo.dir().display()
        );
        return Ok(());
    }

    let mut table = Table::new();
    let mut header = vec!["Week".to_string(), "Items".to_string()];
    header.extend(Difficulty::ALL.iter().map(|d| d.to_string()));
    table.set_header(header);

    for week in weeks {
        let items = repo.load_week(week);
        let mut row = vec![Cell::new(week), Cell::new(items.len())];
        row.extend(
            Difficulty::ALL
                .iter()
                .map(|level| Cell::new(count_at(&items, *level))),
        );
        table.add_row(row);
    }

    println!("{table}");
    Ok(())
}

fn count_at(items: &[VocabularyItem], level: Difficulty) -> usize {
    items
        .iter()
        .filter(|i| answers_match(i.difficulty_level.trim(), level.as_str()))
        .count()
}
