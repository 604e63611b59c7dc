//! The `kotodrill dataset` commands: edit the weekly vocabulary files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use kotodrill_core::{Difficulty, VocabularyItem};
use kotodrill_store::VocabularyRepository;

use super::load_settings;

/// Fields of an item given on the command line.
pub struct ItemArgs {
    pub chinese: String,
    pub answer: String,
    pub alternates: Option<String>,
    pub difficulty: Difficulty,
    pub hint: Option<String>,
}

fn repository(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<VocabularyRepository> {
    let settings = load_settings(config.as_deref(), data_dir)?;
    Ok(VocabularyRepository::new(&settings.data_dir))
}

/// List the items of one week, or of every week.
pub fn list(config: Option<PathBuf>, data_dir: Option<PathBuf>, week: Option<u32>) -> Result<()> {
    let repo = repository(config, data_dir)?;
    let items = match week {
        Some(week) => repo.load_week(week),
        None => repo.load_all()?,
    };

    if items.is_empty() {
        match week {
            Some(week) => println!("Week {week} has no vocabulary items."),
            None => println!("No vocabulary items in {}.", repo.dir().display()),
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Week",
        "Chinese",
        "Answer",
        "Also acceptable",
        "Difficulty",
        "Hint",
    ]);
    for item in &items {
        table.add_row(vec![
            Cell::new(item.week_number),
            Cell::new(&item.chinese_text),
            Cell::new(&item.japanese_answer),
            Cell::new(item.alternative_answers.join(", ")),
            Cell::new(&item.difficulty_level),
            Cell::new(item.hint.as_deref().unwrap_or("")),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Add an item to a week, or update the item with the same Chinese text.
pub fn add(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    week: u32,
    args: ItemArgs,
) -> Result<()> {
    let repo = repository(config, data_dir)?;
    let item = build_item(week, args)?;
    let chinese = item.chinese_text.clone();

    let updated = repo
        .add_or_update_item(week, item)
        .with_context(|| format!("failed to save week {week}"))?;
    if updated {
        println!("Updated '{chinese}' in week {week}.");
    } else {
        println!("Added '{chinese}' to week {week}.");
    }
    Ok(())
}

/// Delete the item of `week` with this Chinese text and answer.
pub fn delete(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    week: u32,
    chinese: String,
    answer: String,
) -> Result<()> {
    let repo = repository(config, data_dir)?;
    let target = VocabularyItem {
        chinese_text: chinese.trim().to_string(),
        japanese_answer: answer.trim().to_string(),
        alternative_answers: Vec::new(),
        difficulty_level: Difficulty::default().to_string(),
        hint: None,
        week_number: week,
    };

    if !repo.delete_item(week, &target)? {
        anyhow::bail!(
            "no item '{}' with answer '{}' in week {week}",
            target.chinese_text,
            target.japanese_answer
        );
    }
    println!("Deleted '{}' from week {week}.", target.chinese_text);
    Ok(())
}

/// Create an empty week, by default the one after the highest existing week.
pub fn create_week(
    config: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    week: Option<u32>,
) -> Result<()> {
    let repo = repository(config, data_dir)?;
    let week = match week {
        Some(week) => week,
        None => repo.next_week_number()?,
    };
    repo.create_week(week)?;
    println!("Created week {week} at {}", repo.week_path(week).display());
    Ok(())
}

fn build_item(week: u32, args: ItemArgs) -> Result<VocabularyItem> {
    let chinese = args.chinese.trim();
    let answer = args.answer.trim();
    if chinese.is_empty() || answer.is_empty() {
        anyhow::bail!("both --chinese and --answer must be non-empty");
    }

    Ok(VocabularyItem {
        chinese_text: chinese.to_string(),
        japanese_answer: answer.to_string(),
        alternative_answers: args
            .alternates
            .as_deref()
            .map(split_alternates)
            .unwrap_or_default(),
        difficulty_level: args.difficulty.to_string(),
        hint: args
            .hint
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty()),
        week_number: week,
    })
}

/// Split a `,` or `;` separated list, dropping blank entries.
fn split_alternates(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}
