//! The `kotodrill progress` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use kotodrill_store::ProgressStore;

use super::load_settings;

pub fn execute(config: Option<PathBuf>, data_dir: Option<PathBuf>, reset: bool) -> Result<()> {
    let settings = load_settings(config.as_deref(), data_dir)?;
    let store = ProgressStore::new(&settings.data_dir);

    let progress = if reset {
        let fresh = store.reset()?;
        println!("Progress reset.");
        fresh
    } else {
        store.load()
    };

    let last_activity = if progress.total_answered == 0 {
        "-".to_string()
    } else {
        progress
            .last_activity_at
            .format("%Y-%m-%d %H:%M UTC")
            .to_string()
    };

    let mut table = Table::new();
    table.set_header(vec![
        "Answered",
        "Correct",
        "Incorrect",
        "Accuracy",
        "Last activity",
    ]);
    table.add_row(vec![
        Cell::new(progress.total_answered),
        Cell::new(progress.correct),
        Cell::new(progress.incorrect),
        Cell::new(format!("{:.1}%", progress.accuracy_rate())),
        Cell::new(last_activity),
    ]);
    println!("{table}");

    let logged = store.load_questions().len();
    if logged > 0 {
        println!("{logged} generated questions logged.");
    }
    Ok(())
}
