//! kotodrill-store — JSON persistence for kotodrill.
//!
//! The vocabulary bank lives in one `week{N}.json` file per study week;
//! learner progress and the log of generated questions live next to it in
//! `progress.json` and `questions.json`.

pub mod progress;
pub mod vocabulary;

pub use progress::ProgressStore;
pub use vocabulary::VocabularyRepository;

use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Write `value` as pretty-printed JSON, creating parent directories.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Read a JSON file, treating a missing or unreadable file as `T::default()`.
///
/// Corrupt files are logged and skipped rather than failing the caller.
pub(crate) fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    if !path.exists() {
        return T::default();
    }
    let parsed = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))
        .and_then(|content| {
            serde_json::from_str(&content)
                .with_context(|| format!("failed to parse {}", path.display()))
        });
    match parsed {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("ignoring {}: {:#}", path.display(), e);
            T::default()
        }
    }
}
