//! Subcommand implementations.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::sync::mpsc;

use kotodrill_runtime::config::load_config_from;
use kotodrill_runtime::KotodrillConfig;

pub mod dataset;
pub mod generate;
pub mod init;
pub mod progress;
pub mod vocab;
pub mod weeks;

/// Load the config file and apply the `--data-dir` override.
pub fn load_settings(config: Option<&Path>, data_dir: Option<PathBuf>) -> Result<KotodrillConfig> {
    let mut settings = load_config_from(config)?;
    if let Some(dir) = data_dir {
        settings.data_dir = dir;
    }
    tracing::debug!(data_dir = %settings.data_dir.display(), "settings loaded");
    Ok(settings)
}

/// Answers typed on stdin, one per line.
///
/// Lines are read on a plain thread so an unanswered prompt never holds up
/// runtime shutdown.
pub struct AnswerReader {
    rx: mpsc::Receiver<String>,
}

impl AnswerReader {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(1);
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });
        Self { rx }
    }

    /// Prompt for the next answer. `None` on end of input or Ctrl-C.
    pub async fn next(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        tokio::select! {
            line = self.rx.recv() => line,
            _ = tokio::signal::ctrl_c() => {
                println!();
                None
            }
        }
    }
}
