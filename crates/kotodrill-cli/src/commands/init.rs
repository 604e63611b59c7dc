//! The `kotodrill init` command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use kotodrill_core::VocabularyItem;
use kotodrill_runtime::KotodrillConfig;
use kotodrill_store::VocabularyRepository;

pub fn execute(config: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let config_path = config.unwrap_or_else(|| PathBuf::from("kotodrill.toml"));
    let data_dir = data_dir.unwrap_or_else(|| KotodrillConfig::default().data_dir);

    if config_path.exists() {
        println!("{} already exists, skipping.", config_path.display());
    } else {
        std::fs::write(&config_path, sample_config(&data_dir))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("Created {}", config_path.display());
    }

    let repo = VocabularyRepository::new(&data_dir);
    let week_path = repo.week_path(1);
    if week_path.exists() {
        println!("{} already exists, skipping.", week_path.display());
    } else {
        repo.save_week(1, &sample_week())?;
        println!("Created {}", week_path.display());
    }

    println!("\nNext steps:");
    println!(
        "  1. Download a GGUF model and set model_path in {}",
        config_path.display()
    );
    println!("  2. Run: kotodrill vocab --week 1");
    println!("  3. Run: kotodrill generate --quiz --count 5");

    Ok(())
}

fn sample_config(data_dir: &Path) -> String {
    format!(
        r#"# kotodrill configuration

# GGUF model used by `kotodrill generate` (or pass --model)
# model_path = "${{HOME}}/models/japanese-grammar.gguf"
data_dir = "{}"
default_difficulty = "Beginner"

[runtime]
backend = "llama-server"
server_binary = "llama-server"
# Attach to an already running llama-server instead of starting one
# server_url = "http://127.0.0.1:8080"
port = 8089
context_size = 2048
gpu_layers = 0
threads = 4
startup_timeout_secs = 120

[generation]
max_tokens = 256
max_chars = 1000
temperature = 0.7
max_duration_secs = 120
"#,
        data_dir.display().to_string().replace('\\', "/")
    )
}

fn sample_week() -> Vec<VocabularyItem> {
    let item = |chinese: &str, answer: &str, alternates: &[&str], hint: Option<&str>| {
        VocabularyItem {
            chinese_text: chinese.to_string(),
            japanese_answer: answer.to_string(),
            alternative_answers: alternates.iter().map(|s| s.to_string()).collect(),
            difficulty_level: "Beginner".to_string(),
            hint: hint.map(str::to_string),
            week_number: 1,
        }
    };

    vec![
        item("学生", "がくせい", &["学生"], Some("a person who studies")),
        item("老师", "せんせい", &["先生"], None),
        item("水", "みず", &[], Some("you drink it")),
        item("书", "ほん", &["本"], None),
        item("朋友", "ともだち", &["友達", "友だち"], None),
    ]
}
