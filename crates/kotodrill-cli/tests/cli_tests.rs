//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MOCK_QUESTION: &str =
    r#"QUESTION: 駅___行きます。\nANSWER: に\nEXPLANATION: The particle marks the destination.\n"#;

fn kotodrill() -> Command {
    #[allow(deprecated)]
    Command::cargo_bin("kotodrill").unwrap()
}

/// Write a config pointing at `<dir>/data` and return its path.
fn write_config(dir: &Path, runtime: &str) -> PathBuf {
    let path = dir.join("kotodrill.toml");
    let data_dir = dir.join("data").display().to_string().replace('\\', "/");
    std::fs::write(
        &path,
        format!("data_dir = \"{data_dir}\"\n\n[runtime]\n{runtime}\n"),
    )
    .unwrap();
    path
}

fn mock_config(dir: &Path, response: &str) -> PathBuf {
    write_config(
        dir,
        &format!("backend = \"mock\"\nmock_response = \"{response}\""),
    )
}

fn model_file(dir: &Path) -> PathBuf {
    let path = dir.join("model.gguf");
    std::fs::write(&path, b"GGUF").unwrap();
    path
}

fn write_week(dir: &Path, week: u32, json: &str) {
    let data = dir.join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join(format!("week{week}.json")), json).unwrap();
}

const WEEK_ONE: &str = r#"[
  {
    "chineseText": "学生",
    "japaneseAnswer": "がくせい",
    "alternativeAnswers": ["学生"],
    "difficultyLevel": "Beginner",
    "hint": "a person who studies",
    "weekNumber": 1
  }
]"#;

#[test]
fn help_output() {
    kotodrill()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Japanese grammar and vocabulary drills"));
}

#[test]
fn version_output() {
    kotodrill()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kotodrill"));
}

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    kotodrill()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created kotodrill.toml"))
        .stdout(predicate::str::contains("week1.json"));

    assert!(dir.path().join("kotodrill.toml").exists());
    assert!(dir.path().join("kotodrill-data/week1.json").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    kotodrill()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    kotodrill()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn weeks_after_init() {
    let dir = TempDir::new().unwrap();

    kotodrill()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    kotodrill()
        .current_dir(dir.path())
        .arg("weeks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Week"))
        .stdout(predicate::str::contains("Beginner"))
        .stdout(predicate::str::contains("5"));
}

#[test]
fn weeks_with_empty_data_dir() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");

    kotodrill()
        .arg("--config")
        .arg(&config)
        .arg("weeks")
        .assert()
        .success()
        .stdout(predicate::str::contains("No vocabulary weeks"));
}

#[test]
fn vocab_correct_answer_updates_progress() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    write_week(dir.path(), 1, WEEK_ONE);

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["vocab", "--week", "1"])
        .write_stdin(" がくせい \n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Translate into Japanese: 学生"))
        .stdout(predicate::str::contains("Hint: a person who studies"))
        .stdout(predicate::str::contains(
            "Correct! The answer is: がくせい (Also acceptable: 学生)",
        ));

    kotodrill()
        .arg("--config")
        .arg(&config)
        .arg("progress")
        .assert()
        .success()
        .stdout(predicate::str::contains("100.0%"));
}

#[test]
fn vocab_incorrect_answer() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    write_week(dir.path(), 1, WEEK_ONE);

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["vocab", "--week", "1"])
        .write_stdin("せんせい\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Incorrect. The correct answer is: がくせい",
        ));

    let progress =
        std::fs::read_to_string(dir.path().join("data").join("progress.json")).unwrap();
    assert!(progress.contains("\"incorrect\": 1"));
}

#[test]
fn vocab_without_items() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["vocab", "--week", "9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No vocabulary found for week 9."));
}

#[test]
fn vocab_filter_without_match() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    write_week(dir.path(), 1, WEEK_ONE);

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["vocab", "--week", "1", "--difficulty", "Advanced"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with difficulty 'Advanced'"));
}

#[test]
fn data_dir_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    let other = dir.path().join("elsewhere");
    std::fs::create_dir_all(&other).unwrap();
    std::fs::write(other.join("week3.json"), WEEK_ONE).unwrap();

    kotodrill()
        .arg("--config")
        .arg(&config)
        .arg("--data-dir")
        .arg(&other)
        .arg("weeks")
        .assert()
        .success()
        .stdout(predicate::str::contains("Week"))
        .stdout(predicate::str::contains("No vocabulary weeks").not());
}

#[test]
fn progress_reset() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    write_week(dir.path(), 1, WEEK_ONE);

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["vocab", "--week", "1"])
        .write_stdin("がくせい\n")
        .assert()
        .success();

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["progress", "--reset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Progress reset."))
        .stdout(predicate::str::contains("0.0%"));
}

#[test]
fn generate_with_mock_backend() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), MOCK_QUESTION);
    let model = model_file(dir.path());

    kotodrill()
        .arg("--config")
        .arg(&config)
        .arg("generate")
        .arg("--model")
        .arg(&model)
        .args(["--count", "2", "--difficulty", "intermediate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2/2] Intermediate"))
        .stdout(predicate::str::contains("駅___行きます。"))
        .stdout(predicate::str::contains("Answer: に"))
        .stdout(predicate::str::contains(
            "Explanation: The particle marks the destination.",
        ));

    let log = std::fs::read_to_string(dir.path().join("data").join("questions.json")).unwrap();
    assert_eq!(log.matches("駅___行きます。").count(), 2);
}

#[test]
fn generate_quiz_reads_answers() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), MOCK_QUESTION);
    let model = model_file(dir.path());

    kotodrill()
        .arg("--config")
        .arg(&config)
        .arg("generate")
        .arg("--model")
        .arg(&model)
        .args(["--count", "2", "--quiz"])
        .write_stdin("に\nを\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Correct! The answer is: に"))
        .stdout(predicate::str::contains("Incorrect. The correct answer is: に"))
        .stdout(predicate::str::contains("Session: 1/2 correct"));
}

#[test]
fn generate_falls_back_on_unusable_output() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), "I am not sure what you want.");
    let model = model_file(dir.path());

    kotodrill()
        .arg("--config")
        .arg(&config)
        .arg("generate")
        .arg("--model")
        .arg(&model)
        .assert()
        .success()
        .stdout(predicate::str::contains("私は毎日学校___行きます。"))
        .stdout(predicate::str::contains("Answer: に"));
}

#[test]
fn generate_missing_model_file() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), MOCK_QUESTION);

    kotodrill()
        .arg("--config")
        .arg(&config)
        .arg("generate")
        .arg("--model")
        .arg(dir.path().join("absent.gguf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load model"))
        .stderr(predicate::str::contains("download a GGUF model file"));
}

#[test]
fn generate_without_model_configured() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(dir.path(), MOCK_QUESTION);

    kotodrill()
        .arg("--config")
        .arg(&config)
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no model file given"));
}

#[test]
fn missing_config_file() {
    kotodrill()
        .arg("--config")
        .arg("no_such_config.toml")
        .arg("weeks")
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn dataset_add_update_list_delete() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["dataset", "add", "--week", "2", "--chinese", "水", "--answer", "みず"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added '水' to week 2."));

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args([
            "dataset",
            "add",
            "--week",
            "2",
            "--chinese",
            "水",
            "--answer",
            "みず",
            "--alternates",
            "水, お水",
            "--difficulty",
            "intermediate",
            "--hint",
            "you drink it",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated '水' in week 2."));

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["dataset", "list", "--week", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("みず"))
        .stdout(predicate::str::contains("水, お水"))
        .stdout(predicate::str::contains("Intermediate"))
        .stdout(predicate::str::contains("you drink it"));

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["dataset", "delete", "--week", "2", "--chinese", "水", "--answer", "みず"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted '水' from week 2."));

    let week = std::fs::read_to_string(dir.path().join("data").join("week2.json")).unwrap();
    assert_eq!(week.trim(), "[]");
}

#[test]
fn dataset_delete_missing_item_fails() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    write_week(dir.path(), 1, WEEK_ONE);

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["dataset", "delete", "--week", "1", "--chinese", "学生", "--answer", "せんせい"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no item '学生' with answer 'せんせい' in week 1"));
}

#[test]
fn dataset_add_rejects_blank_answer() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["dataset", "add", "--week", "1", "--chinese", "书", "--answer", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be non-empty"));
}

#[test]
fn dataset_create_week_picks_next_number() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path(), "");
    write_week(dir.path(), 1, WEEK_ONE);
    write_week(dir.path(), 3, "[]");

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["dataset", "create-week"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created week 4"));
    assert!(dir.path().join("data").join("week4.json").exists());

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["dataset", "create-week", "--week", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("week 3 already exists"));

    kotodrill()
        .arg("--config")
        .arg(&config)
        .args(["dataset", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("がくせい"));
}
