//! Weekly vocabulary files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use kotodrill_core::selector::select_random;
use kotodrill_core::VocabularyItem;

use crate::{read_json_or_default, write_json};

/// Reads and writes `week{N}.json` files in one data directory.
#[derive(Debug, Clone)]
pub struct VocabularyRepository {
    dir: PathBuf,
}

impl VocabularyRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn week_path(&self, week: u32) -> PathBuf {
        self.dir.join(format!("week{week}.json"))
    }

    /// Items for `week`. A missing file is an empty week; a corrupt one is
    /// logged and treated the same way.
    pub fn load_week(&self, week: u32) -> Vec<VocabularyItem> {
        let mut items: Vec<VocabularyItem> = read_json_or_default(&self.week_path(week));
        for item in &mut items {
            if item.week_number == 0 {
                item.week_number = week;
            }
        }
        items
    }

    /// Items from every week, in week order.
    pub fn load_all(&self) -> Result<Vec<VocabularyItem>> {
        Ok(self
            .list_weeks()?
            .into_iter()
            .flat_map(|week| self.load_week(week))
            .collect())
    }

    /// Week numbers that have a file, ascending.
    pub fn list_weeks(&self) -> Result<Vec<u32>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut weeks = Vec::new();
        for entry in std::fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read directory: {}", self.dir.display()))?
        {
            let path = entry?.path();
            if let Some(week) = week_number_of(&path) {
                weeks.push(week);
            }
        }
        weeks.sort_unstable();
        Ok(weeks)
    }

    /// Replace the contents of `week` with `items`.
    pub fn save_week(&self, week: u32, items: &[VocabularyItem]) -> Result<()> {
        write_json(&self.week_path(week), items)?;
        tracing::debug!(week, count = items.len(), "saved vocabulary week");
        Ok(())
    }

    /// Store `item` in `week`, replacing the item with the same Chinese text
    /// if there is one. Returns `true` when an existing item was replaced.
    pub fn add_or_update_item(&self, week: u32, mut item: VocabularyItem) -> Result<bool> {
        item.week_number = week;

        let mut items = self.load_week(week);
        let updated = match items
            .iter_mut()
            .find(|i| i.chinese_text == item.chinese_text)
        {
            Some(existing) => {
                *existing = item;
                true
            }
            None => {
                items.push(item);
                false
            }
        };
        self.save_week(week, &items)?;
        Ok(updated)
    }

    /// Remove the first item of `week` with the same Chinese text, answer and
    /// week number as `item`. Returns whether anything was removed.
    pub fn delete_item(&self, week: u32, item: &VocabularyItem) -> Result<bool> {
        let mut items = self.load_week(week);
        let Some(pos) = items.iter().position(|i| {
            i.chinese_text == item.chinese_text
                && i.japanese_answer == item.japanese_answer
                && i.week_number == item.week_number
        }) else {
            return Ok(false);
        };
        items.remove(pos);
        self.save_week(week, &items)?;
        Ok(true)
    }

    /// Create an empty `week`. Fails if the week already has a file.
    pub fn create_week(&self, week: u32) -> Result<()> {
        if self.week_path(week).exists() {
            anyhow::bail!("week {week} already exists");
        }
        self.save_week(week, &[])
    }

    /// One past the highest existing week, or 1 when there are none.
    pub fn next_week_number(&self) -> Result<u32> {
        Ok(self.list_weeks()?.last().map_or(1, |w| w + 1))
    }

    /// Draw one item of `week` at random, honoring the difficulty filter
    /// (`"All"` or empty keeps everything).
    pub fn pick_random(&self, week: u32, difficulty: &str) -> Option<VocabularyItem> {
        let items = self.load_week(week);
        select_random(&items, difficulty).cloned()
    }
}

fn week_number_of(path: &Path) -> Option<u32> {
    if path.extension()? != "json" {
        return None;
    }
    path.file_stem()?
        .to_str()?
        .strip_prefix("week")?
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(text: &str, answer: &str, level: &str, week: u32) -> VocabularyItem {
        VocabularyItem {
            chinese_text: text.into(),
            japanese_answer: answer.into(),
            alternative_answers: vec![],
            difficulty_level: level.into(),
            hint: None,
            week_number: week,
        }
    }

    fn repo() -> (tempfile::TempDir, VocabularyRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = VocabularyRepository::new(dir.path().join("data"));
        (dir, repo)
    }

    #[test]
    fn missing_week_is_empty() {
        let (_dir, repo) = repo();
        assert!(repo.load_week(3).is_empty());
        assert!(repo.list_weeks().unwrap().is_empty());
        assert!(repo.load_all().unwrap().is_empty());
    }

    #[test]
    fn save_and_load_week() {
        let (_dir, repo) = repo();
        let items = vec![item("学生", "がくせい", "Beginner", 1), item("先生", "せんせい", "Beginner", 1)];
        repo.save_week(1, &items).unwrap();

        assert_eq!(repo.load_week(1), items);
        let raw = std::fs::read_to_string(repo.week_path(1)).unwrap();
        assert!(raw.contains("\"chineseText\": \"学生\""));
    }

    #[test]
    fn corrupt_week_is_empty() {
        let (_dir, repo) = repo();
        std::fs::create_dir_all(repo.dir()).unwrap();
        std::fs::write(repo.week_path(2), "{ not json").unwrap();
        assert!(repo.load_week(2).is_empty());
    }

    #[test]
    fn week_number_filled_from_file_name() {
        let (_dir, repo) = repo();
        std::fs::create_dir_all(repo.dir()).unwrap();
        std::fs::write(
            repo.week_path(4),
            r#"[{"ChineseText":"水","JapaneseAnswer":"みず"}]"#,
        )
        .unwrap();

        let items = repo.load_week(4);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].week_number, 4);
        assert_eq!(items[0].difficulty_level, "Beginner");
    }

    #[test]
    fn lists_weeks_sorted_and_ignores_other_files() {
        let (_dir, repo) = repo();
        for week in [10, 2, 1] {
            repo.save_week(week, &[]).unwrap();
        }
        std::fs::write(repo.dir().join("progress.json"), "{}").unwrap();
        std::fs::write(repo.dir().join("weekly.json"), "[]").unwrap();
        std::fs::write(repo.dir().join("week5.txt"), "").unwrap();

        assert_eq!(repo.list_weeks().unwrap(), vec![1, 2, 10]);
    }

    #[test]
    fn load_all_spans_weeks() {
        let (_dir, repo) = repo();
        repo.save_week(2, &[item("二", "に", "Beginner", 2)]).unwrap();
        repo.save_week(1, &[item("一", "いち", "Beginner", 1)]).unwrap();

        let all = repo.load_all().unwrap();
        let texts: Vec<&str> = all.iter().map(|i| i.chinese_text.as_str()).collect();
        assert_eq!(texts, vec!["一", "二"]);
    }

    #[test]
    fn delete_removes_matching_item() {
        let (_dir, repo) = repo();
        let keep = item("先生", "せんせい", "Beginner", 1);
        let gone = item("学生", "がくせい", "Beginner", 1);
        repo.save_week(1, &[gone.clone(), keep.clone()]).unwrap();

        assert!(repo.delete_item(1, &gone).unwrap());
        assert_eq!(repo.load_week(1), vec![keep]);
        assert!(!repo.delete_item(1, &gone).unwrap());
    }

    #[test]
    fn add_or_update_replaces_by_chinese_text() {
        let (_dir, repo) = repo();
        assert!(!repo.add_or_update_item(3, item("水", "みず", "Beginner", 0)).unwrap());
        assert!(!repo.add_or_update_item(3, item("本", "ほん", "Beginner", 3)).unwrap());

        let mut fixed = item("水", "みず", "Intermediate", 3);
        fixed.alternative_answers = vec!["水".into()];
        assert!(repo.add_or_update_item(3, fixed.clone()).unwrap());

        let week = repo.load_week(3);
        assert_eq!(week.len(), 2);
        assert_eq!(week[0], fixed);
        assert!(week.iter().all(|i| i.week_number == 3));
    }

    #[test]
    fn next_week_number_follows_highest() {
        let (_dir, repo) = repo();
        assert_eq!(repo.next_week_number().unwrap(), 1);
        repo.create_week(1).unwrap();
        repo.create_week(4).unwrap();
        assert_eq!(repo.next_week_number().unwrap(), 5);
    }

    #[test]
    fn create_week_refuses_existing() {
        let (_dir, repo) = repo();
        repo.create_week(7).unwrap();
        assert!(repo.load_week(7).is_empty());

        let err = repo.create_week(7).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn pick_random_honors_filter() {
        let (_dir, repo) = repo();
        repo.save_week(
            1,
            &[item("一", "いち", "Beginner", 1), item("難", "むずかしい", "Advanced", 1)],
        )
        .unwrap();

        for _ in 0..20 {
            assert_eq!(repo.pick_random(1, "advanced").unwrap().chinese_text, "難");
        }
        assert!(repo.pick_random(1, "Intermediate").is_none());
        assert!(repo.pick_random(9, "All").is_none());
    }
}
