//! Random selection from the static vocabulary bank.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::evaluator::answers_match;
use crate::model::VocabularyItem;

/// Filter value that disables difficulty filtering.
pub const ALL_DIFFICULTIES: &str = "All";

fn passes(item: &VocabularyItem, filter: &str) -> bool {
    let filter = filter.trim();
    filter.is_empty()
        || answers_match(filter, ALL_DIFFICULTIES)
        || answers_match(item.difficulty_level.trim(), filter)
}

/// Items whose difficulty matches `filter` (empty or "All" keeps everything).
pub fn filter_by_difficulty<'a>(
    items: &'a [VocabularyItem],
    filter: &str,
) -> Vec<&'a VocabularyItem> {
    items.iter().filter(|item| passes(item, filter)).collect()
}

/// Pick one matching item uniformly at random, or `None` when nothing matches.
pub fn select_random<'a>(items: &'a [VocabularyItem], filter: &str) -> Option<&'a VocabularyItem> {
    select_random_with(&mut rand::thread_rng(), items, filter)
}

/// Like [`select_random`] with a caller-supplied random source.
pub fn select_random_with<'a, R: Rng + ?Sized>(
    rng: &mut R,
    items: &'a [VocabularyItem],
    filter: &str,
) -> Option<&'a VocabularyItem> {
    let candidates = filter_by_difficulty(items, filter);
    let picked = candidates.choose(rng).copied();
    if picked.is_none() {
        tracing::debug!(filter, total = items.len(), "no vocabulary item matches filter");
    }
    picked
}
