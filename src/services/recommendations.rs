use std::collections::HashMap;

use crate::models::{FoodItem, FoodKey};
use crate::services::encoder::FeatureEncoder;
use crate::services::similarity;

/// A candidate and the number of saved items that nominated it
#[derive(Debug, Clone, PartialEq)]
pub struct TallyEntry {
    pub item: FoodItem,
    pub votes: usize,
}

/// Vote counts keyed by `(name, restaurant)`
///
/// The first nomination of a key supplies its representative item and fixes
/// its position for tie-breaking.
#[derive(Debug, Default)]
pub struct RecommendationTally {
    index: HashMap<FoodKey, usize>,
    entries: Vec<TallyEntry>,
}

impl RecommendationTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one nomination of `item`
    pub fn vote(&mut self, item: &FoodItem) {
        let key = item.key();
        match self.index.get(&key).copied() {
            Some(position) => self.entries[position].votes += 1,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(TallyEntry {
                    item: item.clone(),
                    votes: 1,
                });
            }
        }
    }

    /// Votes recorded for `key`, 0 if it was never nominated
    pub fn votes(&self, key: &FoodKey) -> usize {
        self.index
            .get(key)
            .map(|&position| self.entries[position].votes)
            .unwrap_or(0)
    }

    /// Sum of all recorded votes
    pub fn total_votes(&self) -> usize {
        self.entries.iter().map(|entry| entry.votes).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries ordered by votes, most first; ties keep first-nomination order
    pub fn into_ranked(mut self) -> Vec<TallyEntry> {
        self.entries.sort_by(|a, b| b.votes.cmp(&a.votes));
        self.entries
    }
}

/// Nominates neighbours for every saved item and tallies the votes
pub fn tally_nominations(
    encoder: &FeatureEncoder,
    saved: &[FoodItem],
    catalog: &[FoodItem],
    k: usize,
) -> RecommendationTally {
    let mut tally = RecommendationTally::new();
    for saved_item in saved {
        for scored in similarity::rank_similar(encoder, saved_item, catalog, k) {
            tally.vote(scored.item);
        }
    }
    tally
}

/// Recommends up to `k` catalog items for a set of saved items
///
/// Each saved item nominates its own `k` nearest neighbours; candidates
/// nominated by more saved items rank higher.
pub fn get_recommendations(
    encoder: &FeatureEncoder,
    saved: &[FoodItem],
    catalog: &[FoodItem],
    k: usize,
) -> Vec<FoodItem> {
    if saved.is_empty() {
        return Vec::new();
    }

    let tally = tally_nominations(encoder, saved, catalog, k);

    tracing::debug!(
        saved = saved.len(),
        catalog = catalog.len(),
        candidates = tally.len(),
        votes = tally.total_votes(),
        "Tallied recommendation votes"
    );

    tally
        .into_ranked()
        .into_iter()
        .take(k)
        .map(|entry| entry.item)
        .collect()
}

/// Entry point bundling an encoder with both ranking operations
#[derive(Debug, Clone, Default)]
pub struct Recommender {
    encoder: FeatureEncoder,
}

impl Recommender {
    pub fn new(encoder: FeatureEncoder) -> Self {
        Self { encoder }
    }

    /// The `k` catalog items closest to `target`
    pub fn find_similar_items(
        &self,
        target: &FoodItem,
        catalog: &[FoodItem],
        k: usize,
    ) -> Vec<FoodItem> {
        similarity::find_similar_items(&self.encoder, target, catalog, k)
    }

    /// Up to `k` items voted for by the saved set
    pub fn get_recommendations(
        &self,
        saved: &[FoodItem],
        catalog: &[FoodItem],
        k: usize,
    ) -> Vec<FoodItem> {
        get_recommendations(&self.encoder, saved, catalog, k)
    }
}
