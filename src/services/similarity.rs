use std::cmp::Ordering;

use crate::models::FoodItem;
use crate::services::encoder::FeatureEncoder;

/// Cosine of the angle between two vectors, in `[-1, 1]`
///
/// Returns 0 when either vector has zero magnitude. Vectors of different
/// lengths also score 0; in debug builds that case trips an assertion since
/// the encoder always emits the same length.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "feature vectors differ in length");
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// A catalog item paired with its similarity to the target
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem<'a> {
    pub item: &'a FoodItem,
    pub score: f64,
}

/// Scores every catalog item against `target` and keeps the best `k`
///
/// Items sharing the target's `name` are skipped, whatever their restaurant.
/// Ties keep catalog order.
pub fn rank_similar<'a>(
    encoder: &FeatureEncoder,
    target: &FoodItem,
    catalog: &'a [FoodItem],
    k: usize,
) -> Vec<ScoredItem<'a>> {
    let target_vector = encoder.encode(target);

    let mut scored: Vec<ScoredItem<'a>> = catalog
        .iter()
        .filter(|item| item.name != target.name)
        .map(|item| ScoredItem {
            item,
            score: cosine_similarity(target_vector.as_slice(), encoder.encode(item).as_slice()),
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    scored.truncate(k);
    scored
}

/// Finds the `k` catalog items most similar to `target`
pub fn find_similar_items(
    encoder: &FeatureEncoder,
    target: &FoodItem,
    catalog: &[FoodItem],
    k: usize,
) -> Vec<FoodItem> {
    rank_similar(encoder, target, catalog, k)
        .into_iter()
        .map(|scored| scored.item.clone())
        .collect()
}
