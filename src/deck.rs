//! Shuffle/filter pipeline: derives the ordered cards a learner actually sees.
//!
//! A dataset is shuffled once, on first visit, and the permutation is kept
//! until a reset asks for a new one. Mastered items are filtered out of that
//! permutation on every derivation, so the order stays stable as cards go.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashMap};

use crate::domain::{Dataset, Item};
use crate::progress::MasteredRecord;

/// Uniformly random permutation (Fisher-Yates) of a dataset's items.
pub fn shuffle_items<R: Rng + ?Sized>(items: &[Item], rng: &mut R) -> Vec<Item> {
    let mut shuffled = items.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

/// Per-dataset shuffled order, computed lazily.
#[derive(Debug, Clone, Default)]
pub struct ShuffleCache {
    orders: HashMap<String, Vec<Item>>,
}

impl ShuffleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shuffle the dataset unless an order is already cached.
    pub fn ensure(&mut self, dataset: &Dataset) {
        self.ensure_with(dataset, &mut rand::rng());
    }

    pub fn ensure_with<R: Rng + ?Sized>(&mut self, dataset: &Dataset, rng: &mut R) {
        if self.orders.contains_key(&dataset.id) || dataset.is_empty() {
            return;
        }
        self.orders
            .insert(dataset.id.clone(), shuffle_items(&dataset.items, rng));
    }

    /// Replace the cached order with a fresh permutation.
    pub fn reshuffle(&mut self, dataset: &Dataset) {
        self.reshuffle_with(dataset, &mut rand::rng());
    }

    pub fn reshuffle_with<R: Rng + ?Sized>(&mut self, dataset: &Dataset, rng: &mut R) {
        self.orders
            .insert(dataset.id.clone(), shuffle_items(&dataset.items, rng));
    }

    pub fn order(&self, dataset_id: &str) -> Option<&[Item]> {
        self.orders.get(dataset_id).map(Vec::as_slice)
    }

    pub fn is_shuffled(&self, dataset_id: &str) -> bool {
        self.orders.contains_key(dataset_id)
    }
}

/// Cards to show for a dataset: cached order (or file order if not yet
/// shuffled) without the dataset's mastered ids.
pub fn visible_sequence(
    dataset: &Dataset,
    cache: &ShuffleCache,
    mastered: &MasteredRecord,
) -> Vec<Item> {
    let base = cache.order(&dataset.id).unwrap_or(&dataset.items);
    let excluded = mastered.ids_for(&dataset.id);

    base.iter()
        .filter(|item| !excluded.contains(&item.id))
        .cloned()
        .collect()
}

/// Percentage (0-100): revealed ids over the length of the visible sequence.
///
/// Mastering a revealed card shrinks the sequence but keeps the reveal, so the
/// ratio can pass 1; it is capped at 100.
pub fn progress_percent(revealed: &BTreeSet<i64>, visible: &[Item]) -> f64 {
    if visible.is_empty() {
        return 0.0;
    }
    (revealed.len() as f64 / visible.len() as f64 * 100.0).min(100.0)
}

/// Index to move to after the card at `current` was mastered out of a
/// sequence that had `len_before` cards.
pub fn repaired_index(current: usize, len_before: usize) -> usize {
    if current > 0 && current + 1 >= len_before {
        current - 1
    } else {
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset(id: &str, ids: &[i64]) -> Dataset {
        Dataset {
            id: id.to_string(),
            name: id.to_string(),
            file_name: format!("{}.json", id),
            category: "其他".to_string(),
            items: ids
                .iter()
                .map(|&i| Item::new(i, format!("Q{}", i), format!("A{}", i)))
                .collect(),
        }
    }

    fn ids(items: &[Item]) -> Vec<i64> {
        items.iter().map(|i| i.id).collect()
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let d = dataset("quotes", &[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut rng = StdRng::seed_from_u64(7);
        let mut shuffled = ids(&shuffle_items(&d.items, &mut rng));
        shuffled.sort();
        assert_eq!(shuffled, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_shuffle_covers_every_position() {
        // Each item should land in each slot at least once over many shuffles
        let d = dataset("quotes", &[1, 2, 3]);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [[false; 3]; 3];
        for _ in 0..300 {
            for (pos, item) in shuffle_items(&d.items, &mut rng).iter().enumerate() {
                seen[(item.id - 1) as usize][pos] = true;
            }
        }
        assert!(seen.iter().flatten().all(|&s| s));
    }

    #[test]
    fn test_ensure_is_cached() {
        let d = dataset("quotes", &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        let mut cache = ShuffleCache::new();
        let mut rng = StdRng::seed_from_u64(1);

        cache.ensure_with(&d, &mut rng);
        let first = ids(cache.order("quotes").unwrap());
        for _ in 0..5 {
            cache.ensure_with(&d, &mut rng);
        }
        assert_eq!(ids(cache.order("quotes").unwrap()), first);
    }

    #[test]
    fn test_reshuffle_replaces_order() {
        let d = dataset("quotes", &(1..=20).collect::<Vec<_>>());
        let mut cache = ShuffleCache::new();
        let mut rng = StdRng::seed_from_u64(3);

        cache.ensure_with(&d, &mut rng);
        let first = ids(cache.order("quotes").unwrap());
        cache.reshuffle_with(&d, &mut rng);
        assert_ne!(ids(cache.order("quotes").unwrap()), first);
    }

    #[test]
    fn test_empty_dataset_is_not_cached() {
        let d = dataset("empty", &[]);
        let mut cache = ShuffleCache::new();
        cache.ensure(&d);
        assert!(!cache.is_shuffled("empty"));
    }

    #[test]
    fn test_visible_uses_file_order_before_shuffle() {
        let d = dataset("quotes", &[3, 1, 2]);
        let visible = visible_sequence(&d, &ShuffleCache::new(), &MasteredRecord::default());
        assert_eq!(ids(&visible), vec![3, 1, 2]);
    }

    #[test]
    fn test_mastered_items_are_filtered_in_order() {
        let d = dataset("quotes", &[1, 2, 3, 4, 5]);
        let mut cache = ShuffleCache::new();
        cache.ensure_with(&d, &mut StdRng::seed_from_u64(9));
        let order = ids(cache.order("quotes").unwrap());

        let mut mastered = MasteredRecord::default();
        mastered.mark("quotes", 2);
        mastered.mark("quotes", 4);
        mastered.mark("poems", 1);

        let expected: Vec<i64> = order.into_iter().filter(|id| *id != 2 && *id != 4).collect();
        assert_eq!(ids(&visible_sequence(&d, &cache, &mastered)), expected);
    }

    #[test]
    fn test_progress_scenario() {
        let d = dataset("quotes", &[1, 2, 3]);
        let mut revealed = BTreeSet::new();

        revealed.insert(2);
        let pct = progress_percent(&revealed, &d.items);
        assert!((pct - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(pct.round(), 33.0);

        revealed.insert(1);
        revealed.insert(3);
        assert_eq!(progress_percent(&revealed, &d.items), 100.0);
    }

    #[test]
    fn test_progress_counts_reveals_over_visible_length() {
        let revealed: BTreeSet<i64> = [1, 2].into_iter().collect();
        assert_eq!(progress_percent(&revealed, &[]), 0.0);

        // Item 1 was mastered after being revealed
        let d = dataset("quotes", &[2, 3]);
        assert_eq!(progress_percent(&revealed, &d.items), 100.0);

        let d = dataset("quotes", &[2, 3, 4, 5]);
        assert_eq!(progress_percent(&revealed, &d.items), 50.0);

        let revealed: BTreeSet<i64> = [1, 2, 3].into_iter().collect();
        let d = dataset("quotes", &[3]);
        assert_eq!(progress_percent(&revealed, &d.items), 100.0);
    }

    #[test]
    fn test_repaired_index() {
        assert_eq!(repaired_index(0, 1), 0);
        assert_eq!(repaired_index(0, 5), 0);
        assert_eq!(repaired_index(2, 5), 2);
        assert_eq!(repaired_index(4, 5), 3);
        assert_eq!(repaired_index(3, 4), 2);
    }
}
