//! The two records persisted per learner.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Revealed ids of the active dataset plus which dataset that was.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedProgress {
    #[serde(default)]
    pub ids: Vec<i64>,
    #[serde(rename = "dataSet", default)]
    pub data_set: String,
}

impl SavedProgress {
    pub fn new(revealed: &BTreeSet<i64>, data_set: &str) -> Self {
        Self {
            ids: revealed.iter().copied().collect(),
            data_set: data_set.to_string(),
        }
    }
}

impl Default for SavedProgress {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            data_set: crate::learner::DEFAULT_DATASET_ID.to_string(),
        }
    }
}

/// Item ids marked as learned, per dataset id.
///
/// Only ever grows; nothing in the app removes an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MasteredRecord(BTreeMap<String, Vec<i64>>);

impl MasteredRecord {
    pub fn ids_for(&self, dataset_id: &str) -> &[i64] {
        self.0.get(dataset_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_mastered(&self, dataset_id: &str, item_id: i64) -> bool {
        self.ids_for(dataset_id).contains(&item_id)
    }

    /// Record an item as mastered. Returns false if it already was.
    pub fn mark(&mut self, dataset_id: &str, item_id: i64) -> bool {
        let ids = self.0.entry(dataset_id.to_string()).or_default();
        if ids.contains(&item_id) {
            return false;
        }
        ids.push(item_id);
        true
    }

    pub fn total(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_progress_wire_format() {
        let revealed: BTreeSet<i64> = [3, 1].into_iter().collect();
        let json = serde_json::to_string(&SavedProgress::new(&revealed, "poems")).unwrap();
        assert_eq!(json, r#"{"ids":[1,3],"dataSet":"poems"}"#);
    }

    #[test]
    fn test_saved_progress_tolerates_missing_fields() {
        let saved: SavedProgress = serde_json::from_str("{}").unwrap();
        assert!(saved.ids.is_empty());
        assert_eq!(saved.data_set, "");
    }

    #[test]
    fn test_mastered_mark_is_scoped_and_deduplicated() {
        let mut mastered = MasteredRecord::default();
        assert!(mastered.mark("quotes", 2));
        assert!(!mastered.mark("quotes", 2));
        assert!(mastered.mark("poems", 2));

        assert_eq!(mastered.ids_for("quotes"), &[2]);
        assert!(mastered.is_mastered("poems", 2));
        assert!(!mastered.is_mastered("other", 2));
        assert_eq!(mastered.total(), 2);
    }

    #[test]
    fn test_mastered_wire_format() {
        let record: MasteredRecord = serde_json::from_str(r#"{"quotes":[1,5]}"#).unwrap();
        assert_eq!(record.ids_for("quotes"), &[1, 5]);
        assert_eq!(serde_json::to_string(&record).unwrap(), r#"{"quotes":[1,5]}"#);
    }
}
