//! Per-learner session container.
//!
//! A [`Learner`] owns everything one browser session mutates: the reducer
//! state, the shuffle cache, the persisted reveal/mastery records and any
//! generated (custom) cards. The dataset catalog is never stored here; every
//! derivation takes it as an argument so a refreshed catalog is always seen.

use serde::Serialize;
use std::sync::Arc;

use crate::config::{MASTERED_RECORD_KEY, REVEALED_RECORD_KEY};
use crate::dataset::Catalog;
use crate::deck::{self, ShuffleCache};
use crate::domain::{Dataset, Item, ViewMode};
use crate::progress::{MasteredRecord, Persisted, ProgressStore, SavedProgress};
use crate::reducer::{reduce, Action, SessionState, CUSTOM_DATASET_ID};

/// Dataset selected before anything else is known
pub const DEFAULT_DATASET_ID: &str = "quotes";

/// Display name and category of the generated dataset
pub const CUSTOM_DATASET_NAME: &str = "自定义";

fn resolve<'a>(custom: &'a Option<Dataset>, catalog: &'a Catalog, id: &str) -> Option<&'a Dataset> {
    if id == CUSTOM_DATASET_ID {
        custom.as_ref()
    } else {
        catalog.get(id)
    }
}

pub struct Learner {
    state: SessionState,
    shuffle: ShuffleCache,
    saved: Persisted<SavedProgress>,
    mastered: Persisted<MasteredRecord>,
    custom: Option<Dataset>,
}

impl Learner {
    pub fn new(store: Arc<dyn ProgressStore>, catalog: &Catalog) -> Self {
        let initial = catalog
            .first()
            .map(|d| d.id.clone())
            .unwrap_or_else(|| DEFAULT_DATASET_ID.to_string());

        Self {
            state: SessionState::new(initial),
            shuffle: ShuffleCache::new(),
            saved: Persisted::new(store.clone(), REVEALED_RECORD_KEY, SavedProgress::default()),
            mastered: Persisted::new(store, MASTERED_RECORD_KEY, MasteredRecord::default()),
            custom: None,
        }
    }

    /// Create a learner and immediately load its persisted records.
    pub fn restore(store: Arc<dyn ProgressStore>, catalog: &Catalog) -> Self {
        let mut learner = Self::new(store, catalog);
        learner.hydrate(catalog);
        learner
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn mastered(&self) -> &MasteredRecord {
        self.mastered.get()
    }

    pub fn custom(&self) -> Option<&Dataset> {
        self.custom.as_ref()
    }

    pub fn has_custom_items(&self) -> bool {
        self.custom.as_ref().is_some_and(|d| !d.is_empty())
    }

    pub fn is_hydrated(&self) -> bool {
        self.saved.is_loaded() && self.mastered.is_loaded()
    }

    pub fn active_dataset<'a>(&'a self, catalog: &'a Catalog) -> Option<&'a Dataset> {
        resolve(&self.custom, catalog, &self.state.active_dataset_id)
    }

    /// Whether `id` names a dataset this learner can switch to.
    pub fn can_select(&self, id: &str, catalog: &Catalog) -> bool {
        if id == CUSTOM_DATASET_ID {
            self.has_custom_items()
        } else {
            catalog.contains(id)
        }
    }

    /// Read persisted records and reconcile them against the catalog.
    ///
    /// The saved dataset is kept if it still exists; otherwise the learner
    /// falls back to the first available dataset and the saved reveals,
    /// which belong to the vanished dataset, are dropped.
    pub fn hydrate(&mut self, catalog: &Catalog) {
        let saved = self.saved.read().clone();
        self.mastered.read();

        let action = if self.can_select(&saved.data_set, catalog) {
            Some(Action::LoadProgress {
                ids: saved.ids,
                dataset: Some(saved.data_set),
            })
        } else {
            catalog.first().map(|first| Action::LoadProgress {
                ids: Vec::new(),
                dataset: Some(first.id.clone()),
            })
        };

        match action {
            Some(action) => self.apply(action, catalog),
            None => tracing::debug!("No datasets available, nothing to restore"),
        }
    }

    /// Run one reducer action and its follow-up effects.
    ///
    /// Reveals of ids outside the active dataset are ignored.
    pub fn dispatch(&mut self, action: Action, catalog: &Catalog) {
        if let Action::Reveal(item_id) = &action {
            let item_id = *item_id;
            if !self.active_dataset(catalog).is_some_and(|d| d.contains(item_id)) {
                tracing::debug!("Ignoring reveal of unknown item {}", item_id);
                return;
            }
        }
        tracing::debug!("Dispatching {}", action.name());
        self.apply(action, catalog);
    }

    fn apply(&mut self, action: Action, catalog: &Catalog) {
        let visible_len = self.visible(catalog).len();
        let next = reduce(&self.state, &action, visible_len);

        let progress_changed = next.revealed_ids != self.state.revealed_ids
            || next.active_dataset_id != self.state.active_dataset_id;
        self.state = next;

        self.observe(catalog);
        if progress_changed {
            self.persist_progress();
        }
    }

    /// Make sure the active dataset has a shuffled order.
    pub fn observe(&mut self, catalog: &Catalog) {
        if let Some(dataset) = resolve(&self.custom, catalog, &self.state.active_dataset_id) {
            self.shuffle.ensure(dataset);
        }
    }

    fn persist_progress(&mut self) {
        // Generated cards live only in memory; saving progress for them
        // without the cards would restore an empty deck.
        if self.state.active_dataset_id == CUSTOM_DATASET_ID && !self.has_custom_items() {
            return;
        }
        self.saved.write(SavedProgress::new(
            &self.state.revealed_ids,
            &self.state.active_dataset_id,
        ));
    }

    /// Cards currently shown, in order.
    pub fn visible(&self, catalog: &Catalog) -> Vec<Item> {
        match self.active_dataset(catalog) {
            Some(dataset) => deck::visible_sequence(dataset, &self.shuffle, self.mastered.get()),
            None => Vec::new(),
        }
    }

    /// Card under the cursor in focus mode.
    pub fn current_item(&self, catalog: &Catalog) -> Option<Item> {
        let visible = self.visible(catalog);
        let index = self.state.effective_index(visible.len());
        visible.into_iter().nth(index)
    }

    pub fn progress(&self, catalog: &Catalog) -> f64 {
        deck::progress_percent(&self.state.revealed_ids, &self.visible(catalog))
    }

    /// Start the active dataset over: clear reveals, reshuffle.
    ///
    /// Mastered items stay mastered.
    pub fn reset(&mut self, catalog: &Catalog) {
        self.state = reduce(&self.state, &Action::Reset, 0);
        self.saved.clear();
        // Keep the active dataset across reloads
        self.persist_progress();

        if let Some(dataset) = resolve(&self.custom, catalog, &self.state.active_dataset_id) {
            self.shuffle.reshuffle(dataset);
        }
    }

    /// Switch datasets if `id` is selectable. Returns whether it was.
    pub fn select_dataset(&mut self, id: &str, catalog: &Catalog) -> bool {
        if !self.can_select(id, catalog) {
            return false;
        }
        self.dispatch(Action::SetDataset(id.to_string()), catalog);
        true
    }

    /// Mark an item of the active dataset as learned and hide it.
    ///
    /// Returns false when the id is not part of the active dataset.
    pub fn mark_mastered(&mut self, item_id: i64, catalog: &Catalog) -> bool {
        let dataset_id = self.state.active_dataset_id.clone();
        let in_dataset = self
            .active_dataset(catalog)
            .is_some_and(|d| d.contains(item_id));
        if !in_dataset {
            return false;
        }

        let len_before = self.visible(catalog).len();
        self.mastered.update(|m| {
            m.mark(&dataset_id, item_id);
        });

        let repaired = deck::repaired_index(self.state.current_index, len_before);
        if repaired != self.state.current_index {
            self.apply(Action::SetIndex(repaired), catalog);
        }
        true
    }

    /// Replace the generated dataset and switch to it.
    pub fn install_custom(&mut self, items: Vec<Item>, catalog: &Catalog) {
        let dataset = Dataset {
            id: CUSTOM_DATASET_ID.to_string(),
            name: CUSTOM_DATASET_NAME.to_string(),
            file_name: String::new(),
            category: CUSTOM_DATASET_NAME.to_string(),
            items,
        };
        self.shuffle.reshuffle(&dataset);
        self.custom = Some(dataset);
        self.dispatch(Action::SetCustomData, catalog);
    }

    pub fn snapshot(&self, catalog: &Catalog) -> LearnerSnapshot {
        let visible = self.visible(catalog);
        LearnerSnapshot {
            data_set: self.state.active_dataset_id.clone(),
            view_mode: self.state.view_mode,
            current_index: self.state.effective_index(visible.len()),
            revealed_ids: self.state.revealed_ids.iter().copied().collect(),
            progress: deck::progress_percent(&self.state.revealed_ids, &visible),
            has_custom_data: self.has_custom_items(),
            visible,
        }
    }
}

/// JSON view of a learner's session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerSnapshot {
    pub data_set: String,
    pub view_mode: ViewMode,
    pub current_index: usize,
    pub revealed_ids: Vec<i64>,
    pub progress: f64,
    pub has_custom_data: bool,
    pub visible: Vec<Item>,
}
