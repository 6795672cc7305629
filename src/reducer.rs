//! Session reducer: a pure state transition over [`SessionState`].
//!
//! `Next`/`Prev` wrap around the visible sequence, whose length the caller
//! passes in explicitly; the reducer never looks at datasets itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::domain::ViewMode;

/// Dataset id reserved for generated cards
pub const CUSTOM_DATASET_ID: &str = "custom";

/// Per-learner navigation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
  pub active_dataset_id: String,
  /// Ids of the active dataset whose answers have been shown
  pub revealed_ids: BTreeSet<i64>,
  pub view_mode: ViewMode,
  pub current_index: usize,
}

impl SessionState {
  pub fn new(active_dataset_id: impl Into<String>) -> Self {
    Self {
      active_dataset_id: active_dataset_id.into(),
      revealed_ids: BTreeSet::new(),
      view_mode: ViewMode::Focus,
      current_index: 0,
    }
  }

  pub fn is_revealed(&self, item_id: i64) -> bool {
    self.revealed_ids.contains(&item_id)
  }

  /// Index clamped into `0..visible_len` (0 for an empty sequence)
  pub fn effective_index(&self, visible_len: usize) -> usize {
    if visible_len == 0 {
      0
    } else {
      self.current_index % visible_len
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Reveal(i64),
  SetViewMode(ViewMode),
  SetIndex(usize),
  SetDataset(String),
  SetCustomData,
  Next,
  Prev,
  Reset,
  LoadProgress {
    ids: Vec<i64>,
    dataset: Option<String>,
  },
}

impl Action {
  pub fn name(&self) -> &'static str {
    match self {
      Action::Reveal(_) => "REVEAL",
      Action::SetViewMode(_) => "SET_VIEW_MODE",
      Action::SetIndex(_) => "SET_INDEX",
      Action::SetDataset(_) => "SET_DATASET",
      Action::SetCustomData => "SET_CUSTOM_DATA",
      Action::Next => "NEXT",
      Action::Prev => "PREV",
      Action::Reset => "RESET",
      Action::LoadProgress { .. } => "LOAD_PROGRESS",
    }
  }
}

/// Apply one action. Total: every action yields a state.
pub fn reduce(state: &SessionState, action: &Action, visible_len: usize) -> SessionState {
  let len = visible_len.max(1);

  match action {
    Action::Reveal(id) => {
      let mut next = state.clone();
      next.revealed_ids.insert(*id);
      next
    }
    Action::SetViewMode(mode) => SessionState {
      view_mode: *mode,
      ..state.clone()
    },
    Action::SetIndex(index) => SessionState {
      current_index: *index,
      ..state.clone()
    },
    Action::SetDataset(id) => SessionState {
      active_dataset_id: id.clone(),
      current_index: 0,
      revealed_ids: BTreeSet::new(),
      ..state.clone()
    },
    Action::SetCustomData => SessionState {
      active_dataset_id: CUSTOM_DATASET_ID.to_string(),
      current_index: 0,
      revealed_ids: BTreeSet::new(),
      ..state.clone()
    },
    Action::Next => SessionState {
      current_index: (state.current_index % len + 1) % len,
      ..state.clone()
    },
    Action::Prev => SessionState {
      current_index: (state.current_index % len + len - 1) % len,
      ..state.clone()
    },
    Action::Reset => SessionState::new(state.active_dataset_id.clone()),
    Action::LoadProgress { ids, dataset } => SessionState {
      revealed_ids: ids.iter().copied().collect(),
      active_dataset_id: dataset
        .clone()
        .unwrap_or_else(|| state.active_dataset_id.clone()),
      ..state.clone()
    },
  }
}
