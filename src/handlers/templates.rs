//! Template, view and form structs for the HTML pages.

use askama::Template;
use serde::Deserialize;

use crate::config::DEFAULT_GENERATE_COUNT;
use crate::dataset::Catalog;
use crate::domain::{Item, ViewMode};
use crate::filters;
use crate::learner::{Learner, CUSTOM_DATASET_NAME};
use crate::reducer::CUSTOM_DATASET_ID;

/// One sidebar link
pub struct SidebarEntry {
  pub id: String,
  pub name: String,
  pub count: usize,
  pub active: bool,
}

pub struct SidebarGroup {
  pub category: String,
  pub entries: Vec<SidebarEntry>,
}

pub struct CardView {
  pub id: i64,
  pub question: String,
  pub answer: String,
  pub author: String,
  pub revealed: bool,
}

impl CardView {
  fn from_item(item: &Item, learner: &Learner) -> Self {
    Self {
      id: item.id,
      question: item.question.clone(),
      answer: item.answer.clone(),
      author: item.author_or_anonymous().to_string(),
      revealed: learner.state().is_revealed(item.id),
    }
  }
}

#[derive(Template)]
#[template(path = "study.html")]
pub struct StudyTemplate {
  pub groups: Vec<SidebarGroup>,
  pub custom: Option<SidebarEntry>,
  pub dataset_name: String,
  pub is_focus: bool,
  pub progress: u32,
  pub cards: Vec<CardView>,
  pub current: Option<CardView>,
  pub position: usize,
  pub total: usize,
  pub revealed_count: usize,
  pub toast: Option<String>,
}

impl StudyTemplate {
  /// Build the page for a learner's current state.
  pub fn for_learner(learner: &Learner, catalog: &Catalog, toast: Option<String>) -> Self {
    let active_id = learner.state().active_dataset_id.as_str();

    let groups = catalog
      .grouped()
      .into_iter()
      .map(|group| SidebarGroup {
        category: group.category.to_string(),
        entries: group
          .datasets
          .into_iter()
          .map(|d| SidebarEntry {
            id: d.id.clone(),
            name: d.name.clone(),
            count: d.len(),
            active: d.id == active_id,
          })
          .collect(),
      })
      .collect();

    let custom = learner.custom().filter(|d| !d.is_empty()).map(|d| SidebarEntry {
      id: CUSTOM_DATASET_ID.to_string(),
      name: CUSTOM_DATASET_NAME.to_string(),
      count: d.len(),
      active: active_id == CUSTOM_DATASET_ID,
    });

    let dataset_name = learner
      .active_dataset(catalog)
      .map(|d| d.name.clone())
      .unwrap_or_default();

    let visible = learner.visible(catalog);
    let index = learner.state().effective_index(visible.len());
    let cards: Vec<CardView> = visible
      .iter()
      .map(|item| CardView::from_item(item, learner))
      .collect();
    let current = visible
      .get(index)
      .map(|item| CardView::from_item(item, learner));

    Self {
      groups,
      custom,
      dataset_name,
      is_focus: learner.state().view_mode == ViewMode::Focus,
      progress: learner.progress(catalog).round() as u32,
      total: cards.len(),
      position: if cards.is_empty() { 0 } else { index + 1 },
      cards,
      current,
      revealed_count: learner.state().revealed_ids.len(),
      toast,
    }
  }
}

#[derive(Template)]
#[template(path = "generate.html")]
pub struct GenerateTemplate {
  pub content: String,
  pub count: u32,
  pub error: Option<String>,
  pub configured: bool,
}

/// Query string of the study page
#[derive(Debug, Default, Deserialize)]
pub struct StudyQuery {
  #[serde(default)]
  pub cheer: Option<u8>,
}

/// Form carrying a single item id
#[derive(Debug, Deserialize)]
pub struct ItemForm {
  pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct DatasetForm {
  pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ViewModeForm {
  pub mode: String,
}

/// A blank or unparsable `count` falls back to the default.
#[derive(Debug, Deserialize)]
pub struct GenerateForm {
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub count: Option<String>,
}

impl GenerateForm {
  pub fn count(&self) -> u32 {
    self
      .count
      .as_deref()
      .and_then(|c| c.trim().parse::<u32>().ok())
      .filter(|&c| c > 0)
      .unwrap_or(DEFAULT_GENERATE_COUNT)
  }
}
