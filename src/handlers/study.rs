//! Study page: the HTML front end over a learner session.
//!
//! Every mutation is a form post answered with a redirect back to `/`.

use askama::Template;
use axum::{
  extract::{Query, State},
  response::{Html, IntoResponse, Redirect},
  Form,
};
use rand::prelude::IndexedRandom;

use super::templates::{DatasetForm, ItemForm, StudyQuery, StudyTemplate, ViewModeForm};
use super::LearnerSession;
use crate::domain::ViewMode;
use crate::reducer::{Action, CUSTOM_DATASET_ID};
use crate::state::AppState;

/// Shown (one at random) after a card is revealed
const ENCOURAGEMENTS: &[&str] = &[
  "你很棒哦！ 🌟",
  "继续加油！ 💪",
  "又学会一条！ 🎉",
  "坚持就是胜利！ 🏆",
  "今天也在进步！ 📚",
];

fn pick_encouragement() -> Option<String> {
  ENCOURAGEMENTS
    .choose(&mut rand::rng())
    .map(|s| s.to_string())
}

pub async fn index(
  State(state): State<AppState>,
  session: LearnerSession,
  Query(query): Query<StudyQuery>,
) -> impl IntoResponse {
  let catalog = state.catalog();
  let toast = query.cheer.filter(|&c| c > 0).and_then(|_| pick_encouragement());

  let template = state.learners.with_learner(&session.id, &catalog, |learner| {
    StudyTemplate::for_learner(learner, &catalog, toast)
  });

  (session.jar, Html(template.render().unwrap_or_default()))
}

pub async fn reveal(
  State(state): State<AppState>,
  session: LearnerSession,
  Form(form): Form<ItemForm>,
) -> impl IntoResponse {
  let catalog = state.catalog();
  let newly_revealed = state.learners.with_learner(&session.id, &catalog, |learner| {
    let was_revealed = learner.state().is_revealed(form.id);
    learner.dispatch(Action::Reveal(form.id), &catalog);
    !was_revealed && learner.state().is_revealed(form.id)
  });

  let target = if newly_revealed { "/?cheer=1" } else { "/" };
  (session.jar, Redirect::to(target))
}

pub async fn mastered(
  State(state): State<AppState>,
  session: LearnerSession,
  Form(form): Form<ItemForm>,
) -> impl IntoResponse {
  let catalog = state.catalog();
  state.learners.with_learner(&session.id, &catalog, |learner| {
    if !learner.mark_mastered(form.id, &catalog) {
      tracing::debug!("Ignoring mastered for unknown item {}", form.id);
    }
  });
  (session.jar, Redirect::to("/"))
}

pub async fn next(State(state): State<AppState>, session: LearnerSession) -> impl IntoResponse {
  let catalog = state.catalog();
  state
    .learners
    .with_learner(&session.id, &catalog, |learner| learner.dispatch(Action::Next, &catalog));
  (session.jar, Redirect::to("/"))
}

pub async fn prev(State(state): State<AppState>, session: LearnerSession) -> impl IntoResponse {
  let catalog = state.catalog();
  state
    .learners
    .with_learner(&session.id, &catalog, |learner| learner.dispatch(Action::Prev, &catalog));
  (session.jar, Redirect::to("/"))
}

pub async fn reset(State(state): State<AppState>, session: LearnerSession) -> impl IntoResponse {
  let catalog = state.catalog();
  state
    .learners
    .with_learner(&session.id, &catalog, |learner| learner.reset(&catalog));
  (session.jar, Redirect::to("/"))
}

/// Switch datasets. Picking the generated set before anything was generated
/// goes to the generator instead.
pub async fn select_dataset(
  State(state): State<AppState>,
  session: LearnerSession,
  Form(form): Form<DatasetForm>,
) -> impl IntoResponse {
  let catalog = state.catalog();
  let selected = state
    .learners
    .with_learner(&session.id, &catalog, |learner| learner.select_dataset(&form.id, &catalog));

  let target = if !selected && form.id == CUSTOM_DATASET_ID {
    "/generate"
  } else {
    "/"
  };
  (session.jar, Redirect::to(target))
}

pub async fn set_view_mode(
  State(state): State<AppState>,
  session: LearnerSession,
  Form(form): Form<ViewModeForm>,
) -> impl IntoResponse {
  let catalog = state.catalog();
  if let Some(mode) = ViewMode::from_str(&form.mode) {
    state.learners.with_learner(&session.id, &catalog, |learner| {
      learner.dispatch(Action::SetViewMode(mode), &catalog)
    });
  }
  (session.jar, Redirect::to("/"))
}
