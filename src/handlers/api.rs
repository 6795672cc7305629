//! JSON API.
//!
//! GET  /api/datasets        - every loaded dataset with its items
//! POST /api/generate        - generate cards from text (stateless)
//! GET  /api/session         - the caller's learner snapshot
//! POST /api/session/action  - apply one action, return the new snapshot

use axum::{
  extract::{rejection::JsonRejection, State},
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Deserialize;

use super::LearnerSession;
use crate::config::DEFAULT_GENERATE_COUNT;
use crate::dataset::Catalog;
use crate::domain::ViewMode;
use crate::generator::GenerateError;
use crate::learner::Learner;
use crate::reducer::Action;
use crate::state::AppState;

/// GET /api/datasets
///
/// Re-reads the datasets directory. A load-level failure still answers 200,
/// with an empty list and an error message.
pub async fn list_datasets(State(state): State<AppState>) -> impl IntoResponse {
  match state.reload_catalog() {
    Ok(catalog) => Json(serde_json::json!({ "dataSets": catalog.datasets() })),
    Err(e) => {
      tracing::error!("Error loading datasets: {}", e);
      Json(serde_json::json!({
        "dataSets": [],
        "error": e.user_message(),
      }))
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
  #[serde(default)]
  pub content: String,
  #[serde(default)]
  pub count: Option<u32>,
}

pub(crate) fn generate_error_status(err: &GenerateError) -> StatusCode {
  match err {
    GenerateError::EmptyInput => StatusCode::BAD_REQUEST,
    GenerateError::MissingCredential
    | GenerateError::InvalidRequest(_)
    | GenerateError::UpstreamFormat(_)
    | GenerateError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

fn generate_failure(err: GenerateError) -> Response {
  tracing::warn!("Generate error: {}", err);
  (
    generate_error_status(&err),
    Json(serde_json::json!({ "error": err.user_message() })),
  )
    .into_response()
}

/// POST /api/generate
///
/// Every failure, including an unreadable body, answers with `{ error }`.
pub async fn generate(
  State(state): State<AppState>,
  payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Response {
  let request = match payload {
    Ok(Json(request)) => request,
    Err(rejection) => return generate_failure(GenerateError::InvalidRequest(rejection.body_text())),
  };
  let count = request.count.unwrap_or(DEFAULT_GENERATE_COUNT);

  match state.generator.generate(&request.content, count).await {
    Ok(data) => (StatusCode::OK, Json(serde_json::json!({ "data": data }))).into_response(),
    Err(e) => generate_failure(e),
  }
}

/// GET /api/session
pub async fn session_snapshot(
  State(state): State<AppState>,
  session: LearnerSession,
) -> impl IntoResponse {
  let catalog = state.catalog();
  let snapshot = state
    .learners
    .with_learner(&session.id, &catalog, |learner| learner.snapshot(&catalog));
  (session.jar, Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub id: Option<i64>,
  #[serde(default)]
  pub index: Option<usize>,
  #[serde(default)]
  pub mode: Option<String>,
  #[serde(default, rename = "dataSet")]
  pub data_set: Option<String>,
}

/// Apply a wire action. Unknown types and missing arguments are no-ops.
fn apply_request(learner: &mut Learner, request: &ActionRequest, catalog: &Catalog) {
  match request.kind.as_str() {
    "REVEAL" => {
      if let Some(id) = request.id {
        learner.dispatch(Action::Reveal(id), catalog);
      }
    }
    "MARK_MASTERED" => {
      if let Some(id) = request.id {
        learner.mark_mastered(id, catalog);
      }
    }
    "SET_INDEX" => {
      if let Some(index) = request.index {
        learner.dispatch(Action::SetIndex(index), catalog);
      }
    }
    "SET_VIEW_MODE" => {
      if let Some(mode) = request.mode.as_deref().and_then(ViewMode::from_str) {
        learner.dispatch(Action::SetViewMode(mode), catalog);
      }
    }
    "SET_DATASET" => {
      if let Some(id) = request.data_set.as_deref() {
        learner.select_dataset(id, catalog);
      }
    }
    "NEXT" => learner.dispatch(Action::Next, catalog),
    "PREV" => learner.dispatch(Action::Prev, catalog),
    "RESET" => learner.reset(catalog),
    other => tracing::debug!("Ignoring unknown action {:?}", other),
  }
}

/// POST /api/session/action
pub async fn session_action(
  State(state): State<AppState>,
  session: LearnerSession,
  Json(request): Json<ActionRequest>,
) -> impl IntoResponse {
  let catalog = state.catalog();
  let snapshot = state.learners.with_learner(&session.id, &catalog, |learner| {
    apply_request(learner, &request, &catalog);
    learner.snapshot(&catalog)
  });
  (session.jar, Json(snapshot))
}
