//! Card generation page.

use askama::Template;
use axum::{
  extract::State,
  response::{Html, IntoResponse, Redirect, Response},
  Form,
};

use super::templates::{GenerateForm, GenerateTemplate};
use super::LearnerSession;
use crate::config::DEFAULT_GENERATE_COUNT;
use crate::state::AppState;

pub async fn generate_page(State(state): State<AppState>) -> impl IntoResponse {
  let template = GenerateTemplate {
    content: String::new(),
    count: DEFAULT_GENERATE_COUNT,
    error: None,
    configured: state.generator.is_configured(),
  };
  Html(template.render().unwrap_or_default())
}

/// Generate cards, install them as the learner's custom dataset and go study.
///
/// On failure the form is shown again with the submitted text kept.
pub async fn generate_submit(
  State(state): State<AppState>,
  session: LearnerSession,
  Form(form): Form<GenerateForm>,
) -> Response {
  let count = form.count();

  // No learner lock is held while the model is working
  let items = match state.generator.generate(&form.content, count).await {
    Ok(items) => items,
    Err(e) => {
      tracing::warn!("Generate error: {}", e);
      let template = GenerateTemplate {
        content: form.content,
        count,
        error: Some(e.user_message().to_string()),
        configured: state.generator.is_configured(),
      };
      return (session.jar, Html(template.render().unwrap_or_default())).into_response();
    }
  };

  let catalog = state.catalog();
  state
    .learners
    .with_learner(&session.id, &catalog, |learner| learner.install_custom(items, &catalog));

  (session.jar, Redirect::to("/")).into_response()
}
