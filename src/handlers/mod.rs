pub mod api;
pub mod generate;
pub mod study;
pub mod templates;

use axum::{
  extract::FromRequestParts,
  http::request::Parts,
  routing::{get, post},
  Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::convert::Infallible;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config;
use crate::session::{generate_session_id, is_valid_session_id};
use crate::state::AppState;

pub const SESSION_COOKIE_NAME: &str = "wc_session";

/// The learner behind a request, identified by the session cookie.
///
/// A fresh id (and cookie) is issued when the request has none; handlers must
/// return `jar` so the cookie reaches the browser.
pub struct LearnerSession {
  pub id: String,
  pub jar: CookieJar,
}

impl<S: Send + Sync> FromRequestParts<S> for LearnerSession {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let jar = CookieJar::from_headers(&parts.headers);

    let existing = jar
      .get(SESSION_COOKIE_NAME)
      .map(|c| c.value().to_string())
      .filter(|id| is_valid_session_id(id));

    match existing {
      Some(id) => Ok(LearnerSession { id, jar }),
      None => {
        let id = generate_session_id();
        let cookie = Cookie::build((SESSION_COOKIE_NAME, id.clone()))
          .path("/")
          .http_only(true)
          .secure(false) // Set to true in production with HTTPS
          .max_age(time::Duration::days(config::SESSION_COOKIE_DAYS))
          .build();
        Ok(LearnerSession {
          id,
          jar: jar.add(cookie),
        })
      }
    }
  }
}

/// All routes, with state attached.
pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/", get(study::index))
    .route("/reveal", post(study::reveal))
    .route("/mastered", post(study::mastered))
    .route("/next", post(study::next))
    .route("/prev", post(study::prev))
    .route("/reset", post(study::reset))
    .route("/dataset", post(study::select_dataset))
    .route("/view-mode", post(study::set_view_mode))
    .route("/generate", get(generate::generate_page).post(generate::generate_submit))
    .route("/api/datasets", get(api::list_datasets))
    .route("/api/generate", post(api::generate))
    .route("/api/session", get(api::session_snapshot))
    .route("/api/session/action", post(api::session_action))
    .nest_service("/static", ServeDir::new("static"))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
