//! In-memory registry of learner sessions.
//!
//! Learners are keyed by the session cookie id. Idle learners are dropped
//! after a configurable duration; their persisted records stay in SQLite and
//! are restored on the next visit.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config;
use crate::dataset::Catalog;
use crate::db::DbPool;
use crate::learner::Learner;
use crate::progress::{ProgressStore, SqliteStore};

/// Learner entry with last access time for expiration
struct LearnerEntry {
  learner: Learner,
  last_access: DateTime<Utc>,
}

/// All live learners, plus the database their progress is persisted to
#[derive(Clone)]
pub struct LearnerRegistry {
  pool: DbPool,
  learners: Arc<Mutex<HashMap<String, LearnerEntry>>>,
}

impl LearnerRegistry {
  pub fn new(pool: DbPool) -> Self {
    Self {
      pool,
      learners: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Run `f` against the learner for `session_id`, restoring it first if needed.
  pub fn with_learner<R>(
    &self,
    session_id: &str,
    catalog: &Catalog,
    f: impl FnOnce(&mut Learner) -> R,
  ) -> R {
    let mut learners = self.learners.lock().unwrap_or_else(PoisonError::into_inner);

    // Clean up expired learners occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      cleanup_expired(&mut learners);
    }

    let entry = learners.entry(session_id.to_string()).or_insert_with(|| {
      tracing::debug!("Restoring learner session {}", session_id);
      let store: Arc<dyn ProgressStore> = Arc::new(SqliteStore::new(self.pool.clone(), session_id));
      LearnerEntry {
        learner: Learner::restore(store, catalog),
        last_access: Utc::now(),
      }
    });
    entry.last_access = Utc::now();

    let learner = &mut entry.learner;
    learner.observe(catalog);
    f(learner)
  }

  /// Number of learners currently held in memory
  pub fn len(&self) -> usize {
    self.learners.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Clean up expired learners
fn cleanup_expired(learners: &mut HashMap<String, LearnerEntry>) {
  let expiry = Utc::now() - Duration::hours(config::SESSION_EXPIRY_HOURS);
  learners.retain(|_, entry| entry.last_access > expiry);
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36u8);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}

/// Whether a cookie value looks like an id we issued
pub fn is_valid_session_id(id: &str) -> bool {
  id.len() == 32 && id.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::db;
  use crate::domain::{Dataset, Item};
  use crate::reducer::Action;

  fn catalog() -> Catalog {
    Catalog::new(vec![Dataset {
      id: "quotes".into(),
      name: "智慧名言".into(),
      file_name: "quotes.json".into(),
      category: "内置数据集".into(),
      items: vec![Item::new(1, "Q1", "A1"), Item::new(2, "Q2", "A2")],
    }])
  }

  #[test]
  fn test_generate_session_id() {
    let id = generate_session_id();
    assert!(is_valid_session_id(&id));
    assert_ne!(id, generate_session_id());
  }

  #[test]
  fn test_is_valid_session_id_rejects_garbage() {
    assert!(!is_valid_session_id("short"));
    assert!(!is_valid_session_id(&"A".repeat(32)));
    assert!(!is_valid_session_id(&"'; drop table --".repeat(2)));
  }

  #[test]
  fn test_learners_are_isolated() {
    let registry = LearnerRegistry::new(db::init_memory_db().unwrap());
    let catalog = catalog();

    registry.with_learner("a", &catalog, |l| l.dispatch(Action::Reveal(1), &catalog));
    let b_revealed = registry.with_learner("b", &catalog, |l| l.state().revealed_ids.len());
    let a_revealed = registry.with_learner("a", &catalog, |l| l.state().revealed_ids.len());

    assert_eq!(a_revealed, 1);
    assert_eq!(b_revealed, 0);
    assert_eq!(registry.len(), 2);
  }

  #[test]
  fn test_evicted_learner_is_restored_from_db() {
    let pool = db::init_memory_db().unwrap();
    let catalog = catalog();

    let first = LearnerRegistry::new(pool.clone());
    first.with_learner("a", &catalog, |l| l.dispatch(Action::Reveal(2), &catalog));

    // A fresh registry stands in for a server restart
    let second = LearnerRegistry::new(pool);
    assert!(second.is_empty());
    let revealed = second.with_learner("a", &catalog, |l| l.state().is_revealed(2));
    assert!(revealed);
  }
}
