//! Application state shared by all handlers.

use std::sync::{Arc, PoisonError, RwLock};

use crate::dataset::{Catalog, DatasetError, DatasetStore};
use crate::db::DbPool;
use crate::generator::CardGenerator;
use crate::session::LearnerRegistry;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    /// Where datasets are loaded from
    pub datasets: DatasetStore,
    /// Datasets as of the last successful load
    catalog: Arc<RwLock<Arc<Catalog>>>,
    /// Live learner sessions
    pub learners: LearnerRegistry,
    pub generator: CardGenerator,
}

impl AppState {
    pub fn new(datasets: DatasetStore, pool: DbPool, generator: CardGenerator) -> Self {
        Self {
            datasets,
            catalog: Arc::new(RwLock::new(Arc::new(Catalog::default()))),
            learners: LearnerRegistry::new(pool),
            generator,
        }
    }

    /// Current catalog snapshot.
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Re-read the datasets directory and swap in the new catalog.
    ///
    /// On failure the previous catalog stays in place.
    pub fn reload_catalog(&self) -> Result<Arc<Catalog>, DatasetError> {
        let catalog = Arc::new(Catalog::new(self.datasets.load_all()?));
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = catalog.clone();
        Ok(catalog)
    }
}
