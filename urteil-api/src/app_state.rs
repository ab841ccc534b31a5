use std::sync::Arc;

use crate::config::Settings;
use crate::domain::search::{repository::SqliteCaseRepository, SearchEngine};

#[derive(Clone)]
pub struct AppState {
    engine: Arc<SearchEngine<SqliteCaseRepository>>,
}

impl AppState {
    pub fn new(repository: SqliteCaseRepository, settings: &Settings) -> Self {
        let engine = SearchEngine::new(repository, settings.search.engine_settings());

        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn engine(&self) -> &SearchEngine<SqliteCaseRepository> {
        &self.engine
    }
}
