//! Trait definitions and the error taxonomy for the search domain.
//!
//! The repository trait is the seam between the engine and the case store;
//! the mock implementation keeps engine tests free of a real database.

use async_trait::async_trait;

use super::types::{CaseHit, DatabaseStats, LegalCase, RetrievalRequest};

/// Error type for search operations.
///
/// Nothing in here ever crosses the engine boundary — the engine logs and
/// degrades to empty results. The one exception is startup: a store that
/// cannot be opened at all is surfaced to the initializer.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("database error: {0}")]
    Database(String),

    #[error("case database not usable: {0}")]
    Unavailable(String),

    #[error("retrieval timed out after {0} seconds")]
    Timeout(u64),
}

impl From<sqlx::Error> for SearchError {
    fn from(e: sqlx::Error) -> Self {
        SearchError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Read access to the case store and its full-text index.
///
/// The store keeps one row per decision plus a parallel FTS index over the
/// same ids, with a ranking function where lower scores mean stronger
/// matches and a snippet function with a configurable word budget.
#[async_trait]
pub trait CaseRepository: Send + Sync {
    /// Execute one ranked retrieval: FTS match plus conjunctive filters,
    /// ordered ascending by score with year/date tie-breaks, capped rows.
    async fn search(&self, request: &RetrievalRequest) -> Result<Vec<CaseHit>>;

    /// Load a case by id. `Ok(None)` when absent.
    async fn case_by_id(&self, id: i64) -> Result<Option<LegalCase>>;

    /// Load a case by slug. `Ok(None)` when absent.
    async fn case_by_slug(&self, slug: &str) -> Result<Option<LegalCase>>;

    /// Distinct file numbers containing `partial`, most recent first.
    async fn file_number_suggestions(&self, partial: &str, limit: i64) -> Result<Vec<String>>;

    /// Distinct court names containing `partial`, most frequent first.
    async fn court_suggestions(&self, partial: &str, limit: i64) -> Result<Vec<String>>;

    /// Aggregate statistics over the whole store.
    async fn statistics(&self) -> Result<DatabaseStats>;
}
