//! Case repository implementations.

#[cfg(test)]
mod mock;
mod sqlite;

#[cfg(test)]
pub use mock::{case as mock_case, MockCaseRepository};
pub use sqlite::SqliteCaseRepository;
