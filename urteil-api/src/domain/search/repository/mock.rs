//! In-memory repository for exercising the engine without a database.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use time::OffsetDateTime;

use crate::domain::search::traits::{CaseRepository, Result, SearchError};
use crate::domain::search::types::{
    full_text_url, BucketCount, CaseHit, DatabaseStats, LegalCase, RetrievalRequest,
};

/// Build a minimal but fully populated case for tests.
#[allow(dead_code)]
pub fn case(id: i64, slug: &str, court_name: &str, legal_area: &str, year: i32) -> LegalCase {
    LegalCase {
        id,
        full_text_url: full_text_url(slug),
        slug: slug.to_string(),
        court_name: court_name.to_string(),
        court_slug: None,
        jurisdiction: None,
        legal_area: Some(legal_area.to_string()),
        level_of_appeal: Some("Revision".to_string()),
        file_number: Some(format!("VIII ZR {id}/22")),
        date: Some(format!("{year}-03-15")),
        decision_type: Some("Urteil".to_string()),
        ecli: None,
        content_raw: Some("<h2>Tenor</h2><p>Die Revision wird zurückgewiesen.</p>".to_string()),
        content_clean: Some("Die Revision wird zurückgewiesen.".to_string()),
        content_length: Some(42),
        year: Some(year),
        created_date: None,
        updated_date: None,
        headnote: None,
    }
}

/// Mock case repository backed by an in-memory case list.
///
/// Matching is a naive substring emulation of the FTS index: the MATCH
/// expression is split back into clauses and a case matches when any clause
/// occurs in one of the indexed fields. Good enough to drive the engine's
/// control flow; ranking fidelity lives in the SQLite tests.
#[derive(Clone, Default)]
pub struct MockCaseRepository {
    cases: Arc<RwLock<Vec<LegalCase>>>,
    /// Canned hits returned verbatim (minus the limit cap) when set.
    canned_hits: Arc<RwLock<Option<Vec<CaseHit>>>>,
    fail_searches: Arc<RwLock<bool>>,
    search_calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl MockCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cases(self, cases: Vec<LegalCase>) -> Self {
        *self.cases.write().unwrap() = cases;
        self
    }

    pub fn with_hits(self, hits: Vec<CaseHit>) -> Self {
        *self.canned_hits.write().unwrap() = Some(hits);
        self
    }

    /// Make every retrieval fail, simulating a broken store.
    pub fn with_failing_searches(self) -> Self {
        *self.fail_searches.write().unwrap() = true;
        self
    }

    /// Number of retrievals executed so far; lets tests assert cache hits.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn clauses(match_query: &str) -> Vec<String> {
        match_query
            .split(" OR ")
            .map(|clause| {
                clause
                    .trim()
                    .trim_end_matches('*')
                    .trim_matches('"')
                    .to_lowercase()
            })
            .filter(|clause| !clause.is_empty())
            .collect()
    }

    fn matches(case: &LegalCase, clauses: &[String]) -> usize {
        let haystacks = [
            case.content_clean.as_deref().unwrap_or(""),
            case.court_name.as_str(),
            case.file_number.as_deref().unwrap_or(""),
            case.ecli.as_deref().unwrap_or(""),
            case.legal_area.as_deref().unwrap_or(""),
        ]
        .map(str::to_lowercase);

        clauses
            .iter()
            .filter(|clause| haystacks.iter().any(|h| h.contains(clause.as_str())))
            .count()
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(&needle.to_lowercase()))
        .unwrap_or(false)
}

#[async_trait]
impl CaseRepository for MockCaseRepository {
    async fn search(&self, request: &RetrievalRequest) -> Result<Vec<CaseHit>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        if *self.fail_searches.read().unwrap() {
            return Err(SearchError::Database("injected store failure".to_string()));
        }

        if let Some(hits) = self.canned_hits.read().unwrap().as_ref() {
            return Ok(hits.iter().take(request.limit as usize).cloned().collect());
        }

        let clauses = Self::clauses(&request.match_query);
        let filters = &request.filters;

        let mut hits: Vec<CaseHit> = self
            .cases
            .read()
            .unwrap()
            .iter()
            .filter_map(|case| {
                if let Some(legal_area) = &filters.legal_area {
                    if !contains_ci(case.legal_area.as_deref(), legal_area) {
                        return None;
                    }
                }
                if let Some(court) = &filters.court {
                    let name_match = contains_ci(Some(case.court_name.as_str()), court);
                    let jurisdiction_match = filters.court_includes_jurisdiction
                        && contains_ci(case.jurisdiction.as_deref(), court);
                    if !name_match && !jurisdiction_match {
                        return None;
                    }
                }
                if let Some(from) = filters.year_from {
                    if case.year.map_or(true, |year| year < from) {
                        return None;
                    }
                }
                if let Some(to) = filters.year_to {
                    if case.year.map_or(true, |year| year > to) {
                        return None;
                    }
                }
                if let Some(file_number) = &filters.file_number {
                    if !contains_ci(case.file_number.as_deref(), file_number) {
                        return None;
                    }
                }
                if let Some(ecli) = &filters.ecli {
                    if !contains_ci(case.ecli.as_deref(), ecli) {
                        return None;
                    }
                }
                if let Some(level) = &filters.level_of_appeal {
                    if !contains_ci(case.level_of_appeal.as_deref(), level) {
                        return None;
                    }
                }

                let matched = Self::matches(case, &clauses);
                if matched == 0 {
                    return None;
                }

                Some(CaseHit {
                    case: case.clone(),
                    // More matched clauses rank better under lower-is-better.
                    relevance_score: -(matched as f64),
                    snippet: format!("<mark>{}</mark>", clauses[0]),
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            a.relevance_score
                .total_cmp(&b.relevance_score)
                .then_with(|| b.case.year.cmp(&a.case.year))
                .then_with(|| b.case.date.cmp(&a.case.date))
        });
        hits.truncate(request.limit as usize);

        Ok(hits)
    }

    async fn case_by_id(&self, id: i64) -> Result<Option<LegalCase>> {
        Ok(self
            .cases
            .read()
            .unwrap()
            .iter()
            .find(|case| case.id == id)
            .cloned())
    }

    async fn case_by_slug(&self, slug: &str) -> Result<Option<LegalCase>> {
        Ok(self
            .cases
            .read()
            .unwrap()
            .iter()
            .find(|case| case.slug == slug)
            .cloned())
    }

    async fn file_number_suggestions(&self, partial: &str, limit: i64) -> Result<Vec<String>> {
        let mut matching: Vec<(Option<i32>, String)> = self
            .cases
            .read()
            .unwrap()
            .iter()
            .filter(|case| contains_ci(case.file_number.as_deref(), partial))
            .filter_map(|case| case.file_number.clone().map(|fnr| (case.year, fnr)))
            .collect();

        matching.sort_by(|a, b| b.0.cmp(&a.0));
        matching.dedup_by(|a, b| a.1 == b.1);
        Ok(matching
            .into_iter()
            .take(limit as usize)
            .map(|(_, fnr)| fnr)
            .collect())
    }

    async fn court_suggestions(&self, partial: &str, limit: i64) -> Result<Vec<String>> {
        let mut courts: Vec<String> = self
            .cases
            .read()
            .unwrap()
            .iter()
            .filter(|case| contains_ci(Some(case.court_name.as_str()), partial))
            .map(|case| case.court_name.clone())
            .collect();

        courts.sort();
        courts.dedup();
        Ok(courts.into_iter().take(limit as usize).collect())
    }

    async fn statistics(&self) -> Result<DatabaseStats> {
        let cases = self.cases.read().unwrap();
        Ok(DatabaseStats {
            total_cases: cases.len() as i64,
            legal_areas: vec![BucketCount {
                label: "Zivilrecht".to_string(),
                count: cases.len() as i64,
            }],
            top_courts: Vec::new(),
            years: Vec::new(),
            content: None,
            quality: None,
            generated_at: OffsetDateTime::now_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::fts::build_match_query;
    use crate::domain::search::types::CaseFilters;

    fn request(term: &str, filters: CaseFilters) -> RetrievalRequest {
        RetrievalRequest {
            match_query: build_match_query(term),
            filters,
            snippet_words: 16,
            limit: 10,
        }
    }

    #[tokio::test]
    async fn matches_on_indexed_fields() {
        let repo = MockCaseRepository::new().with_cases(vec![
            case(1, "bgh-1", "Bundesgerichtshof", "Zivilrecht", 2022),
            case(2, "bag-1", "Bundesarbeitsgericht", "Arbeitsrecht", 2023),
        ]);

        let hits = repo
            .search(&request("Bundesgerichtshof", CaseFilters::default()))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].case.id, 1);
    }

    #[tokio::test]
    async fn filters_restrict_results() {
        let repo = MockCaseRepository::new().with_cases(vec![
            case(1, "bgh-1", "Bundesgerichtshof", "Zivilrecht", 2022),
            case(2, "bag-1", "Bundesarbeitsgericht", "Arbeitsrecht", 2023),
        ]);

        let filters = CaseFilters {
            legal_area: Some("Arbeitsrecht".to_string()),
            ..Default::default()
        };
        let hits = repo.search(&request("Revision", filters)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].case.id, 2);
    }

    #[tokio::test]
    async fn injected_failure_errors() {
        let repo = MockCaseRepository::new().with_failing_searches();
        let result = repo.search(&request("Miete", CaseFilters::default())).await;
        assert!(result.is_err());
        assert_eq!(repo.search_calls(), 1);
    }
}
