//! The search engine: validation, caching, query construction, ranked
//! retrieval and result materialization in one pipeline.
//!
//! Every public operation returns a plain value. Validation failures, store
//! errors and timeouts are logged and degrade to empty results; nothing
//! propagates past this boundary.

use itertools::Itertools;
use std::time::Duration;

use super::cache::{CacheStats, ResultCache};
use super::content;
use super::fts;
use super::similar;
use super::traits::CaseRepository;
use super::types::{
    AdvancedFilters, CaseFilters, CaseHit, DatabaseStats, LegalCase, RetrievalRequest,
    SearchQuery, SearchResult,
};
use super::validation::{self, SearchLimits};

/// Row caps for the two suggestion lookups and the merged list.
const FILE_NUMBER_SUGGESTIONS: i64 = 10;
const COURT_SUGGESTIONS: i64 = 5;
const MAX_SUGGESTIONS: usize = 10;
/// Suggestions need at least this many characters of input.
const MIN_SUGGESTION_CHARS: usize = 3;

/// Tunables for the search pipeline, built once at startup from the
/// application settings and passed in by the constructor.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Result cache capacity in entries.
    pub cache_size: usize,
    /// Result cache time-to-live.
    pub cache_ttl: Duration,
    /// Word budget handed to the store's snippet function.
    pub snippet_words: i64,
    /// Maximum headnote length in characters.
    pub headnote_max_chars: usize,
    /// Upper bound on a single retrieval; a slower store counts as failed.
    pub retrieval_timeout: Duration,
    pub limits: SearchLimits,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            cache_size: 50,
            cache_ttl: Duration::from_secs(3600),
            snippet_words: 64,
            headnote_max_chars: 200,
            retrieval_timeout: Duration::from_secs(10),
            limits: SearchLimits::default(),
        }
    }
}

/// Case search over a [`CaseRepository`].
pub struct SearchEngine<R: CaseRepository> {
    repository: R,
    cache: ResultCache,
    settings: SearchSettings,
}

impl<R: CaseRepository> SearchEngine<R> {
    pub fn new(repository: R, settings: SearchSettings) -> Self {
        let cache = ResultCache::new(settings.cache_size, settings.cache_ttl);
        Self {
            repository,
            cache,
            settings,
        }
    }

    pub fn with_defaults(repository: R) -> Self {
        Self::new(repository, SearchSettings::default())
    }

    /// Execute a validated free-text search.
    pub async fn search(&self, query: &SearchQuery) -> Vec<SearchResult> {
        let violations = query.validate(&self.settings.limits);
        if !violations.is_empty() {
            tracing::warn!(?violations, "rejecting invalid search query");
            return Vec::new();
        }

        let filters = CaseFilters {
            legal_area: query.legal_area.clone(),
            court: query.court.clone(),
            court_includes_jurisdiction: true,
            year_from: query.year_from,
            year_to: query.year_to,
            ..Default::default()
        };

        self.run(query, query.cache_key(), filters).await
    }

    /// Search with the extended filter set. Invalid years degrade to "no
    /// filter" and the limit is clamped rather than rejected on this path.
    pub async fn advanced_search(&self, text: &str, filters: &AdvancedFilters) -> Vec<SearchResult> {
        let query = SearchQuery {
            query: validation::sanitize_term(text),
            legal_area: filters.legal_area.clone(),
            court: filters.court.clone(),
            year_from: validation::validate_year(filters.year_from, &self.settings.limits),
            year_to: validation::validate_year(filters.year_to, &self.settings.limits),
            limit: validation::clamp_limit(
                filters.limit.unwrap_or_else(|| SearchQuery::default().limit),
                &self.settings.limits,
            ),
        };

        let violations = query.validate(&self.settings.limits);
        if !violations.is_empty() {
            tracing::warn!(?violations, "rejecting invalid advanced search");
            return Vec::new();
        }

        let case_filters = CaseFilters {
            legal_area: query.legal_area.clone(),
            court: query.court.clone(),
            court_includes_jurisdiction: false,
            year_from: query.year_from,
            year_to: query.year_to,
            file_number: filters.file_number.clone(),
            ecli: filters.ecli.clone(),
            level_of_appeal: filters.level_of_appeal.clone(),
        };

        let cache_key = filters.extend_cache_key(&query.cache_key());
        self.run(&query, cache_key, case_filters).await
    }

    async fn run(
        &self,
        query: &SearchQuery,
        cache_key: String,
        filters: CaseFilters,
    ) -> Vec<SearchResult> {
        if let Some(cached) = self.cache.get(&cache_key) {
            tracing::debug!(query = %query.query, "serving search from cache");
            return cached;
        }

        tracing::info!(
            query = %query.query,
            legal_area = ?filters.legal_area,
            court = ?filters.court,
            years = ?(filters.year_from, filters.year_to),
            "executing search"
        );

        let request = RetrievalRequest {
            match_query: fts::build_match_query(&query.query),
            filters,
            snippet_words: self.settings.snippet_words,
            limit: query.limit,
        };
        let highlighted_terms = fts::extract_highlight_terms(&query.query);

        let Some(hits) = self.retrieve(&request).await else {
            return Vec::new();
        };

        let results: Vec<SearchResult> = hits
            .into_iter()
            .map(|hit| self.materialize(hit, highlighted_terms.clone()))
            .collect();

        self.cache.put(cache_key, &results);
        tracing::info!(count = results.len(), "search finished");
        results
    }

    /// One bounded retrieval. Store failures and timeouts are logged and
    /// mapped to `None`; the caller treats that as "no results".
    async fn retrieve(&self, request: &RetrievalRequest) -> Option<Vec<CaseHit>> {
        match tokio::time::timeout(self.settings.retrieval_timeout, self.repository.search(request))
            .await
        {
            Ok(Ok(hits)) => Some(hits),
            Ok(Err(err)) => {
                tracing::error!(error = %err, "retrieval failed");
                None
            }
            Err(_) => {
                tracing::error!(
                    timeout_secs = self.settings.retrieval_timeout.as_secs(),
                    "retrieval timed out"
                );
                None
            }
        }
    }

    fn materialize(&self, hit: CaseHit, highlighted_terms: Vec<String>) -> SearchResult {
        let mut case = hit.case;
        self.enrich(&mut case);
        SearchResult {
            case,
            relevance_score: hit.relevance_score,
            snippet: hit.snippet,
            highlighted_terms,
        }
    }

    /// One-time headnote enrichment after loading a case from the store.
    fn enrich(&self, case: &mut LegalCase) {
        if let Some(raw) = &case.content_raw {
            let headnote = content::extract_headnote(raw, self.settings.headnote_max_chars);
            if !headnote.is_empty() {
                case.headnote = Some(headnote);
            }
        }
    }

    /// Find cases similar to the given one, derived from its own metadata
    /// and citations. The reference case never appears in the output.
    pub async fn find_similar(&self, case_id: i64, limit: i64) -> Vec<SearchResult> {
        let mut case = match self.repository.case_by_id(case_id).await {
            Ok(Some(case)) => case,
            Ok(None) => {
                tracing::debug!(case_id, "reference case not found");
                return Vec::new();
            }
            Err(err) => {
                tracing::error!(error = %err, case_id, "loading reference case failed");
                return Vec::new();
            }
        };
        self.enrich(&mut case);

        let Some(query) = similar::similar_query(&case, limit, &self.settings.limits) else {
            tracing::debug!(case_id, "no seed terms derivable");
            return Vec::new();
        };

        self.search(&query)
            .await
            .into_iter()
            .filter(|result| result.case.id != case_id)
            .take(limit.max(0) as usize)
            .collect()
    }

    /// Load one case with headnote enrichment. `None` covers both "not
    /// found" and "store failure" (the latter is logged).
    pub async fn case_details(&self, case_id: i64) -> Option<LegalCase> {
        match self.repository.case_by_id(case_id).await {
            Ok(Some(mut case)) => {
                self.enrich(&mut case);
                Some(case)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::error!(error = %err, case_id, "loading case failed");
                None
            }
        }
    }

    /// Suggest file numbers and court names for a partial input, shortest
    /// first. Below three characters of input nothing is suggested.
    pub async fn get_suggestions(&self, partial: &str) -> Vec<String> {
        let partial = partial.trim();
        if partial.chars().count() < MIN_SUGGESTION_CHARS {
            return Vec::new();
        }

        let mut suggestions = Vec::new();
        match self
            .repository
            .file_number_suggestions(partial, FILE_NUMBER_SUGGESTIONS)
            .await
        {
            Ok(numbers) => suggestions.extend(numbers),
            Err(err) => tracing::error!(error = %err, "file number suggestions failed"),
        }
        match self
            .repository
            .court_suggestions(partial, COURT_SUGGESTIONS)
            .await
        {
            Ok(courts) => suggestions.extend(courts),
            Err(err) => tracing::error!(error = %err, "court suggestions failed"),
        }

        // Shorter, more general suggestions first; the sort is stable, so
        // equal lengths keep the lookup order.
        let mut unique: Vec<String> = suggestions.into_iter().unique().collect();
        unique.sort_by_key(|suggestion| suggestion.chars().count());
        unique.truncate(MAX_SUGGESTIONS);
        unique
    }

    /// Aggregate statistics over the store; an unreachable store yields the
    /// empty statistics value.
    pub async fn database_stats(&self) -> DatabaseStats {
        match self.repository.statistics().await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::error!(error = %err, "statistics query failed");
                DatabaseStats::empty()
            }
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!("search cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::repository::{mock_case, MockCaseRepository};

    fn mietrecht_case() -> LegalCase {
        let mut case = mock_case(1, "bgh-mietrecht-2022", "Bundesgerichtshof", "Zivilrecht", 2022);
        case.content_raw = Some(
            "<h2>Tenor</h2><p>Die Revision wird zurückgewiesen.</p>\
             <p>Bei fristloser Kündigung wegen Zahlungsverzug muss eine Abmahnung erfolgen.</p>"
                .to_string(),
        );
        case.content_clean = Some(
            "Die Revision wird zurückgewiesen. Bei fristloser Kündigung wegen \
             Zahlungsverzug muss eine Abmahnung erfolgen."
                .to_string(),
        );
        case
    }

    fn query(text: &str) -> SearchQuery {
        SearchQuery {
            query: text.to_string(),
            limit: 5,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn search_returns_enriched_results() {
        let repo = MockCaseRepository::new().with_cases(vec![mietrecht_case()]);
        let engine = SearchEngine::with_defaults(repo);

        let results = engine.search(&query("Kündigung")).await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].case.id, 1);
        assert_eq!(
            results[0].case.headnote.as_deref(),
            Some("Die Revision wird zurückgewiesen.")
        );
        assert_eq!(results[0].highlighted_terms, vec!["Kündigung"]);
    }

    #[tokio::test]
    async fn legal_area_filter_excludes_nonmatching_case() {
        let repo = MockCaseRepository::new().with_cases(vec![mietrecht_case()]);
        let engine = SearchEngine::with_defaults(repo);

        let results = engine
            .search(&SearchQuery {
                legal_area: Some("Arbeitsrecht".to_string()),
                ..query("Kündigung")
            })
            .await;

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn result_count_never_exceeds_limit() {
        let cases = (1..=8)
            .map(|id| {
                let mut case =
                    mock_case(id, &format!("fall-{id}"), "Bundesgerichtshof", "Zivilrecht", 2022);
                case.content_clean = Some("Mietvertrag und Kündigung".to_string());
                case
            })
            .collect();
        let repo = MockCaseRepository::new().with_cases(cases);
        let engine = SearchEngine::with_defaults(repo);

        let results = engine
            .search(&SearchQuery {
                limit: 3,
                ..query("Kündigung")
            })
            .await;

        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn results_stay_inside_year_range() {
        let cases = (0..4)
            .map(|i| {
                let mut case = mock_case(
                    i + 1,
                    &format!("fall-{i}"),
                    "Bundesgerichtshof",
                    "Zivilrecht",
                    2020 + i as i32,
                );
                case.content_clean = Some("Kündigung".to_string());
                case
            })
            .collect();
        let repo = MockCaseRepository::new().with_cases(cases);
        let engine = SearchEngine::with_defaults(repo);

        let results = engine
            .search(&SearchQuery {
                year_from: Some(2021),
                year_to: Some(2022),
                ..query("Kündigung")
            })
            .await;

        assert!(!results.is_empty());
        for result in &results {
            let year = result.case.year.unwrap();
            assert!((2021..=2022).contains(&year));
        }
    }

    #[tokio::test]
    async fn invalid_query_never_reaches_the_store() {
        let repo = MockCaseRepository::new().with_cases(vec![mietrecht_case()]);
        let engine = SearchEngine::with_defaults(repo.clone());

        assert!(engine.search(&query("   ")).await.is_empty());
        assert!(engine
            .search(&SearchQuery {
                limit: 0,
                ..query("Kündigung")
            })
            .await
            .is_empty());
        assert!(engine
            .search(&SearchQuery {
                year_from: Some(2023),
                year_to: Some(2020),
                ..query("Kündigung")
            })
            .await
            .is_empty());

        assert_eq!(repo.search_calls(), 0);
    }

    #[tokio::test]
    async fn repeated_query_is_served_from_cache() {
        let repo = MockCaseRepository::new().with_cases(vec![mietrecht_case()]);
        let engine = SearchEngine::with_defaults(repo.clone());

        let first = engine.search(&query("Kündigung")).await;
        let second = engine.search(&query("Kündigung")).await;

        assert_eq!(repo.search_calls(), 1, "second call must hit the cache");
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].case.id, second[0].case.id);

        let stats = engine.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn expired_cache_entry_triggers_fresh_retrieval() {
        let repo = MockCaseRepository::new().with_cases(vec![mietrecht_case()]);
        let engine = SearchEngine::new(
            repo.clone(),
            SearchSettings {
                cache_ttl: Duration::ZERO,
                ..Default::default()
            },
        );

        engine.search(&query("Kündigung")).await;
        engine.search(&query("Kündigung")).await;

        assert_eq!(repo.search_calls(), 2);
        assert_eq!(engine.cache_stats().misses, 2);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_empty_results() {
        let repo = MockCaseRepository::new().with_failing_searches();
        let engine = SearchEngine::with_defaults(repo);

        assert!(engine.search(&query("Kündigung")).await.is_empty());
    }

    #[tokio::test]
    async fn failed_search_is_not_cached() {
        let repo = MockCaseRepository::new().with_failing_searches();
        let engine = SearchEngine::with_defaults(repo.clone());

        engine.search(&query("Kündigung")).await;
        engine.search(&query("Kündigung")).await;

        assert_eq!(repo.search_calls(), 2);
    }

    #[tokio::test]
    async fn advanced_search_applies_extended_filters() {
        let mut with_ecli = mietrecht_case();
        with_ecli.ecli = Some("ECLI:DE:BGH:2022:150322".to_string());
        let mut other = mock_case(2, "bag-1", "Bundesarbeitsgericht", "Arbeitsrecht", 2023);
        other.content_clean = Some("Kündigung wegen Überstunden".to_string());

        let repo = MockCaseRepository::new().with_cases(vec![with_ecli, other]);
        let engine = SearchEngine::with_defaults(repo);

        let results = engine
            .advanced_search(
                "Kündigung",
                &AdvancedFilters {
                    ecli: Some("ECLI:DE:BGH".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].case.id, 1);
    }

    #[tokio::test]
    async fn advanced_search_degrades_invalid_years_and_clamps_limit() {
        let repo = MockCaseRepository::new().with_cases(vec![mietrecht_case()]);
        let engine = SearchEngine::with_defaults(repo);

        // Out-of-range year and oversized limit must not reject the search.
        let results = engine
            .advanced_search(
                "Kündigung",
                &AdvancedFilters {
                    year_from: Some(1500),
                    limit: Some(100_000),
                    ..Default::default()
                },
            )
            .await;

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn find_similar_excludes_the_reference_case() {
        let cases: Vec<LegalCase> = (1..=3)
            .map(|id| mock_case(id, &format!("fall-{id}"), "Bundesgerichtshof", "Zivilrecht", 2022))
            .collect();
        let repo = MockCaseRepository::new().with_cases(cases);
        let engine = SearchEngine::with_defaults(repo);

        let results = engine.find_similar(1, 5).await;

        assert!(!results.is_empty());
        assert!(results.iter().all(|result| result.case.id != 1));
    }

    #[tokio::test]
    async fn find_similar_with_unknown_case_is_empty() {
        let repo = MockCaseRepository::new();
        let engine = SearchEngine::with_defaults(repo.clone());

        assert!(engine.find_similar(999, 5).await.is_empty());
        assert_eq!(repo.search_calls(), 0);
    }

    #[tokio::test]
    async fn case_details_enriches_headnote() {
        let repo = MockCaseRepository::new().with_cases(vec![mietrecht_case()]);
        let engine = SearchEngine::with_defaults(repo);

        let case = engine.case_details(1).await.unwrap();
        assert_eq!(
            case.headnote.as_deref(),
            Some("Die Revision wird zurückgewiesen.")
        );
        assert!(engine.case_details(999).await.is_none());
    }

    #[tokio::test]
    async fn suggestions_require_three_characters() {
        let repo = MockCaseRepository::new().with_cases(vec![mietrecht_case()]);
        let engine = SearchEngine::with_defaults(repo);

        assert!(engine.get_suggestions("ZR").await.is_empty());
        assert!(!engine.get_suggestions("VIII").await.is_empty());
    }

    #[tokio::test]
    async fn suggestions_merge_sorted_by_length() {
        let mut a = mock_case(1, "a", "Bundesgerichtshof", "Zivilrecht", 2022);
        a.file_number = Some("VIII ZR 1/20 Bundes".to_string());
        let b = mock_case(2, "b", "Bundesarbeitsgericht", "Arbeitsrecht", 2023);

        let repo = MockCaseRepository::new().with_cases(vec![a, b]);
        let engine = SearchEngine::with_defaults(repo);

        let suggestions = engine.get_suggestions("Bundes").await;
        assert!(suggestions.len() >= 2);
        for pair in suggestions.windows(2) {
            assert!(pair[0].chars().count() <= pair[1].chars().count());
        }
    }
}
