//! Core types for the case-search domain.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::validation::SearchLimits;

/// Base URL for full-text links; the path is derived from the case slug.
const FULL_TEXT_BASE_URL: &str = "https://de.openlegaldata.io/case";

/// Build the canonical full-text URL for a case slug.
///
/// The URL is a pure function of the slug and is never stored independently.
pub fn full_text_url(slug: &str) -> String {
    format!("{FULL_TEXT_BASE_URL}/{slug}/")
}

/// A single court decision as read from the case store.
///
/// Instances are immutable snapshots apart from the one-time headnote
/// enrichment performed right after loading.
#[derive(Debug, Clone, Serialize)]
pub struct LegalCase {
    pub id: i64,
    pub slug: String,
    /// Deciding court, e.g. "Bundesgerichtshof".
    pub court_name: String,
    pub court_slug: Option<String>,
    /// Branch of jurisdiction, e.g. "Ordentliche Gerichtsbarkeit".
    pub jurisdiction: Option<String>,
    /// Legal area classification (Rechtsgebiet), e.g. "Zivilrecht".
    pub legal_area: Option<String>,
    /// Level of appeal (Instanz), e.g. "Revision".
    pub level_of_appeal: Option<String>,
    /// Court-assigned file number (Aktenzeichen).
    pub file_number: Option<String>,
    /// Decision date as stored, ISO `YYYY-MM-DD`.
    pub date: Option<String>,
    /// Decision type, e.g. "Urteil" or "Beschluss".
    pub decision_type: Option<String>,
    /// European Case Law Identifier.
    pub ecli: Option<String>,
    #[serde(skip_serializing)]
    pub content_raw: Option<String>,
    #[serde(skip_serializing)]
    pub content_clean: Option<String>,
    pub content_length: Option<i64>,
    pub year: Option<i32>,
    pub created_date: Option<String>,
    pub updated_date: Option<String>,
    /// Extracted headnote (Leitsatz); computed from the raw content on load.
    pub headnote: Option<String>,
    /// Link to the full decision text; derived from `slug` on load.
    pub full_text_url: String,
}

/// A validated free-text search request with optional structured filters.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    /// Free-text search term; quoted substrings are treated as phrases.
    pub query: String,
    /// Substring filter on the legal area.
    pub legal_area: Option<String>,
    /// Substring filter on the court name (and jurisdiction, for simple search).
    pub court: Option<String>,
    /// Inclusive lower bound on the decision year.
    pub year_from: Option<i32>,
    /// Inclusive upper bound on the decision year.
    pub year_to: Option<i32>,
    /// Maximum number of results, bounded to [1, 100].
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    20
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            query: String::new(),
            legal_area: None,
            court: None,
            year_from: None,
            year_to: None,
            limit: default_limit(),
        }
    }
}

impl SearchQuery {
    /// Collect all validation violations; an empty list means the query may run.
    pub fn validate(&self, limits: &SearchLimits) -> Vec<String> {
        let mut violations = Vec::new();

        if self.query.trim().is_empty() {
            violations.push("search text must not be empty".to_string());
        }

        if self.limit < limits.min_limit {
            violations.push(format!("limit must be at least {}", limits.min_limit));
        } else if self.limit > limits.max_limit {
            violations.push(format!("limit must not exceed {}", limits.max_limit));
        }

        for (label, year) in [("year_from", self.year_from), ("year_to", self.year_to)] {
            if let Some(year) = year {
                if year < limits.min_year || year > limits.max_year {
                    violations.push(format!(
                        "{label} must lie between {} and {}",
                        limits.min_year, limits.max_year
                    ));
                }
            }
        }

        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                violations.push("year_from must not be after year_to".to_string());
            }
        }

        violations
    }

    /// Canonical cache key: a deterministic encoding of every field, so two
    /// logically identical queries map to the same cache entry.
    pub fn cache_key(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.query,
            self.legal_area.as_deref().unwrap_or(""),
            self.court.as_deref().unwrap_or(""),
            self.year_from.map(|y| y.to_string()).unwrap_or_default(),
            self.year_to.map(|y| y.to_string()).unwrap_or_default(),
            self.limit,
        )
    }
}

/// Extra filters accepted by the advanced search path.
///
/// Every field is a case-insensitive substring match, skipped when absent.
/// Years arriving out of range are degraded to `None` rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdvancedFilters {
    pub legal_area: Option<String>,
    pub court: Option<String>,
    pub year_from: Option<i64>,
    pub year_to: Option<i64>,
    /// Substring filter on the file number (Aktenzeichen).
    pub file_number: Option<String>,
    /// Substring filter on the ECLI.
    pub ecli: Option<String>,
    /// Substring filter on the level of appeal (Instanz).
    pub level_of_appeal: Option<String>,
    pub limit: Option<i64>,
}

impl AdvancedFilters {
    /// Fold the extra filters into a base query's cache key.
    pub fn extend_cache_key(&self, base: &str) -> String {
        format!(
            "{base}|{}|{}|{}",
            self.file_number.as_deref().unwrap_or(""),
            self.ecli.as_deref().unwrap_or(""),
            self.level_of_appeal.as_deref().unwrap_or(""),
        )
    }
}

/// One ranked row from the retrieval store, before headnote enrichment.
#[derive(Debug, Clone)]
pub struct CaseHit {
    pub case: LegalCase,
    /// bm25 ranking score; lower values indicate stronger matches.
    pub relevance_score: f64,
    /// Markup-wrapped fragment around the matched terms.
    pub snippet: String,
}

/// A fully materialized search result.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub case: LegalCase,
    /// bm25 ranking score; lower values indicate stronger matches.
    pub relevance_score: f64,
    pub snippet: String,
    /// Terms to emphasize client-side; mirrors the executed query clauses.
    pub highlighted_terms: Vec<String>,
}

/// Filter clauses composed conjunctively into the retrieval query.
#[derive(Debug, Clone, Default)]
pub struct CaseFilters {
    pub legal_area: Option<String>,
    pub court: Option<String>,
    /// Simple search matches the court needle against the jurisdiction too;
    /// advanced search matches the court name only.
    pub court_includes_jurisdiction: bool,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub file_number: Option<String>,
    pub ecli: Option<String>,
    pub level_of_appeal: Option<String>,
}

/// Everything the store needs to execute one ranked retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    /// FTS5 MATCH expression, as produced by [`super::fts::build_match_query`].
    pub match_query: String,
    pub filters: CaseFilters,
    /// Word budget for the snippet function.
    pub snippet_words: i64,
    /// Hard cap on returned rows.
    pub limit: i64,
}

/// Aggregate statistics over the case store.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStats {
    pub total_cases: i64,
    /// Case counts per legal area, most frequent first.
    pub legal_areas: Vec<BucketCount>,
    /// Case counts per court, most frequent first.
    pub top_courts: Vec<BucketCount>,
    /// Case counts per year, most recent first.
    pub years: Vec<BucketCount>,
    pub content: Option<ContentStats>,
    pub quality: Option<DataQuality>,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
}

impl DatabaseStats {
    /// Stats value for an empty or unreachable store.
    pub fn empty() -> Self {
        Self {
            total_cases: 0,
            legal_areas: Vec::new(),
            top_courts: Vec::new(),
            years: Vec::new(),
            content: None,
            quality: None,
            generated_at: OffsetDateTime::now_utc(),
        }
    }
}

/// One labeled histogram bucket.
#[derive(Debug, Clone, Serialize)]
pub struct BucketCount {
    pub label: String,
    pub count: i64,
}

/// Aggregates over the stored content lengths.
#[derive(Debug, Clone, Serialize)]
pub struct ContentStats {
    pub avg_length: i64,
    pub min_length: i64,
    pub max_length: i64,
    /// Cases with more than 100 characters of content.
    pub substantial: i64,
}

/// Field-completeness counters.
#[derive(Debug, Clone, Serialize)]
pub struct DataQuality {
    pub with_ecli: i64,
    pub with_date: i64,
    pub with_file_number: i64,
}
