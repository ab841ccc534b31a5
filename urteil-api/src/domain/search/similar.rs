//! Seed-term derivation for similar-case lookup.
//!
//! A reference case is turned into a small bag of search terms — file-number
//! fragments, the leading court-name token, the legal area and a few cited
//! norms — which the regular search pipeline then ORs together.

use itertools::Itertools;

use super::content::extract_citations;
use super::types::{LegalCase, SearchQuery};
use super::validation::{clamp_limit, SearchLimits};

/// Citations taken from the headnote at most.
const MAX_CITATION_SEEDS: usize = 3;
/// Seed terms composed into the query at most.
const MAX_QUERY_SEEDS: usize = 5;

/// Derive the seed terms describing a case.
pub fn seed_terms(case: &LegalCase) -> Vec<String> {
    let mut terms = Vec::new();

    if let Some(file_number) = &case.file_number {
        terms.extend(
            file_number
                .split_whitespace()
                .filter(|part| part.chars().count() > 2)
                .map(str::to_string),
        );
    }

    if let Some(first) = case.court_name.split_whitespace().next() {
        terms.push(first.to_string());
    }

    if let Some(legal_area) = &case.legal_area {
        terms.push(legal_area.clone());
    }

    if let Some(headnote) = &case.headnote {
        terms.extend(
            extract_citations(headnote)
                .into_iter()
                .take(MAX_CITATION_SEEDS),
        );
    }

    terms
}

/// Compose the search query used to find cases similar to `case`, or `None`
/// when no seed terms could be derived. Requests one row more than asked for
/// since the reference case itself is filtered out afterwards.
pub fn similar_query(case: &LegalCase, limit: i64, limits: &SearchLimits) -> Option<SearchQuery> {
    let seeds = seed_terms(case);
    if seeds.is_empty() {
        return None;
    }

    Some(SearchQuery {
        query: seeds.iter().take(MAX_QUERY_SEEDS).join(" "),
        legal_area: case.legal_area.clone(),
        court: None,
        year_from: None,
        year_to: None,
        limit: clamp_limit(limit.saturating_add(1), limits),
    })
}
