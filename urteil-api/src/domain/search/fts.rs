//! FTS5 MATCH expression construction.
//!
//! The strategy is deliberately recall-biased: every token contributes both
//! an exact clause and a prefix clause, all OR-combined, so inflected German
//! word forms still match. Legal research favors recall over precision here.

use itertools::Itertools;
use regex::Regex;
use std::sync::LazyLock;

static PHRASE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""([^"]*)""#).unwrap());

/// Tokens this short carry too little signal to be worth a clause.
const MIN_TOKEN_CHARS: usize = 2;

/// Build an FTS5 MATCH expression from sanitized free text.
///
/// Double-quoted substrings become exact phrase clauses; each remaining token
/// longer than two characters yields an exact clause and a quoted prefix
/// clause (`"token"*`), which stays valid FTS5 syntax even when the token
/// carries punctuation such as file-number fragments. Clauses are combined
/// with OR. Empty input produces the match-all sentinel; non-empty input that
/// produces no clauses falls back to one literal phrase over the whole input.
pub fn build_match_query(input: &str) -> String {
    let input = input.trim();
    if input.is_empty() {
        return "\"*\"".to_string();
    }

    let mut clauses = Vec::new();

    for cap in PHRASE_PATTERN.captures_iter(input) {
        let phrase = cap[1].trim();
        if !phrase.is_empty() {
            clauses.push(format!("\"{phrase}\""));
        }
    }

    let remaining = PHRASE_PATTERN.replace_all(input, "");
    for token in remaining.split_whitespace() {
        if token.chars().count() > MIN_TOKEN_CHARS {
            clauses.push(format!("\"{token}\""));
            clauses.push(format!("\"{token}\"*"));
        }
    }

    if clauses.is_empty() {
        return format!("\"{input}\"");
    }

    clauses.join(" OR ")
}

/// Extract the terms a query actually searches for, for client-side
/// highlighting. Mirrors the phrase/token split of [`build_match_query`]
/// without the wildcard variants; order-preserving and deduplicated.
pub fn extract_highlight_terms(input: &str) -> Vec<String> {
    let mut terms = Vec::new();

    for cap in PHRASE_PATTERN.captures_iter(input) {
        let phrase = cap[1].trim();
        if !phrase.is_empty() {
            terms.push(phrase.to_string());
        }
    }

    let remaining = PHRASE_PATTERN.replace_all(input, "");
    for token in remaining.split_whitespace() {
        if token.chars().count() > MIN_TOKEN_CHARS {
            terms.push(token.to_string());
        }
    }

    terms.into_iter().unique().collect()
}
