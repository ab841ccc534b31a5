//! Markup stripping, headnote extraction and citation recognition for the
//! heterogeneous HTML-ish content of published decisions.

use itertools::Itertools;
use regex::Regex;
use std::sync::LazyLock;

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static RESIDUAL_ENTITIES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&[a-zA-Z]+;").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SENTENCE_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Headnote matchers in decreasing specificity: structured "Tenor"/"Leitsatz"
/// headings in two levels, then inline labels, then enumerated clause
/// markers. Evaluated in order, first match wins — the slice order encodes
/// precedence.
static HEADNOTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)<h2[^>]*>Tenor</h2>\s*<[^>]*>\s*([^<]+)",
        r"(?is)<h2[^>]*>Leitsatz</h2>\s*<[^>]*>\s*([^<]+)",
        r"(?is)<h3[^>]*>Tenor</h3>\s*<[^>]*>\s*([^<]+)",
        r"(?is)<h3[^>]*>Leitsätze?</h3>\s*<[^>]*>\s*([^<]+)",
        r"(?i)tenor[:\s]*([^<\n]+)",
        r"(?i)leitsatz[:\s]*([^<\n]+)",
        r"(?i)leitsätze[:\s]*([^<\n]+)",
        r"(?s)(?:^|\n)(\d+\.\s+[^<\n]+)",
        r"(?is)(?:^|\n)(I\.\s+[^<\n]+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

// A statute reference: paragraph sign, number with optional letter suffix,
// optionally Abs./Satz markers and a code abbreviation ("§ 543 Abs. 2 BGB").
static PARAGRAPH_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"§\s*(\d+[a-z]?)\s*(?:Abs\.\s*\d+\s*)?(?:Satz\s*\d+\s*)?(?:[A-ZÄÖÜ]{2,}(?:\s+[A-ZÄÖÜ]{2,})*)?").unwrap()
});

// An article reference, only when tied to a known document ("Art. 14 GG").
static ARTICLE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Art\.\s*(\d+[a-z]?)\s*(?:Abs\.\s*\d+\s*)?(?:GG|EMRK|EU-Vertrag)").unwrap()
});

/// Reduce markup content to plain text: tags become spaces, entities are
/// decoded, whitespace is collapsed. Total function; empty in, empty out.
pub fn strip_markup(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let without_tags = TAGS.replace_all(raw, " ");
    let decoded = html_escape::decode_html_entities(without_tags.as_ref()).into_owned();
    let cleaned = RESIDUAL_ENTITIES.replace_all(&decoded, " ");
    WHITESPACE.replace_all(&cleaned, " ").trim().to_string()
}

/// Extract a bounded-length headnote (Leitsatz) from decision content.
///
/// Runs the fixed-priority pattern list and returns the first match,
/// entity-decoded and whitespace-collapsed. Falls back to the first sentence
/// of the stripped text, and to the empty string when there is nothing to
/// extract. Output longer than `max_chars` is cut and marked with `...`.
pub fn extract_headnote(raw: &str, max_chars: usize) -> String {
    if raw.is_empty() {
        return String::new();
    }

    for pattern in HEADNOTE_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(raw) {
            let matched = captures[1].trim();
            let decoded = html_escape::decode_html_entities(matched).into_owned();
            let collapsed = WHITESPACE.replace_all(&decoded, " ").trim().to_string();
            return truncate_marked(&collapsed, max_chars);
        }
    }

    // No structural marker found; fall back to the first sentence.
    let plain = strip_markup(raw);
    if plain.is_empty() {
        return String::new();
    }
    let first_sentence = SENTENCE_SPLIT
        .split(&plain)
        .next()
        .map(str::trim)
        .unwrap_or_default();
    if first_sentence.is_empty() {
        return String::new();
    }
    truncate_marked(first_sentence, max_chars)
}

/// Recognize statute (`§ 543`) and constitutional/treaty (`Art. 14`)
/// references; normalized and deduplicated in order of first appearance.
/// Heuristic only — completeness is not guaranteed.
pub fn extract_citations(text: &str) -> Vec<String> {
    let paragraphs = PARAGRAPH_REF
        .captures_iter(text)
        .map(|cap| format!("§ {}", &cap[1]));
    let articles = ARTICLE_REF
        .captures_iter(text)
        .map(|cap| format!("Art. {}", &cap[1]));

    paragraphs.chain(articles).unique().collect()
}

fn truncate_marked(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
