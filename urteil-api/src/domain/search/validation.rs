//! Input sanitation and bounds checking for externally supplied queries.

use regex::Regex;
use std::sync::LazyLock;

/// Bounds applied during query validation.
#[derive(Debug, Clone)]
pub struct SearchLimits {
    pub min_year: i32,
    pub max_year: i32,
    pub min_limit: i64,
    pub max_limit: i64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            min_year: 1900,
            max_year: 2030,
            min_limit: 1,
            max_limit: 100,
        }
    }
}

// Control characters plus the shell/query metacharacters that would corrupt
// the MATCH expression. Double quotes are kept: phrase syntax depends on them.
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1f<>;&|`$(){}\[\]\\]").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip unsafe characters and collapse whitespace. Total function.
pub fn sanitize_term(term: &str) -> String {
    let stripped = UNSAFE_CHARS.replace_all(term, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

/// Accept a year only when it falls inside the plausible range.
pub fn validate_year(year: Option<i64>, limits: &SearchLimits) -> Option<i32> {
    let year = i32::try_from(year?).ok()?;
    (limits.min_year..=limits.max_year)
        .contains(&year)
        .then_some(year)
}

/// Clamp a requested result limit into the allowed range.
pub fn clamp_limit(limit: i64, limits: &SearchLimits) -> i64 {
    limit.clamp(limits.min_limit, limits.max_limit)
}
