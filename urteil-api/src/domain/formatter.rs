//! Human-readable rendering of search results and statistics.
//!
//! Standalone functions over the plain result types — the protocol layer
//! decides whether to send JSON or text, nothing here knows about transport.

use super::search::{CacheStats, DatabaseStats, LegalCase, SearchResult};

/// Histogram buckets rendered per statistics section.
const STATS_TOP: usize = 10;

/// Render a result list as German markdown.
pub fn format_search_results(results: &[SearchResult], term: &str) -> String {
    let mut out = format!("**Rechtsprechungssuche:** '{term}'\n\n");
    out.push_str(&format!("{} Ergebnisse gefunden\n\n", results.len()));

    for (i, result) in results.iter().enumerate() {
        let case = &result.case;
        out.push_str(&format!("**{}. {}**\n", i + 1, case.court_name));

        let mut info = Vec::new();
        if let Some(file_number) = &case.file_number {
            info.push(file_number.clone());
        }
        if let Some(date) = &case.date {
            info.push(date.clone());
        }
        if let Some(year) = case.year {
            info.push(format!("({year})"));
        }
        if !info.is_empty() {
            out.push_str(&info.join(" | "));
            out.push('\n');
        }

        let mut meta = Vec::new();
        if let Some(legal_area) = &case.legal_area {
            meta.push(legal_area.clone());
        }
        if let Some(level) = &case.level_of_appeal {
            meta.push(level.clone());
        }
        if let Some(decision_type) = &case.decision_type {
            meta.push(decision_type.clone());
        }
        if !meta.is_empty() {
            out.push_str(&meta.join(" | "));
            out.push('\n');
        }

        out.push_str(&format!("**Relevanz:** {:.2}\n", result.relevance_score));
        if let Some(headnote) = &case.headnote {
            out.push_str(&format!("**Leitsatz:** {headnote}\n"));
        }
        if !result.snippet.trim().is_empty() {
            out.push_str(&format!("**Auszug:** {}\n", result.snippet));
        }
        out.push_str(&format!("[Volltext anzeigen]({})\n", case.full_text_url));
        if let Some(ecli) = &case.ecli {
            out.push_str(&format!("**ECLI:** {ecli}\n"));
        }
        out.push_str(&format!("**Fall-ID:** {}\n\n---\n\n", case.id));
    }

    out
}

/// Render one case in full detail.
pub fn format_case_details(case: &LegalCase) -> String {
    let mut out = format!("**Fall-Informationen (ID: {})**\n\n", case.id);

    out.push_str(&format!("**Gericht:** {}\n", case.court_name));
    if let Some(jurisdiction) = &case.jurisdiction {
        out.push_str(&format!("**Gerichtsbarkeit:** {jurisdiction}\n"));
    }
    if let Some(level) = &case.level_of_appeal {
        out.push_str(&format!("**Instanz:** {level}\n"));
    }

    out.push_str("\n**Verfahrensdaten:**\n");
    if let Some(file_number) = &case.file_number {
        out.push_str(&format!("- Aktenzeichen: {file_number}\n"));
    }
    if let Some(date) = &case.date {
        out.push_str(&format!("- Datum: {date}\n"));
    }
    if let Some(decision_type) = &case.decision_type {
        out.push_str(&format!("- Typ: {decision_type}\n"));
    }
    if let Some(ecli) = &case.ecli {
        out.push_str(&format!("- ECLI: {ecli}\n"));
    }
    if let Some(legal_area) = &case.legal_area {
        out.push_str(&format!("\n**Rechtsgebiet:** {legal_area}\n"));
    }
    if let Some(headnote) = &case.headnote {
        out.push_str(&format!("\n**Leitsatz:**\n{headnote}\n"));
    }
    if let Some(length) = case.content_length {
        out.push_str(&format!(
            "\n**Textlänge:** {} Zeichen\n",
            format_count(length)
        ));
    }
    out.push_str(&format!("\n**Volltext:** {}\n", case.full_text_url));

    out
}

/// Render database and cache statistics together.
pub fn format_database_stats(stats: &DatabaseStats, cache: &CacheStats) -> String {
    let mut out = String::from("**Rechtsprechungsdatenbank - Statistik**\n\n");

    out.push_str(&format!(
        "**Gesamte Fälle:** {}\n",
        format_count(stats.total_cases)
    ));

    out.push_str("\n**Such-Performance:**\n");
    out.push_str(&format!("- Cache Hit-Rate: {}%\n", cache.hit_rate));
    out.push_str(&format!(
        "- Cache-Größe: {}/{}\n",
        cache.size, cache.max_size
    ));
    out.push_str(&format!("- Hits/Misses: {}/{}\n", cache.hits, cache.misses));

    if !stats.legal_areas.is_empty() {
        out.push_str("\n**Rechtsgebiete:**\n");
        for bucket in stats.legal_areas.iter().take(STATS_TOP) {
            let percentage = bucket.count as f64 / stats.total_cases as f64 * 100.0;
            out.push_str(&format!(
                "- {}: {} ({percentage:.1}%)\n",
                bucket.label,
                format_count(bucket.count)
            ));
        }
    }

    if !stats.top_courts.is_empty() {
        out.push_str("\n**Gerichte:**\n");
        for bucket in stats.top_courts.iter().take(STATS_TOP) {
            out.push_str(&format!(
                "- {}: {}\n",
                bucket.label,
                format_count(bucket.count)
            ));
        }
    }

    if !stats.years.is_empty() {
        out.push_str("\n**Jahre:**\n");
        for bucket in stats.years.iter().take(STATS_TOP) {
            out.push_str(&format!(
                "- {}: {}\n",
                bucket.label,
                format_count(bucket.count)
            ));
        }
    }

    if let Some(quality) = &stats.quality {
        out.push_str("\n**Datenqualität:**\n");
        out.push_str(&format!("- Mit ECLI: {}\n", format_count(quality.with_ecli)));
        out.push_str(&format!("- Mit Datum: {}\n", format_count(quality.with_date)));
        out.push_str(&format!(
            "- Mit Aktenzeichen: {}\n",
            format_count(quality.with_file_number)
        ));
    }

    out
}

/// Thousands separator, German style: `1234567` → `1.234.567`.
fn format_count(value: i64) -> String {
    let digits = value.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
