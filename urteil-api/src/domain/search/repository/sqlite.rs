//! SQLite-backed case repository using the FTS5 index for ranked retrieval.
//!
//! The store is read-only from this service's point of view: one `cases`
//! table plus an external-content `cases_fts` index over the same rowids.
//! bm25 ranking follows the lower-is-better convention throughout.

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row};
use time::OffsetDateTime;

use crate::domain::search::traits::{CaseRepository, Result, SearchError};
use crate::domain::search::types::{
    full_text_url, BucketCount, CaseHit, ContentStats, DataQuality, DatabaseStats, LegalCase,
    RetrievalRequest,
};

/// Number of histogram buckets reported per statistics dimension.
const STATS_BUCKETS: i64 = 15;

#[derive(Clone)]
pub struct SqliteCaseRepository {
    pool: SqlitePool,
}

impl SqliteCaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Startup gate: fail fast when the case table or its FTS index is
    /// missing. No search can work against such a database, so this error
    /// is surfaced to the initializer instead of being degraded.
    pub async fn ensure_schema(&self) -> Result<()> {
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name IN ('cases', 'cases_fts')",
        )
        .fetch_all(&self.pool)
        .await?;

        for required in ["cases", "cases_fts"] {
            if !tables.iter().any(|name| name.as_str() == required) {
                return Err(SearchError::Unavailable(format!(
                    "required table '{required}' is missing"
                )));
            }
        }

        Ok(())
    }
}

#[async_trait]
impl CaseRepository for SqliteCaseRepository {
    async fn search(&self, request: &RetrievalRequest) -> Result<Vec<CaseHit>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT c.id, c.slug, c.court_name, c.court_slug, c.jurisdiction, c.legal_area, \
             c.level_of_appeal, c.file_number, c.date, c.decision_type, c.ecli, c.content_raw, \
             c.content_clean, c.content_length, c.year, c.created_date, c.updated_date, \
             bm25(cases_fts) AS relevance_score, \
             snippet(cases_fts, 0, '<mark>', '</mark>', '...', ",
        );
        builder.push_bind(request.snippet_words);
        builder.push(
            ") AS snippet \
             FROM cases_fts JOIN cases c ON cases_fts.rowid = c.id \
             WHERE cases_fts MATCH ",
        );
        builder.push_bind(&request.match_query);

        let filters = &request.filters;
        if let Some(legal_area) = &filters.legal_area {
            builder.push(" AND c.legal_area LIKE ");
            builder.push_bind(format!("%{legal_area}%"));
        }
        if let Some(court) = &filters.court {
            if filters.court_includes_jurisdiction {
                builder.push(" AND (c.court_name LIKE ");
                builder.push_bind(format!("%{court}%"));
                builder.push(" OR c.jurisdiction LIKE ");
                builder.push_bind(format!("%{court}%"));
                builder.push(")");
            } else {
                builder.push(" AND c.court_name LIKE ");
                builder.push_bind(format!("%{court}%"));
            }
        }
        if let Some(year_from) = filters.year_from {
            builder.push(" AND c.year >= ");
            builder.push_bind(year_from);
        }
        if let Some(year_to) = filters.year_to {
            builder.push(" AND c.year <= ");
            builder.push_bind(year_to);
        }
        if let Some(file_number) = &filters.file_number {
            builder.push(" AND c.file_number LIKE ");
            builder.push_bind(format!("%{file_number}%"));
        }
        if let Some(ecli) = &filters.ecli {
            builder.push(" AND c.ecli LIKE ");
            builder.push_bind(format!("%{ecli}%"));
        }
        if let Some(level_of_appeal) = &filters.level_of_appeal {
            builder.push(" AND c.level_of_appeal LIKE ");
            builder.push_bind(format!("%{level_of_appeal}%"));
        }

        builder.push(" ORDER BY relevance_score ASC, c.year DESC, c.date DESC LIMIT ");
        builder.push_bind(request.limit);

        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            match map_case_hit(row) {
                Ok(hit) => hits.push(hit),
                // One bad row must not sink the whole result set.
                Err(err) => tracing::warn!(error = %err, "skipping unmappable result row"),
            }
        }

        Ok(hits)
    }

    async fn case_by_id(&self, id: i64) -> Result<Option<LegalCase>> {
        let row = sqlx::query(&format!("{CASE_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_case).transpose().map_err(Into::into)
    }

    async fn case_by_slug(&self, slug: &str) -> Result<Option<LegalCase>> {
        let row = sqlx::query(&format!("{CASE_COLUMNS} WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_case).transpose().map_err(Into::into)
    }

    async fn file_number_suggestions(&self, partial: &str, limit: i64) -> Result<Vec<String>> {
        let numbers = sqlx::query_scalar(
            "SELECT file_number FROM cases \
             WHERE file_number LIKE ? AND file_number IS NOT NULL AND file_number != '' \
             GROUP BY file_number \
             ORDER BY MAX(year) DESC \
             LIMIT ?",
        )
        .bind(format!("%{partial}%"))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(numbers)
    }

    async fn court_suggestions(&self, partial: &str, limit: i64) -> Result<Vec<String>> {
        let courts = sqlx::query_scalar(
            "SELECT court_name FROM cases \
             WHERE court_name LIKE ? AND court_name IS NOT NULL AND court_name != '' \
             GROUP BY court_name \
             ORDER BY COUNT(*) DESC \
             LIMIT ?",
        )
        .bind(format!("%{partial}%"))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(courts)
    }

    async fn statistics(&self) -> Result<DatabaseStats> {
        let total_cases: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cases")
            .fetch_one(&self.pool)
            .await?;

        if total_cases == 0 {
            return Ok(DatabaseStats::empty());
        }

        let legal_areas: Vec<(String, i64)> = sqlx::query_as(
            "SELECT legal_area, COUNT(*) FROM cases \
             WHERE legal_area IS NOT NULL AND legal_area != '' \
             GROUP BY legal_area ORDER BY COUNT(*) DESC LIMIT ?",
        )
        .bind(STATS_BUCKETS)
        .fetch_all(&self.pool)
        .await?;

        let top_courts: Vec<(String, i64)> = sqlx::query_as(
            "SELECT court_name, COUNT(*) FROM cases \
             WHERE court_name IS NOT NULL AND court_name != '' \
             GROUP BY court_name ORDER BY COUNT(*) DESC LIMIT ?",
        )
        .bind(STATS_BUCKETS)
        .fetch_all(&self.pool)
        .await?;

        let years: Vec<(i64, i64)> = sqlx::query_as(
            "SELECT year, COUNT(*) FROM cases \
             WHERE year IS NOT NULL AND year >= 2000 \
             GROUP BY year ORDER BY year DESC LIMIT ?",
        )
        .bind(STATS_BUCKETS)
        .fetch_all(&self.pool)
        .await?;

        let content_row = sqlx::query(
            "SELECT \
                AVG(CASE WHEN content_length > 0 THEN content_length END) AS avg_length, \
                MIN(CASE WHEN content_length > 0 THEN content_length END) AS min_length, \
                MAX(content_length) AS max_length, \
                COUNT(CASE WHEN content_length > 100 THEN 1 END) AS substantial \
             FROM cases",
        )
        .fetch_one(&self.pool)
        .await?;

        let content = ContentStats {
            avg_length: content_row
                .try_get::<Option<f64>, _>("avg_length")?
                .map(|avg| avg as i64)
                .unwrap_or(0),
            min_length: content_row
                .try_get::<Option<i64>, _>("min_length")?
                .unwrap_or(0),
            max_length: content_row
                .try_get::<Option<i64>, _>("max_length")?
                .unwrap_or(0),
            substantial: content_row.try_get("substantial")?,
        };

        let (with_ecli, with_date, with_file_number): (i64, i64, i64) = sqlx::query_as(
            "SELECT \
                COUNT(CASE WHEN ecli IS NOT NULL AND ecli != '' THEN 1 END), \
                COUNT(CASE WHEN date IS NOT NULL AND date != '' THEN 1 END), \
                COUNT(CASE WHEN file_number IS NOT NULL AND file_number != '' THEN 1 END) \
             FROM cases",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(DatabaseStats {
            total_cases,
            legal_areas: buckets(legal_areas),
            top_courts: buckets(top_courts),
            years: buckets(
                years
                    .into_iter()
                    .map(|(year, count)| (year.to_string(), count))
                    .collect(),
            ),
            content: Some(content),
            quality: Some(DataQuality {
                with_ecli,
                with_date,
                with_file_number,
            }),
            generated_at: OffsetDateTime::now_utc(),
        })
    }
}

const CASE_COLUMNS: &str = "SELECT id, slug, court_name, court_slug, jurisdiction, legal_area, \
     level_of_appeal, file_number, date, decision_type, ecli, content_raw, content_clean, \
     content_length, year, created_date, updated_date FROM cases";

fn buckets(pairs: Vec<(String, i64)>) -> Vec<BucketCount> {
    pairs
        .into_iter()
        .map(|(label, count)| BucketCount { label, count })
        .collect()
}

fn map_case(row: &SqliteRow) -> sqlx::Result<LegalCase> {
    let slug: String = row
        .try_get::<Option<String>, _>("slug")?
        .unwrap_or_default();

    Ok(LegalCase {
        id: row.try_get("id")?,
        full_text_url: full_text_url(&slug),
        slug,
        court_name: row
            .try_get::<Option<String>, _>("court_name")?
            .unwrap_or_default(),
        court_slug: row.try_get("court_slug")?,
        jurisdiction: row.try_get("jurisdiction")?,
        legal_area: row.try_get("legal_area")?,
        level_of_appeal: row.try_get("level_of_appeal")?,
        file_number: row.try_get("file_number")?,
        date: row.try_get("date")?,
        decision_type: row.try_get("decision_type")?,
        ecli: row.try_get("ecli")?,
        content_raw: row.try_get("content_raw")?,
        content_clean: row.try_get("content_clean")?,
        content_length: row.try_get("content_length")?,
        year: row.try_get("year")?,
        created_date: row.try_get("created_date")?,
        updated_date: row.try_get("updated_date")?,
        headnote: None,
    })
}

fn map_case_hit(row: &SqliteRow) -> sqlx::Result<CaseHit> {
    Ok(CaseHit {
        case: map_case(row)?,
        relevance_score: row.try_get("relevance_score")?,
        snippet: row
            .try_get::<Option<String>, _>("snippet")?
            .unwrap_or_default(),
    })
}
