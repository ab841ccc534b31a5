use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::formatter,
    domain::search::{AdvancedFilters, SearchQuery, SearchResult},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(search))
        .route("/advanced", post(advanced_search))
}

#[derive(Debug, Clone, Deserialize)]
struct SearchParams {
    q: String,
    legal_area: Option<String>,
    court: Option<String>,
    year_from: Option<i32>,
    year_to: Option<i32>,
    limit: Option<i64>,
    /// "text" renders the human-readable form instead of JSON.
    format: Option<String>,
}

#[instrument(name = "GET /search", skip(state))]
async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = SearchQuery {
        query: params.q,
        legal_area: params.legal_area,
        court: params.court,
        year_from: params.year_from,
        year_to: params.year_to,
        limit: params.limit.unwrap_or_else(|| SearchQuery::default().limit),
    };

    let results = state.engine().search(&query).await;

    if params.format.as_deref() == Some("text") {
        formatter::format_search_results(&results, &query.query).into_response()
    } else {
        Json(results).into_response()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct AdvancedSearchBody {
    query: String,
    #[serde(flatten)]
    filters: AdvancedFilters,
}

#[instrument(name = "POST /search/advanced", skip(state, body))]
async fn advanced_search(
    State(state): State<AppState>,
    Json(body): Json<AdvancedSearchBody>,
) -> Json<Vec<SearchResult>> {
    Json(
        state
            .engine()
            .advanced_search(&body.query, &body.filters)
            .await,
    )
}
