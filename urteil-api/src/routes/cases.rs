use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::search::{LegalCase, SearchResult},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id", get(case_details))
        .route("/:id/similar", get(similar_cases))
}

#[instrument(name = "GET /cases/:id", skip(state))]
async fn case_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<LegalCase>, StatusCode> {
    state
        .engine()
        .case_details(id)
        .await
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Clone, Deserialize)]
struct SimilarParams {
    limit: Option<i64>,
}

#[instrument(name = "GET /cases/:id/similar", skip(state))]
async fn similar_cases(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(params): Query<SimilarParams>,
) -> Json<Vec<SearchResult>> {
    Json(state.engine().find_similar(id, params.limit.unwrap_or(10)).await)
}
