use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    app_state::AppState,
    domain::formatter,
    domain::search::{CacheStats, DatabaseStats},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(stats))
        .route("/cache", delete(clear_cache))
}

#[derive(Debug, Clone, Serialize)]
struct StatsResponse {
    database: DatabaseStats,
    cache: CacheStats,
}

#[derive(Debug, Clone, Deserialize)]
struct StatsParams {
    format: Option<String>,
}

#[instrument(name = "GET /stats", skip(state))]
async fn stats(State(state): State<AppState>, Query(params): Query<StatsParams>) -> Response {
    let database = state.engine().database_stats().await;
    let cache = state.engine().cache_stats();

    if params.format.as_deref() == Some("text") {
        formatter::format_database_stats(&database, &cache).into_response()
    } else {
        Json(StatsResponse { database, cache }).into_response()
    }
}

#[instrument(name = "DELETE /stats/cache", skip(state))]
async fn clear_cache(State(state): State<AppState>) -> StatusCode {
    state.engine().clear_cache();
    StatusCode::NO_CONTENT
}
