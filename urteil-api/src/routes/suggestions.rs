use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::app_state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(suggestions))
}

#[derive(Debug, Clone, Deserialize)]
struct SuggestionParams {
    q: String,
}

#[instrument(name = "GET /suggestions", skip(state))]
async fn suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> Json<Vec<String>> {
    Json(state.engine().get_suggestions(&params.q).await)
}
