//! Health check endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /health
///
/// Liveness plus a database round trip.
pub async fn health(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    deckgen_db::health_check(&state.pool).await?;
    Ok(Json(json!({ "status": "ok", "database": "ok" })))
}
