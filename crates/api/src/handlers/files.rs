//! Serves generated slide images from the blob store.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use deckgen_storage::StorageError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /files/{*key}
///
/// Fetch a stored blob by its full key, e.g. `/files/7/slide_1_ab12cd34.png`.
pub async fn get_file(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<impl IntoResponse> {
    let (status, content_type, body) = match state.pipeline.blobs.get(&key).await {
        Ok(bytes) => (StatusCode::OK, "image/png", bytes),
        Err(StorageError::NotFound(_)) | Err(StorageError::InvalidKey(_)) => (
            StatusCode::NOT_FOUND,
            "application/json",
            br#"{"error":"File not found","code":"NOT_FOUND"}"#.to_vec(),
        ),
        Err(other) => return Err(AppError::InternalError(other.to_string())),
    };

    Ok((status, [(header::CONTENT_TYPE, content_type)], body))
}
