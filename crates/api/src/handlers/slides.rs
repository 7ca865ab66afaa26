//! Handlers for the `/slides` resource.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use deckgen_core::content::SlideContent;
use deckgen_core::types::DbId;
use deckgen_pipeline::{regenerate_slide, RegenerateOverrides};

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    /// New slide title, applied before regenerating.
    pub title: Option<String>,
    /// New body content: a JSON array of strings (bullets) or a single
    /// string (paragraph).
    pub content: Option<SlideContent>,
}

/// POST /api/v1/slides/{id}/regenerate
///
/// Regenerate one slide's visual outside any batch: applies the optional
/// edits, runs a single generation attempt, and debits credits only on
/// success. Unlike batch generation this reports its result synchronously.
pub async fn regenerate(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(slide_id): Path<DbId>,
    Json(input): Json<RegenerateRequest>,
) -> AppResult<impl IntoResponse> {
    let result = regenerate_slide(
        &state.pipeline,
        slide_id,
        auth.user_id,
        RegenerateOverrides {
            title: input.title,
            content: input.content,
        },
    )
    .await?;

    tracing::info!(slide_id, user_id = auth.user_id, "Slide visual regenerated");
    Ok(Json(DataResponse { data: result }))
}
