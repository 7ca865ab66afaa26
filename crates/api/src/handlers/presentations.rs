//! Handlers for the `/presentations` resource.
//!
//! Generation is asynchronous: the generate endpoint debits credits,
//! creates the rows, submits the visual batch, and returns immediately
//! with the batch token. Clients poll the progress endpoint for the
//! outcome.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use deckgen_core::credits;
use deckgen_core::error::CoreError;
use deckgen_core::types::DbId;
use deckgen_db::models::presentation::{CreatePresentation, Presentation};
use deckgen_db::models::slide::CreateSlide;
use deckgen_db::repositories::{PresentationRepo, SlideRepo, UserRepo};
use deckgen_openai::TextStyle;
use deckgen_pipeline::{batch_progress, cancel_batch, submit_visuals, CancelOutcome, PipelineError};

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Most slides a single generation request may ask for.
const MAX_SLIDES_PER_REQUEST: usize = 20;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a presentation and verify the caller owns it.
async fn find_and_authorize(
    pool: &sqlx::PgPool,
    presentation_id: DbId,
    auth: &AuthUser,
) -> AppResult<Presentation> {
    let presentation = PresentationRepo::find_by_id(pool, presentation_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "presentation",
            id: presentation_id,
        }))?;

    if presentation.user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "Cannot access another user's presentation".to_string(),
        )));
    }

    Ok(presentation)
}

// ---------------------------------------------------------------------------
// Generate
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct GeneratePresentation {
    pub topic: String,
    pub slide_count: usize,
    /// `"bullet"` (default) or `"paragraph"`.
    pub text_style: Option<String>,
    pub presenter_name: Option<String>,
    /// Predefined style key or a custom style prompt.
    pub style: Option<String>,
    pub font_choice: Option<String>,
    /// 1-10; drives layout creativity tiers.
    pub creativity_score: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct GenerationAccepted {
    pub presentation_id: DbId,
    pub batch_token: Uuid,
    pub slide_count: usize,
}

/// POST /api/v1/presentations/generate
///
/// Generate slide text synchronously, then debit credits and submit the
/// visual batch. Returns 202 with the batch token once the batch is
/// spawned; visual progress is reported via the progress endpoint.
pub async fn generate_presentation(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<GeneratePresentation>,
) -> AppResult<impl IntoResponse> {
    let topic = input.topic.trim();
    if topic.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Topic must not be empty".to_string(),
        )));
    }
    if input.slide_count == 0 || input.slide_count > MAX_SLIDES_PER_REQUEST {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Slide count must be between 1 and {MAX_SLIDES_PER_REQUEST}"
        ))));
    }
    let text_style = TextStyle::from_str(input.text_style.as_deref().unwrap_or("bullet"));

    // Reject an unaffordable request before creating any rows or paying
    // for the text generation call. The atomic conditional debit at batch
    // submission remains the authoritative check.
    let cost = credits::batch_cost(input.slide_count);
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "user",
            id: auth.user_id,
        }))?;
    if user.credits_remaining < cost {
        return Err(AppError::Core(CoreError::InsufficientCredits {
            needed: cost,
            available: user.credits_remaining,
        }));
    }

    let presentation = PresentationRepo::create(
        &state.pool,
        auth.user_id,
        &CreatePresentation {
            title: topic.to_string(),
            presenter_name: input.presenter_name.clone(),
            style_prompt: input.style,
            font_choice: input.font_choice,
            creativity_score: input.creativity_score,
        },
    )
    .await?;

    let drafts = state
        .openai
        .generate_slide_text(
            topic,
            text_style,
            input.slide_count,
            input.presenter_name.as_deref(),
        )
        .await
        .map_err(|e| PipelineError::Generation(e.to_string()))?;

    let specs: Vec<CreateSlide> = drafts
        .into_iter()
        .map(|draft| CreateSlide {
            slide_number: draft.slide_number as i32,
            title: draft.title,
            content: draft.content,
        })
        .collect();
    let slide_count = specs.len();

    let batch_token = submit_visuals(&state.pipeline, presentation.id, auth.user_id, specs).await?;

    tracing::info!(
        presentation_id = presentation.id,
        user_id = auth.user_id,
        %batch_token,
        slide_count,
        "Presentation generation accepted"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(DataResponse {
            data: GenerationAccepted {
                presentation_id: presentation.id,
                batch_token,
                slide_count,
            },
        }),
    ))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PresentationDetail {
    #[serde(flatten)]
    pub presentation: Presentation,
    pub slides: Vec<deckgen_db::models::slide::Slide>,
}

/// GET /api/v1/presentations/{id}
pub async fn get_presentation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(presentation_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let presentation = find_and_authorize(&state.pool, presentation_id, &auth).await?;
    let slides = SlideRepo::list_for_presentation(&state.pool, presentation_id).await?;
    Ok(Json(DataResponse {
        data: PresentationDetail {
            presentation,
            slides,
        },
    }))
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// GET /api/v1/presentations/{id}/progress
///
/// Read-only `{status, total_slides, completed_slides}` projection.
pub async fn get_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(presentation_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_and_authorize(&state.pool, presentation_id, &auth).await?;
    let progress = batch_progress(&state.pool, presentation_id).await?;
    Ok(Json(DataResponse { data: progress }))
}

// ---------------------------------------------------------------------------
// Cancel
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub cancelled: bool,
    pub refunded: i32,
    pub message: &'static str,
}

/// POST /api/v1/presentations/{id}/cancel
///
/// Revoke the in-flight batch. A no-op (with a message) when nothing is
/// in flight.
pub async fn cancel_presentation(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(presentation_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let outcome = cancel_batch(&state.pipeline, presentation_id, auth.user_id).await?;

    let response = match outcome {
        CancelOutcome::Cancelled { refunded } => CancelResponse {
            cancelled: true,
            refunded,
            message: "Generation cancelled",
        },
        CancelOutcome::NotCancellable => CancelResponse {
            cancelled: false,
            refunded: 0,
            message: "No generation in progress to cancel",
        },
    };
    Ok(Json(DataResponse { data: response }))
}
