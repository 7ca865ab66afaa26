//! Batch progress projection for status polling.

use deckgen_core::error::CoreError;
use deckgen_core::types::DbId;
use deckgen_db::models::presentation::BatchProgress;
use deckgen_db::repositories::PresentationRepo;
use deckgen_db::DbPool;

use crate::error::PipelineError;

/// Read-only `{status, total_slides, completed_slides}` projection.
pub async fn batch_progress(
    pool: &DbPool,
    presentation_id: DbId,
) -> Result<BatchProgress, PipelineError> {
    PresentationRepo::progress(pool, presentation_id)
        .await?
        .ok_or_else(|| {
            CoreError::NotFound {
                entity: "presentation",
                id: presentation_id,
            }
            .into()
        })
}
