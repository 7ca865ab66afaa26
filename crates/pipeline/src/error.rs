//! Pipeline error type.

use deckgen_core::error::CoreError;
use deckgen_storage::StorageError;

/// Errors surfaced by the synchronous edges of the pipeline (submission,
/// cancellation, regeneration, progress). Asynchronous job failures never
/// appear here; they are reported through batch finalization.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Image generation failed: {0}")]
    Generation(String),
}
