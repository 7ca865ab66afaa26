//! Presentation entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use deckgen_core::status::PresentationStatus;
use deckgen_core::types::{DbId, Timestamp};

/// A row from the `presentations` table.
///
/// `status` is stored as TEXT; use [`Presentation::status`] to get the
/// typed state. `batch_token` correlates the row to its in-flight visual
/// generation batch and is cleared when the batch is finalized or
/// cancelled; a presentation in `pending_visuals` has exactly one.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Presentation {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    #[sqlx(rename = "status")]
    #[serde(rename = "status")]
    pub status_raw: String,
    pub batch_token: Option<Uuid>,
    /// Shown on the title slide when set.
    pub presenter_name: Option<String>,
    /// Custom style prompt or predefined style key.
    pub style_prompt: Option<String>,
    pub font_choice: Option<String>,
    /// User's 1-10 creativity score.
    pub creativity_score: Option<i32>,
    pub created_at: Timestamp,
    pub last_edited_at: Timestamp,
}

impl Presentation {
    /// Typed presentation status.
    pub fn status(&self) -> PresentationStatus {
        PresentationStatus::from_str(&self.status_raw)
    }
}

/// DTO for creating a new presentation.
#[derive(Debug, Deserialize)]
pub struct CreatePresentation {
    pub title: String,
    pub presenter_name: Option<String>,
    pub style_prompt: Option<String>,
    pub font_choice: Option<String>,
    pub creativity_score: Option<i32>,
}

/// Read-only generation progress projection.
///
/// `completed_slides` counts slides with a non-null image reference;
/// `total_slides` counts all slide rows for the presentation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchProgress {
    pub status: String,
    pub total_slides: i64,
    pub completed_slides: i64,
}
