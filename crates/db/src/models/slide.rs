//! Slide entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use deckgen_core::content::SlideContent;
use deckgen_core::types::{DbId, Timestamp};

/// A row from the `slides` table.
///
/// Invariant: a slide with `image_generated = true` always has a non-null
/// `image_key`. `slide_number` is 1-based, unique within its presentation,
/// and immutable after creation.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Slide {
    pub id: DbId,
    pub presentation_id: DbId,
    pub slide_number: i32,
    pub title: String,
    /// Bullet slides store a JSON array string; paragraph slides store raw
    /// text. Parse with [`Slide::content`].
    pub text_content: Option<String>,
    /// Blob store key of the generated image.
    pub image_key: Option<String>,
    /// Stable public URL derived from `image_key`.
    pub image_url: Option<String>,
    /// The prompt actually sent to the image model.
    pub image_gen_prompt: Option<String>,
    /// The style description actually applied to this slide's visual.
    pub applied_style_info: Option<String>,
    /// Idempotency flag: the generation job for this slide already
    /// succeeded and must not run again.
    pub image_generated: bool,
    pub created_at: Timestamp,
}

impl Slide {
    /// Parse the stored body content into its tagged variant.
    pub fn content(&self) -> SlideContent {
        self.text_content
            .as_deref()
            .map(SlideContent::from_storage)
            .unwrap_or_else(|| SlideContent::Paragraph(String::new()))
    }
}

/// DTO for bulk-creating the slides of a presentation before batch submit.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSlide {
    pub slide_number: i32,
    pub title: String,
    pub content: SlideContent,
}

/// Fields persisted atomically when a generation job succeeds.
#[derive(Debug, Clone)]
pub struct SlideImage<'a> {
    pub image_key: &'a str,
    pub image_url: &'a str,
    pub image_gen_prompt: &'a str,
    pub applied_style_info: &'a str,
}
