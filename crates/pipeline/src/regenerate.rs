//! Ad-hoc single-slide regeneration.
//!
//! Runs outside any batch or finalizer: one attempt, an immediate
//! result, and its own credit debit. The debit is applied together with
//! the image persist, after generation succeeded, so a failed attempt
//! never costs the user anything.

use deckgen_core::content::SlideContent;
use deckgen_core::credits::CREDITS_PER_REGENERATE;
use deckgen_core::error::CoreError;
use deckgen_core::types::DbId;
use deckgen_db::models::slide::SlideImage;
use deckgen_db::repositories::{PresentationRepo, SlideRepo, UserRepo};
use deckgen_events::bus::{DeckEvent, SLIDE_IMAGE_GENERATED};

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::job::build_slide_prompt;

/// Optional slide edits applied before regenerating.
#[derive(Debug, Default)]
pub struct RegenerateOverrides {
    pub title: Option<String>,
    pub content: Option<SlideContent>,
}

/// Result of a successful regeneration.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegeneratedSlide {
    pub image_key: String,
    pub image_url: String,
    pub used_prompt: String,
}

/// Regenerate one slide's visual for its owner.
pub async fn regenerate_slide(
    ctx: &PipelineContext,
    slide_id: DbId,
    user_id: DbId,
    overrides: RegenerateOverrides,
) -> Result<RegeneratedSlide, PipelineError> {
    let mut slide = SlideRepo::find_by_id(&ctx.pool, slide_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "slide",
            id: slide_id,
        })?;
    let presentation = PresentationRepo::find_by_id(&ctx.pool, slide.presentation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "presentation",
            id: slide.presentation_id,
        })?;
    if presentation.user_id != user_id {
        return Err(CoreError::Forbidden("Slide belongs to another user".to_string()).into());
    }

    let user = UserRepo::find_by_id(&ctx.pool, user_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "user",
            id: user_id,
        })?;
    if user.credits_remaining < CREDITS_PER_REGENERATE {
        return Err(CoreError::InsufficientCredits {
            needed: CREDITS_PER_REGENERATE,
            available: user.credits_remaining,
        }
        .into());
    }

    // Persist edits first so the regenerated visual reflects them.
    if overrides.title.is_some() || overrides.content.is_some() {
        if let Some(title) = overrides.title {
            slide.title = title;
        }
        if let Some(content) = overrides.content {
            slide.text_content = Some(content.to_storage());
        }
        SlideRepo::update_text(
            &ctx.pool,
            slide.id,
            &slide.title,
            slide.text_content.as_deref().unwrap_or(""),
        )
        .await?;
    }

    let total_slides = SlideRepo::count_for_presentation(&ctx.pool, presentation.id).await?;
    let (prompt, applied_style) = build_slide_prompt(&presentation, &slide, total_slides);

    tracing::info!(slide_id, user_id, "Regenerating slide visual");
    let image = ctx
        .generator
        .generate(&prompt)
        .await
        .map_err(|e| PipelineError::Generation(e.to_string()))?;
    if image.bytes.is_empty() {
        return Err(PipelineError::Generation(
            "Generator returned an empty image payload".to_string(),
        ));
    }

    let key = deckgen_storage::slide_image_key(presentation.id, slide.slide_number as u32);
    ctx.blobs.put(&key, &image.bytes, "image/png").await?;
    let url = ctx.blobs.public_url(&key);

    // Debit and persist together: the balance was only pre-checked above,
    // so the conditional debit still guards against a concurrent spend.
    let mut tx = ctx.pool.begin().await?;
    if !UserRepo::debit_credits(&mut *tx, user_id, CREDITS_PER_REGENERATE).await? {
        return Err(CoreError::InsufficientCredits {
            needed: CREDITS_PER_REGENERATE,
            available: 0,
        }
        .into());
    }
    SlideRepo::set_image(
        &mut *tx,
        slide.id,
        &SlideImage {
            image_key: &key,
            image_url: &url,
            image_gen_prompt: &prompt,
            applied_style_info: &applied_style,
        },
    )
    .await?;
    tx.commit().await?;

    ctx.events.publish(
        DeckEvent::new(SLIDE_IMAGE_GENERATED)
            .for_presentation(presentation.id)
            .for_user(user_id)
            .with_payload(serde_json::json!({
                "slide_id": slide.id,
                "slide_number": slide.slide_number,
                "image_url": url,
                "regenerated": true,
            })),
    );

    Ok(RegeneratedSlide {
        image_key: key,
        image_url: url,
        used_prompt: prompt,
    })
}
