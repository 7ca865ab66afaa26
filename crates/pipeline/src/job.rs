//! Single-slide visual generation job.
//!
//! The retryable unit of work: build the image prompt, call the
//! generator, write the blob, persist the slide row. Every failure is
//! classified and fed to the retry policy; nothing escapes `run`, which
//! always resolves to a boolean outcome so the batch fan-in cannot hang
//! on one faulty unit.

use rand::rng;
use tokio_util::sync::CancellationToken;

use deckgen_core::prompt::{build_image_prompt, CreativityTier, PromptInputs};
use deckgen_core::retry::{FailureKind, RetryDecision};
use deckgen_core::status::PresentationStatus;
use deckgen_core::types::DbId;
use deckgen_db::models::presentation::Presentation;
use deckgen_db::models::slide::{Slide, SlideImage};
use deckgen_db::repositories::{PresentationRepo, SlideRepo};
use deckgen_events::bus::{DeckEvent, SLIDE_IMAGE_GENERATED};
use deckgen_openai::styles::style_description;

use crate::context::PipelineContext;
use crate::generator::GenerationFailure;

/// Creativity score assumed when the presentation does not carry one.
const DEFAULT_CREATIVITY_SCORE: i32 = 5;
/// Font assumed when the presentation does not carry one.
const DEFAULT_FONT: &str = "Arial";

/// One slide's visual generation, spawned per batch member or run ad hoc.
#[derive(Debug, Clone, Copy)]
pub struct VisualGenerationJob {
    pub slide_id: DbId,
    pub presentation_id: DbId,
    /// Logging context only; no credit action happens inside a job.
    pub user_id: DbId,
}

/// Terminal result of one attempt, before retry classification.
enum AttemptOutcome {
    /// Image generated and persisted.
    Generated,
    /// Slide already has an image; nothing to do.
    AlreadyDone,
    /// Owning presentation already failed; counted as handled elsewhere.
    Skipped,
}

impl VisualGenerationJob {
    /// Run the job to a terminal outcome.
    ///
    /// Returns `true` only when the slide durably has an image (freshly
    /// generated or already there). Retryable failures re-run with the
    /// policy's backoff; the backoff sleep is cancellation-aware so a
    /// revoked batch does not wait out its delays.
    pub async fn run(&self, ctx: &PipelineContext, cancel: &CancellationToken) -> bool {
        let mut attempt: u32 = 0;
        loop {
            if cancel.is_cancelled() {
                tracing::info!(
                    slide_id = self.slide_id,
                    user_id = self.user_id,
                    "Generation job cancelled before attempt"
                );
                return false;
            }

            let failure = match self.attempt(ctx).await {
                Ok(AttemptOutcome::Generated) => {
                    tracing::info!(
                        slide_id = self.slide_id,
                        presentation_id = self.presentation_id,
                        attempt,
                        "Slide visual generated"
                    );
                    return true;
                }
                Ok(AttemptOutcome::AlreadyDone) => {
                    tracing::info!(
                        slide_id = self.slide_id,
                        "Slide already has an image; skipping generation"
                    );
                    return true;
                }
                Ok(AttemptOutcome::Skipped) => return false,
                Err(failure) => failure,
            };

            match ctx.retry_policy.decide(failure.kind, attempt) {
                RetryDecision::RetryAfter(delay) => {
                    tracing::warn!(
                        slide_id = self.slide_id,
                        attempt,
                        delay_secs = delay.as_secs(),
                        kind = ?failure.kind,
                        error = %failure,
                        "Generation attempt failed; retrying"
                    );
                    if !wait_backoff(cancel, delay).await {
                        tracing::info!(
                            slide_id = self.slide_id,
                            "Generation job cancelled during backoff"
                        );
                        return false;
                    }
                    attempt += 1;
                }
                RetryDecision::GiveUp => {
                    tracing::error!(
                        slide_id = self.slide_id,
                        presentation_id = self.presentation_id,
                        attempt,
                        kind = ?failure.kind,
                        error = %failure,
                        "Generation job giving up"
                    );
                    if failure.kind.is_retryable() {
                        self.fast_fail_presentation(ctx).await;
                    }
                    return false;
                }
            }
        }
    }

    /// One generation attempt: preconditions, generate, store, persist.
    async fn attempt(&self, ctx: &PipelineContext) -> Result<AttemptOutcome, GenerationFailure> {
        let slide = SlideRepo::find_by_id(&ctx.pool, self.slide_id)
            .await
            .map_err(persistence_failure)?
            .ok_or_else(|| {
                GenerationFailure::permanent(format!("Slide {} not found", self.slide_id))
            })?;

        // Idempotent short-circuit: never re-bill the generator for a
        // slide whose job already committed.
        if slide.image_generated {
            return Ok(AttemptOutcome::AlreadyDone);
        }

        let presentation = PresentationRepo::find_by_id(&ctx.pool, slide.presentation_id)
            .await
            .map_err(persistence_failure)?
            .ok_or_else(|| {
                GenerationFailure::permanent(format!(
                    "Presentation {} not found",
                    slide.presentation_id
                ))
            })?;

        if presentation.status() == PresentationStatus::GenerationFailed {
            tracing::info!(
                slide_id = self.slide_id,
                presentation_id = presentation.id,
                "Presentation already failed; skipping slide generation"
            );
            return Ok(AttemptOutcome::Skipped);
        }

        let total_slides = SlideRepo::count_for_presentation(&ctx.pool, presentation.id)
            .await
            .map_err(persistence_failure)?;

        let (prompt, applied_style) = build_slide_prompt(&presentation, &slide, total_slides);

        let image = ctx.generator.generate(&prompt).await?;
        if image.bytes.is_empty() {
            return Err(GenerationFailure::permanent(
                "Generator returned an empty image payload",
            ));
        }

        let key = deckgen_storage::slide_image_key(presentation.id, slide.slide_number as u32);
        ctx.blobs
            .put(&key, &image.bytes, "image/png")
            .await
            .map_err(|e| GenerationFailure {
                kind: FailureKind::Persistence,
                message: format!("Blob write failed: {e}"),
            })?;
        let url = ctx.blobs.public_url(&key);

        SlideRepo::set_image(
            &ctx.pool,
            slide.id,
            &SlideImage {
                image_key: &key,
                image_url: &url,
                image_gen_prompt: &prompt,
                applied_style_info: &applied_style,
            },
        )
        .await
        .map_err(persistence_failure)?;

        ctx.events.publish(
            DeckEvent::new(SLIDE_IMAGE_GENERATED)
                .for_presentation(presentation.id)
                .for_user(self.user_id)
                .with_payload(serde_json::json!({
                    "slide_id": slide.id,
                    "slide_number": slide.slide_number,
                    "image_url": url,
                })),
        );

        Ok(AttemptOutcome::Generated)
    }

    /// Retries exhausted on a transient error: force the presentation to
    /// `generation_failed` so still-pending jobs and the finalizer see it.
    /// Best-effort; the finalizer remains the authoritative settlement.
    async fn fast_fail_presentation(&self, ctx: &PipelineContext) {
        match PresentationRepo::fail_if_pending(&ctx.pool, self.presentation_id).await {
            Ok(true) => {
                tracing::warn!(
                    presentation_id = self.presentation_id,
                    slide_id = self.slide_id,
                    "Fast-failed presentation after exhausting retries"
                );
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    presentation_id = self.presentation_id,
                    error = %e,
                    "Failed to fast-fail presentation"
                );
            }
        }
    }
}

/// Build the image prompt and the applied style description for a slide.
pub(crate) fn build_slide_prompt(
    presentation: &Presentation,
    slide: &Slide,
    total_slides: i64,
) -> (String, String) {
    let style = style_description(presentation.style_prompt.as_deref().unwrap_or("keynote_modern"));
    let creativity_score = presentation
        .creativity_score
        .unwrap_or(DEFAULT_CREATIVITY_SCORE);
    let content = slide.content();

    let inputs = PromptInputs {
        slide_title: &slide.title,
        content: &content,
        style_description: style,
        slide_number: slide.slide_number as u32,
        total_slides: total_slides as u32,
        creativity_score,
        presentation_topic: Some(presentation.title.as_str()),
        font_choice: presentation.font_choice.as_deref().unwrap_or(DEFAULT_FONT),
        presenter_name: presentation.presenter_name.as_deref(),
    };
    let prompt = build_image_prompt(&inputs, &mut rng());

    let tier = CreativityTier::from_score(creativity_score);
    let applied_style = format!("{style}{}", tier.style_suffix());
    (prompt, applied_style)
}

fn persistence_failure(e: sqlx::Error) -> GenerationFailure {
    GenerationFailure {
        kind: FailureKind::Persistence,
        message: format!("Database error: {e}"),
    }
}

/// Sleep for `delay` unless the batch is cancelled first.
///
/// Returns `false` when the wait was interrupted by cancellation.
pub(crate) async fn wait_backoff(cancel: &CancellationToken, delay: std::time::Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn backoff_wait_completes_when_not_cancelled() {
        let cancel = CancellationToken::new();
        assert!(wait_backoff(&cancel, Duration::from_secs(60)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_wait_interrupted_by_cancellation() {
        let cancel = CancellationToken::new();
        let waiter = tokio::spawn({
            let cancel = cancel.clone();
            async move { wait_backoff(&cancel, Duration::from_secs(600)).await }
        });
        // Let the waiter reach its select before firing the token.
        tokio::task::yield_now().await;
        cancel.cancel();
        assert!(!waiter.await.unwrap());
    }
}
