//! Batch cancellation.
//!
//! Cancellation is cooperative: the registry fires the batch's token and
//! in-flight jobs observe it between attempts. Slides whose jobs
//! committed before the signal keep their images. The refund is
//! recomputed from the slide count at cancellation time rather than the
//! originally debited amount; `deckgen_core::credits::cancellation_refund`
//! documents that choice.

use deckgen_core::credits;
use deckgen_core::error::CoreError;
use deckgen_core::status::PresentationStatus;
use deckgen_core::types::DbId;
use deckgen_db::repositories::{PresentationRepo, SlideRepo, UserRepo};
use deckgen_events::bus::{DeckEvent, BATCH_CANCELLED, CREDITS_REFUNDED};

use crate::context::PipelineContext;
use crate::error::PipelineError;

/// What a cancellation request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The batch was revoked and the presentation failed.
    Cancelled { refunded: i32 },
    /// The presentation was not in `pending_visuals`; nothing to cancel.
    NotCancellable,
}

/// Cancel the in-flight batch of a presentation owned by `user_id`.
pub async fn cancel_batch(
    ctx: &PipelineContext,
    presentation_id: DbId,
    user_id: DbId,
) -> Result<CancelOutcome, PipelineError> {
    let presentation = PresentationRepo::find_by_id(&ctx.pool, presentation_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "presentation",
            id: presentation_id,
        })?;
    if presentation.user_id != user_id {
        return Err(
            CoreError::Forbidden("Presentation belongs to another user".to_string()).into(),
        );
    }

    if presentation.status() != PresentationStatus::PendingVisuals {
        tracing::info!(
            presentation_id,
            status = presentation.status_raw,
            "Cancellation requested but no batch is in flight"
        );
        return Ok(CancelOutcome::NotCancellable);
    }

    // Pending visuals without a token is a broken state; fail it outright
    // rather than leaving a batch that can never finalize.
    let Some(batch_token) = presentation.batch_token else {
        tracing::warn!(
            presentation_id,
            "Presentation pending visuals with no batch token; forcing failure"
        );
        PresentationRepo::fail_if_pending(&ctx.pool, presentation_id).await?;
        return Ok(CancelOutcome::Cancelled { refunded: 0 });
    };

    let revoked = ctx.batches.cancel(&batch_token);
    if !revoked {
        tracing::warn!(
            presentation_id,
            %batch_token,
            "Batch token not registered in this process; revocation skipped"
        );
    }

    let slide_count = SlideRepo::count_for_presentation(&ctx.pool, presentation_id).await?;
    let refund = credits::cancellation_refund(slide_count);

    // Claiming the token is the same double-refund guard the finalizer
    // uses: whichever of the two settles first wins the refund.
    let mut tx = ctx.pool.begin().await?;
    let owed = PresentationRepo::claim_batch_token(&mut *tx, presentation_id).await?;
    PresentationRepo::finalize_status(
        &mut *tx,
        presentation_id,
        PresentationStatus::GenerationFailed,
    )
    .await?;
    let refunded = if owed {
        UserRepo::refund_credits(&mut *tx, user_id, refund).await?;
        refund
    } else {
        0
    };
    tx.commit().await?;

    tracing::info!(
        presentation_id,
        user_id,
        %batch_token,
        slide_count,
        refunded,
        "Batch cancelled"
    );
    ctx.events.publish(
        DeckEvent::new(BATCH_CANCELLED)
            .for_presentation(presentation_id)
            .for_user(user_id)
            .with_payload(serde_json::json!({
                "batch_token": batch_token,
                "refunded": refunded,
            })),
    );
    if refunded > 0 {
        ctx.events.publish(
            DeckEvent::new(CREDITS_REFUNDED)
                .for_presentation(presentation_id)
                .for_user(user_id)
                .with_payload(serde_json::json!({ "amount": refunded })),
        );
    }

    Ok(CancelOutcome::Cancelled { refunded })
}
