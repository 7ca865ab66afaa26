//! Batch finalization: the single place where a batch's verdict is
//! decided and credit compensation happens.
//!
//! The finalizer runs exactly once per batch, after every job has
//! reached a terminal outcome. It never propagates an error: any failure
//! inside the primary settlement is caught, logged, and followed by a
//! best-effort fallback that forces `generation_failed` plus a refund if
//! the presentation is still `pending_visuals`. A presentation can only
//! stay stuck in `pending_visuals` if both passes raise, which is an
//! alert condition, not a silent one.

use deckgen_core::finalize::evaluate_batch;
use deckgen_core::status::PresentationStatus;
use deckgen_core::types::DbId;
use deckgen_db::repositories::{PresentationRepo, SlideRepo, UserRepo};
use deckgen_events::bus::{DeckEvent, BATCH_FINALIZED, CREDITS_REFUNDED};

use crate::context::PipelineContext;

/// Settle a finished batch: final status, token clear, refund if owed.
pub async fn finalize(
    ctx: &PipelineContext,
    outcomes: &[Option<bool>],
    presentation_id: DbId,
    user_id: DbId,
    credits_debited: i32,
) {
    match try_finalize(ctx, outcomes, presentation_id, user_id, credits_debited).await {
        Ok(settlement) => {
            tracing::info!(
                presentation_id,
                user_id,
                final_status = settlement.status,
                refunded = settlement.refunded,
                "Batch finalized"
            );
            ctx.events.publish(
                DeckEvent::new(BATCH_FINALIZED)
                    .for_presentation(presentation_id)
                    .for_user(user_id)
                    .with_payload(serde_json::json!({
                        "status": settlement.status,
                        "refunded": settlement.refunded,
                    })),
            );
            if settlement.refunded > 0 {
                publish_refund(ctx, presentation_id, user_id, settlement.refunded);
            }
        }
        Err(e) => {
            tracing::error!(
                presentation_id,
                user_id,
                error = %e,
                "Batch finalization failed; running fallback pass"
            );
            fallback_finalize(ctx, presentation_id, user_id, credits_debited).await;
        }
    }
}

/// Outcome of a successful settlement, for logging and events.
struct Settlement {
    status: &'static str,
    refunded: i32,
}

async fn try_finalize(
    ctx: &PipelineContext,
    outcomes: &[Option<bool>],
    presentation_id: DbId,
    user_id: DbId,
    credits_debited: i32,
) -> Result<Settlement, sqlx::Error> {
    let Some(presentation) = PresentationRepo::find_by_id(&ctx.pool, presentation_id).await? else {
        // The presentation row is gone but the user may still be owed the
        // debit. Refund rather than silently dropping the compensation.
        return if UserRepo::find_by_id(&ctx.pool, user_id).await?.is_some() {
            tracing::error!(
                presentation_id,
                user_id,
                credits_debited,
                "Presentation missing at finalize; refunding debit anyway"
            );
            UserRepo::refund_credits(&ctx.pool, user_id, credits_debited).await?;
            publish_refund(ctx, presentation_id, user_id, credits_debited);
            Ok(Settlement {
                status: "missing",
                refunded: credits_debited,
            })
        } else {
            tracing::error!(
                presentation_id,
                user_id,
                "Presentation and user both missing at finalize; nothing to settle"
            );
            Ok(Settlement {
                status: "missing",
                refunded: 0,
            })
        };
    };

    if UserRepo::find_by_id(&ctx.pool, user_id).await?.is_none() {
        // No user record means no refund target; fail the presentation and
        // clear the token so it does not look in-flight forever.
        tracing::error!(
            presentation_id,
            user_id,
            "User missing at finalize; failing presentation without refund"
        );
        PresentationRepo::finalize_status(
            &ctx.pool,
            presentation_id,
            PresentationStatus::GenerationFailed,
        )
        .await?;
        return Ok(Settlement {
            status: PresentationStatus::GenerationFailed.as_str(),
            refunded: 0,
        });
    }

    // Cancellation (or a fast-fail) may have raced the batch: keep the
    // failed status but still settle the refund if it has not happened.
    // The token claim is the double-refund guard, atomic with the refund.
    if presentation.status() == PresentationStatus::GenerationFailed {
        let mut tx = ctx.pool.begin().await?;
        let owed = PresentationRepo::claim_batch_token(&mut *tx, presentation_id).await?;
        let refunded = if owed {
            UserRepo::refund_credits(&mut *tx, user_id, credits_debited).await?;
            credits_debited
        } else {
            0
        };
        tx.commit().await?;
        return Ok(Settlement {
            status: PresentationStatus::GenerationFailed.as_str(),
            refunded,
        });
    }

    let actual_images = SlideRepo::count_with_image(&ctx.pool, presentation_id).await?;
    let outcome = evaluate_batch(outcomes, actual_images);
    tracing::info!(
        presentation_id,
        success_count = outcome.success_count,
        actual_images,
        expected = outcomes.len(),
        successful = outcome.successful,
        "Evaluating batch outcome"
    );

    let mut tx = ctx.pool.begin().await?;
    let owed = PresentationRepo::claim_batch_token(&mut *tx, presentation_id).await?;
    let (status, refunded) = if outcome.successful {
        let applied = PresentationRepo::finalize_status(
            &mut *tx,
            presentation_id,
            PresentationStatus::VisualsComplete,
        )
        .await?;
        if applied {
            (PresentationStatus::VisualsComplete, 0)
        } else {
            // A concurrent cancel committed after the status read above.
            // Its terminal state and refund stand; the token claim it
            // already made keeps `owed` false here.
            tracing::warn!(
                presentation_id,
                "Batch succeeded but was settled concurrently; keeping failed status"
            );
            (PresentationStatus::GenerationFailed, 0)
        }
    } else {
        PresentationRepo::finalize_status(
            &mut *tx,
            presentation_id,
            PresentationStatus::GenerationFailed,
        )
        .await?;
        let refunded = if owed {
            UserRepo::refund_credits(&mut *tx, user_id, credits_debited).await?;
            credits_debited
        } else {
            0
        };
        (PresentationStatus::GenerationFailed, refunded)
    };
    tx.commit().await?;

    Ok(Settlement {
        status: status.as_str(),
        refunded,
    })
}

/// Best-effort second chance after a failed settlement. Forces
/// `generation_failed` plus the refund if the presentation is still
/// `pending_visuals`; its own failures are logged only.
async fn fallback_finalize(
    ctx: &PipelineContext,
    presentation_id: DbId,
    user_id: DbId,
    credits_debited: i32,
) {
    let result: Result<bool, sqlx::Error> = async {
        let mut tx = ctx.pool.begin().await?;
        let failed = PresentationRepo::fail_if_pending(&mut *tx, presentation_id).await?;
        if failed {
            UserRepo::refund_credits(&mut *tx, user_id, credits_debited).await?;
        }
        tx.commit().await?;
        Ok(failed)
    }
    .await;

    match result {
        Ok(true) => {
            tracing::warn!(
                presentation_id,
                user_id,
                credits_debited,
                "Fallback pass forced generation_failed and refunded"
            );
            publish_refund(ctx, presentation_id, user_id, credits_debited);
        }
        Ok(false) => {
            tracing::info!(presentation_id, "Fallback pass found nothing to settle");
        }
        Err(e) => {
            // Both passes failed. The presentation may be stuck in
            // pending_visuals; this log line is the monitoring signal.
            tracing::error!(
                presentation_id,
                user_id,
                error = %e,
                "Fallback finalization also failed; presentation may be stuck"
            );
        }
    }
}

fn publish_refund(ctx: &PipelineContext, presentation_id: DbId, user_id: DbId, amount: i32) {
    ctx.events.publish(
        DeckEvent::new(CREDITS_REFUNDED)
            .for_presentation(presentation_id)
            .for_user(user_id)
            .with_payload(serde_json::json!({ "amount": amount })),
    );
}
