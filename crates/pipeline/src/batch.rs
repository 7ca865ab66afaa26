//! Fan-out/fan-in batch orchestration.
//!
//! `submit_visuals` debits the user, creates the slide rows, and spawns a
//! supervisor task that runs one [`VisualGenerationJob`] per slide,
//! collects every outcome, and hands the full list to the finalizer. The
//! submission call returns as soon as the batch is spawned; all failure
//! reporting happens asynchronously via status polling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deckgen_core::credits;
use deckgen_core::error::CoreError;
use deckgen_core::status::PresentationStatus;
use deckgen_core::types::DbId;
use deckgen_db::models::slide::CreateSlide;
use deckgen_db::repositories::{PresentationRepo, SlideRepo, UserRepo};
use deckgen_events::bus::{DeckEvent, BATCH_SUBMITTED};

use crate::context::PipelineContext;
use crate::error::PipelineError;
use crate::finalizer;
use crate::job::VisualGenerationJob;

// ---------------------------------------------------------------------------
// BatchRegistry
// ---------------------------------------------------------------------------

/// In-process map from batch token to the batch's `CancellationToken`.
///
/// Registered at submission, removed by the supervisor once every job has
/// terminated. Cancellation through the registry is best-effort: a token
/// submitted by another process is simply not found here.
#[derive(Clone, Default)]
pub struct BatchRegistry {
    inner: Arc<Mutex<HashMap<Uuid, CancellationToken>>>,
}

impl BatchRegistry {
    /// Register a new batch and return its cancellation token.
    pub fn register(&self, batch_token: Uuid) -> CancellationToken {
        let cancel = CancellationToken::new();
        self.inner
            .lock()
            .expect("batch registry lock poisoned")
            .insert(batch_token, cancel.clone());
        cancel
    }

    /// Fire the cancellation token for a batch. Returns whether the batch
    /// was known to this process.
    pub fn cancel(&self, batch_token: &Uuid) -> bool {
        let guard = self.inner.lock().expect("batch registry lock poisoned");
        match guard.get(batch_token) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Drop a settled batch from the registry.
    pub fn remove(&self, batch_token: &Uuid) {
        self.inner
            .lock()
            .expect("batch registry lock poisoned")
            .remove(batch_token);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Debit credits, create slide rows, and submit the visual batch.
///
/// The debit happens before any job is spawned; an insufficient balance
/// rejects the whole submission with no state mutated. Returns the batch
/// token now stored on the presentation.
pub async fn submit_visuals(
    ctx: &PipelineContext,
    presentation_id: DbId,
    user_id: DbId,
    slide_specs: Vec<CreateSlide>,
) -> Result<Uuid, PipelineError> {
    if slide_specs.is_empty() {
        return Err(CoreError::Validation(
            "A batch must contain at least one slide".to_string(),
        )
        .into());
    }

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
    if presentation.status().is_terminal() || presentation.batch_token.is_some() {
        return Err(CoreError::Conflict(
            "Presentation already has a generation batch".to_string(),
        )
        .into());
    }

    let cost = credits::batch_cost(slide_specs.len());
    if !UserRepo::debit_credits(&ctx.pool, user_id, cost).await? {
        let available = UserRepo::find_by_id(&ctx.pool, user_id)
            .await?
            .map(|u| u.credits_remaining)
            .unwrap_or(0);
        return Err(CoreError::InsufficientCredits {
            needed: cost,
            available,
        }
        .into());
    }

    let slides = SlideRepo::create_many(&ctx.pool, presentation_id, &slide_specs).await?;
    let slide_ids: Vec<DbId> = slides.iter().map(|s| s.id).collect();

    submit_batch(ctx, presentation_id, user_id, slide_ids, cost).await
}

/// Spawn the batch for already-created slides with an already-debited
/// amount. The amount is captured here and stays fixed for the life of
/// the batch, so the finalizer's refund is exact even if pricing changes
/// mid-flight.
pub async fn submit_batch(
    ctx: &PipelineContext,
    presentation_id: DbId,
    user_id: DbId,
    slide_ids: Vec<DbId>,
    credits_debited: i32,
) -> Result<Uuid, PipelineError> {
    let batch_token = Uuid::new_v4();
    PresentationRepo::begin_batch(&ctx.pool, presentation_id, batch_token).await?;
    let cancel = ctx.batches.register(batch_token);

    tracing::info!(
        presentation_id,
        user_id,
        %batch_token,
        slide_count = slide_ids.len(),
        credits_debited,
        "Submitting visual generation batch"
    );
    ctx.events.publish(
        DeckEvent::new(BATCH_SUBMITTED)
            .for_presentation(presentation_id)
            .for_user(user_id)
            .with_payload(serde_json::json!({
                "batch_token": batch_token,
                "slide_count": slide_ids.len(),
                "credits_debited": credits_debited,
            })),
    );

    let supervisor_ctx = ctx.clone();
    tokio::spawn(async move {
        supervise_batch(
            supervisor_ctx,
            presentation_id,
            user_id,
            slide_ids,
            batch_token,
            cancel,
            credits_debited,
        )
        .await;
    });

    Ok(batch_token)
}

/// Run every job to a terminal outcome, then finalize exactly once.
async fn supervise_batch(
    ctx: PipelineContext,
    presentation_id: DbId,
    user_id: DbId,
    slide_ids: Vec<DbId>,
    batch_token: Uuid,
    cancel: CancellationToken,
    credits_debited: i32,
) {
    let expected = slide_ids.len();
    let mut join_set = JoinSet::new();
    for (index, slide_id) in slide_ids.into_iter().enumerate() {
        let job = VisualGenerationJob {
            slide_id,
            presentation_id,
            user_id,
        };
        let job_ctx = ctx.clone();
        let job_cancel = cancel.clone();
        join_set.spawn(async move { (index, job.run(&job_ctx, &job_cancel).await) });
    }

    let outcomes = collect_outcomes(join_set, expected).await;
    ctx.batches.remove(&batch_token);

    finalizer::finalize(&ctx, &outcomes, presentation_id, user_id, credits_debited).await;
}

/// Drain the join set into an outcome list indexed by spawn order.
///
/// A job that panicked (or was aborted) leaves its slot as `None`, which
/// the finalizer counts as a failure.
pub(crate) async fn collect_outcomes(
    mut join_set: JoinSet<(usize, bool)>,
    expected: usize,
) -> Vec<Option<bool>> {
    let mut outcomes: Vec<Option<bool>> = vec![None; expected];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, success)) => {
                if let Some(slot) = outcomes.get_mut(index) {
                    *slot = Some(success);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Generation job task failed to join");
            }
        }
    }
    outcomes
}
