//! DB-backed tests for batch credit settlement: the debit at submission,
//! idempotent jobs, the refund guards, and cancellation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use deckgen_core::content::SlideContent;
use deckgen_core::credits::{batch_cost, CREDITS_PER_SLIDE};
use deckgen_core::error::CoreError;
use deckgen_core::status::PresentationStatus;
use deckgen_core::types::DbId;
use deckgen_db::models::presentation::CreatePresentation;
use deckgen_db::models::slide::{CreateSlide, SlideImage};
use deckgen_db::repositories::{PresentationRepo, SlideRepo, UserRepo};
use deckgen_events::EventBus;
use deckgen_openai::GeneratedImage;
use deckgen_pipeline::{
    cancel_batch, finalizer, submit_visuals, CancelOutcome, GenerationFailure, ImageGenerator,
    PipelineContext, PipelineError, VisualGenerationJob,
};
use deckgen_storage::LocalBlobStore;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Generator stub that always succeeds and counts its invocations.
#[derive(Default)]
struct CountingGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl ImageGenerator for CountingGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, GenerationFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GeneratedImage {
            bytes: b"png-bytes".to_vec(),
            revised_prompt: None,
        })
    }
}

fn pipeline_context(
    pool: PgPool,
    generator: Arc<dyn ImageGenerator>,
) -> (PipelineContext, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let blobs = Arc::new(LocalBlobStore::new(dir.path()));
    let ctx = PipelineContext::new(pool, generator, blobs, Arc::new(EventBus::default()));
    (ctx, dir)
}

async fn seed_user(pool: &PgPool, credits: i32) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO users (email, name, credits_remaining) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("{}@example.com", Uuid::new_v4()))
    .bind("Settlement Tester")
    .bind(credits)
    .fetch_one(pool)
    .await
    .expect("user should be created");
    id
}

async fn seed_presentation(pool: &PgPool, user_id: DbId) -> DbId {
    PresentationRepo::create(
        pool,
        user_id,
        &CreatePresentation {
            title: "Offshore wind logistics".to_string(),
            presenter_name: None,
            style_prompt: None,
            font_choice: None,
            creativity_score: Some(5),
        },
    )
    .await
    .expect("presentation should be created")
    .id
}

fn slide_specs(count: usize) -> Vec<CreateSlide> {
    (1..=count)
        .map(|n| CreateSlide {
            slide_number: n as i32,
            title: format!("Slide {n}"),
            content: SlideContent::Bullets(vec!["One point".to_string()]),
        })
        .collect()
}

/// Put a batch into `pending_visuals` with the debit already taken, the
/// way submission does, without spawning the supervisor.
async fn begin_debited_batch(
    pool: &PgPool,
    presentation_id: DbId,
    user_id: DbId,
    slide_count: usize,
) -> (Vec<DbId>, i32) {
    let slides = SlideRepo::create_many(pool, presentation_id, &slide_specs(slide_count))
        .await
        .expect("slides should be created");
    let cost = batch_cost(slide_count);
    assert!(UserRepo::debit_credits(pool, user_id, cost)
        .await
        .expect("debit should run"));
    PresentationRepo::begin_batch(pool, presentation_id, Uuid::new_v4())
        .await
        .expect("batch should begin");
    (slides.iter().map(|s| s.id).collect(), cost)
}

async fn set_stub_image(pool: &PgPool, slide_id: DbId) {
    SlideRepo::set_image(
        pool,
        slide_id,
        &SlideImage {
            image_key: "7/slide_1_abcd1234.png",
            image_url: "/files/7/slide_1_abcd1234.png",
            image_gen_prompt: "a stub prompt",
            applied_style_info: "stub style",
        },
    )
    .await
    .expect("image should be persisted");
}

async fn balance(pool: &PgPool, user_id: DbId) -> i32 {
    UserRepo::find_by_id(pool, user_id)
        .await
        .expect("user query should run")
        .expect("user should exist")
        .credits_remaining
}

async fn status_of(pool: &PgPool, presentation_id: DbId) -> PresentationStatus {
    PresentationRepo::find_by_id(pool, presentation_id)
        .await
        .expect("presentation query should run")
        .expect("presentation should exist")
        .status()
}

async fn wait_for_terminal(pool: &PgPool, presentation_id: DbId) -> PresentationStatus {
    for _ in 0..200 {
        let status = status_of(pool, presentation_id).await;
        if status.is_terminal() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("batch did not reach a terminal status in time");
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn submission_without_balance_is_rejected_with_nothing_mutated(pool: PgPool) {
    let user_id = seed_user(&pool, 10).await;
    let presentation_id = seed_presentation(&pool, user_id).await;
    let (ctx, _dir) = pipeline_context(pool.clone(), Arc::new(CountingGenerator::default()));

    let err = submit_visuals(&ctx, presentation_id, user_id, slide_specs(2))
        .await
        .unwrap_err();
    match err {
        PipelineError::Core(CoreError::InsufficientCredits { needed, available }) => {
            assert_eq!(needed, 2 * CREDITS_PER_SLIDE);
            assert_eq!(available, 10);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(balance(&pool, user_id).await, 10);
    assert_eq!(
        status_of(&pool, presentation_id).await,
        PresentationStatus::PendingText
    );
    assert_eq!(
        SlideRepo::count_for_presentation(&pool, presentation_id)
            .await
            .unwrap(),
        0
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn submitted_batch_runs_to_completion_and_keeps_the_debit(pool: PgPool) {
    let user_id = seed_user(&pool, 100).await;
    let presentation_id = seed_presentation(&pool, user_id).await;
    let generator = Arc::new(CountingGenerator::default());
    let (ctx, _dir) = pipeline_context(pool.clone(), generator.clone());

    submit_visuals(&ctx, presentation_id, user_id, slide_specs(2))
        .await
        .expect("submission should be accepted");
    assert_eq!(balance(&pool, user_id).await, 50);

    let status = wait_for_terminal(&pool, presentation_id).await;
    assert_eq!(status, PresentationStatus::VisualsComplete);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    // The debit stays; nothing was refunded.
    assert_eq!(balance(&pool, user_id).await, 50);
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn job_short_circuits_when_image_already_generated(pool: PgPool) {
    let user_id = seed_user(&pool, 100).await;
    let presentation_id = seed_presentation(&pool, user_id).await;
    let (slide_ids, _cost) = begin_debited_batch(&pool, presentation_id, user_id, 1).await;
    set_stub_image(&pool, slide_ids[0]).await;

    let generator = Arc::new(CountingGenerator::default());
    let (ctx, _dir) = pipeline_context(pool.clone(), generator.clone());
    let job = VisualGenerationJob {
        slide_id: slide_ids[0],
        presentation_id,
        user_id,
    };

    assert!(job.run(&ctx, &CancellationToken::new()).await);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Finalization
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn failed_batch_refunds_the_debit_exactly_once(pool: PgPool) {
    let user_id = seed_user(&pool, 100).await;
    let presentation_id = seed_presentation(&pool, user_id).await;
    let (_slide_ids, cost) = begin_debited_batch(&pool, presentation_id, user_id, 2).await;
    assert_eq!(balance(&pool, user_id).await, 50);

    let (ctx, _dir) = pipeline_context(pool.clone(), Arc::new(CountingGenerator::default()));
    let outcomes = vec![Some(false), Some(false)];
    finalizer::finalize(&ctx, &outcomes, presentation_id, user_id, cost).await;

    assert_eq!(
        status_of(&pool, presentation_id).await,
        PresentationStatus::GenerationFailed
    );
    assert_eq!(balance(&pool, user_id).await, 100);

    // A redelivered finalize finds the batch token already claimed and
    // must not refund a second time.
    finalizer::finalize(&ctx, &outcomes, presentation_id, user_id, cost).await;
    assert_eq!(balance(&pool, user_id).await, 100);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn successful_batch_completes_without_refund(pool: PgPool) {
    let user_id = seed_user(&pool, 100).await;
    let presentation_id = seed_presentation(&pool, user_id).await;
    let (slide_ids, cost) = begin_debited_batch(&pool, presentation_id, user_id, 2).await;
    for id in &slide_ids {
        set_stub_image(&pool, *id).await;
    }

    let (ctx, _dir) = pipeline_context(pool.clone(), Arc::new(CountingGenerator::default()));
    finalizer::finalize(&ctx, &[Some(true), Some(true)], presentation_id, user_id, cost).await;

    assert_eq!(
        status_of(&pool, presentation_id).await,
        PresentationStatus::VisualsComplete
    );
    assert_eq!(balance(&pool, user_id).await, 50);

    let presentation = PresentationRepo::find_by_id(&pool, presentation_id)
        .await
        .unwrap()
        .expect("presentation should exist");
    assert!(presentation.batch_token.is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn settled_status_is_never_overwritten(pool: PgPool) {
    let user_id = seed_user(&pool, 100).await;
    let presentation_id = seed_presentation(&pool, user_id).await;
    begin_debited_batch(&pool, presentation_id, user_id, 1).await;

    let applied = PresentationRepo::finalize_status(
        &pool,
        presentation_id,
        PresentationStatus::GenerationFailed,
    )
    .await
    .unwrap();
    assert!(applied);

    // A settlement losing the race sees the terminal status and backs off.
    let applied = PresentationRepo::finalize_status(
        &pool,
        presentation_id,
        PresentationStatus::VisualsComplete,
    )
    .await
    .unwrap();
    assert!(!applied);
    assert_eq!(
        status_of(&pool, presentation_id).await,
        PresentationStatus::GenerationFailed
    );
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn cancellation_refunds_recomputed_slide_cost(pool: PgPool) {
    let user_id = seed_user(&pool, 200).await;
    let presentation_id = seed_presentation(&pool, user_id).await;
    let (slide_ids, cost) = begin_debited_batch(&pool, presentation_id, user_id, 3).await;
    assert_eq!(cost, 3 * CREDITS_PER_SLIDE);

    // One job committed before the cancel arrives; its image stays.
    set_stub_image(&pool, slide_ids[0]).await;

    let (ctx, _dir) = pipeline_context(pool.clone(), Arc::new(CountingGenerator::default()));
    let outcome = cancel_batch(&ctx, presentation_id, user_id)
        .await
        .expect("cancellation should run");
    assert_eq!(
        outcome,
        CancelOutcome::Cancelled {
            refunded: 3 * CREDITS_PER_SLIDE
        }
    );

    assert_eq!(
        status_of(&pool, presentation_id).await,
        PresentationStatus::GenerationFailed
    );
    assert_eq!(balance(&pool, user_id).await, 200);
    assert_eq!(
        SlideRepo::count_with_image(&pool, presentation_id)
            .await
            .unwrap(),
        1
    );
}

#[sqlx::test(migrations = "../db/migrations")]
async fn late_finalize_after_cancel_moves_no_further_credit(pool: PgPool) {
    let user_id = seed_user(&pool, 100).await;
    let presentation_id = seed_presentation(&pool, user_id).await;
    let (slide_ids, cost) = begin_debited_batch(&pool, presentation_id, user_id, 2).await;

    let (ctx, _dir) = pipeline_context(pool.clone(), Arc::new(CountingGenerator::default()));
    let cancelled = cancel_batch(&ctx, presentation_id, user_id)
        .await
        .expect("cancellation should run");
    assert_eq!(cancelled, CancelOutcome::Cancelled { refunded: cost });
    assert_eq!(balance(&pool, user_id).await, 100);

    // The batch still reports a success for the job that finished before
    // the revoke. The settled status must stand and no credit may move.
    set_stub_image(&pool, slide_ids[0]).await;
    finalizer::finalize(&ctx, &[Some(true), None], presentation_id, user_id, cost).await;

    assert_eq!(
        status_of(&pool, presentation_id).await,
        PresentationStatus::GenerationFailed
    );
    assert_eq!(balance(&pool, user_id).await, 100);
}
