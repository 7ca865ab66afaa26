//! DB-backed tests for the generate endpoint's credit guard: an
//! unaffordable request is rejected before any row is created or any
//! generator call is made.

use std::sync::Arc;

use axum::extract::{Json, State};
use sqlx::PgPool;
use uuid::Uuid;

use deckgen_api::auth::jwt::JwtConfig;
use deckgen_api::auth::AuthUser;
use deckgen_api::config::ServerConfig;
use deckgen_api::error::AppError;
use deckgen_api::handlers::presentations::{generate_presentation, GeneratePresentation};
use deckgen_api::state::AppState;
use deckgen_core::error::CoreError;
use deckgen_core::types::DbId;
use deckgen_events::EventBus;
use deckgen_openai::OpenAiClient;
use deckgen_pipeline::PipelineContext;
use deckgen_storage::LocalBlobStore;

/// Build an `AppState` whose OpenAI client points at an unroutable
/// address, so any attempted generation call fails loudly instead of
/// hitting the network.
fn test_state(pool: PgPool, dir: &tempfile::TempDir) -> AppState {
    let openai =
        OpenAiClient::with_base_url("test-key", "http://127.0.0.1:9").expect("client should build");
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        openai_api_key: "test-key".to_string(),
        storage_root: dir.path().display().to_string(),
        billing_webhook_secret: "test-webhook-secret".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    };
    let pipeline = PipelineContext::new(
        pool.clone(),
        Arc::new(openai.clone()),
        Arc::new(LocalBlobStore::new(dir.path())),
        Arc::new(EventBus::default()),
    );
    AppState {
        pool,
        config: Arc::new(config),
        pipeline,
        openai,
    }
}

async fn seed_user(pool: &PgPool, credits: i32) -> DbId {
    let (id,): (DbId,) = sqlx::query_as(
        "INSERT INTO users (email, name, credits_remaining) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(format!("{}@example.com", Uuid::new_v4()))
    .bind("Guard Tester")
    .bind(credits)
    .fetch_one(pool)
    .await
    .expect("user should be created");
    id
}

fn generate_input(slide_count: usize) -> GeneratePresentation {
    GeneratePresentation {
        topic: "Offshore wind logistics".to_string(),
        slide_count,
        text_style: None,
        presenter_name: None,
        style: None,
        font_choice: None,
        creativity_score: None,
    }
}

async fn presentation_count(pool: &PgPool) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM presentations")
        .fetch_one(pool)
        .await
        .expect("count query should run");
    count
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unaffordable_request_is_rejected_before_any_work(pool: PgPool) {
    let user_id = seed_user(&pool, 10).await;
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let state = test_state(pool.clone(), &dir);

    // 4 slides cost 100; the balance holds 10. The guard must fire before
    // the presentation row and before the text generation call.
    let result = generate_presentation(
        AuthUser { user_id },
        State(state),
        Json(generate_input(4)),
    )
    .await;

    match result.err().expect("request should be rejected") {
        AppError::Core(CoreError::InsufficientCredits { needed, available }) => {
            assert_eq!(needed, 100);
            assert_eq!(available, 10);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(presentation_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_user_is_rejected_before_any_work(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let state = test_state(pool.clone(), &dir);

    let result = generate_presentation(
        AuthUser { user_id: 999 },
        State(state),
        Json(generate_input(2)),
    )
    .await;

    match result.err().expect("request should be rejected") {
        AppError::Core(CoreError::NotFound { entity, id }) => {
            assert_eq!(entity, "user");
            assert_eq!(id, 999);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(presentation_count(&pool).await, 0);
}
