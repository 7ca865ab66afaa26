//! Route table.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Routes mounted under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/presentations/generate",
            post(handlers::presentations::generate_presentation),
        )
        .route(
            "/presentations/{id}",
            get(handlers::presentations::get_presentation),
        )
        .route(
            "/presentations/{id}/progress",
            get(handlers::presentations::get_progress),
        )
        .route(
            "/presentations/{id}/cancel",
            post(handlers::presentations::cancel_presentation),
        )
        .route("/slides/{id}/regenerate", post(handlers::slides::regenerate))
        .route("/users/me", get(handlers::users::me))
        .route("/billing/credits", post(handlers::billing::grant_credits))
}

/// Root-level routes (health, file serving).
pub fn root_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/files/{*key}", get(handlers::files::get_file))
}
