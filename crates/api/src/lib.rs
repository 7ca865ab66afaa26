//! HTTP surface for the deckgen backend.
//!
//! Thin axum shell over the pipeline: authentication, request parsing,
//! and error-to-JSON mapping live here; all generation and credit
//! semantics live in `deckgen-pipeline` and below.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
pub mod state;
