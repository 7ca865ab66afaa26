//! Pure domain logic for the deckgen generation pipeline.
//!
//! This crate has zero internal dependencies so it can be used by the
//! persistence layer, the pipeline, and any future CLI tooling alike.
//! Everything here is side-effect free: status transitions, credit math,
//! prompt construction, retry policy, and batch-verdict evaluation.

pub mod content;
pub mod credits;
pub mod error;
pub mod finalize;
pub mod prompt;
pub mod retry;
pub mod status;
pub mod types;
