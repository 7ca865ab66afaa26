//! Explicit dependency handle for pipeline tasks.
//!
//! Every job and the finalizer receive a `PipelineContext` instead of
//! reaching for ambient globals; background tasks clone it when spawned.

use std::sync::Arc;

use sqlx::PgPool;

use deckgen_core::retry::RetryPolicy;
use deckgen_events::EventBus;
use deckgen_storage::BlobStore;

use crate::batch::BatchRegistry;
use crate::generator::ImageGenerator;

/// Shared handle carrying everything a pipeline task needs.
#[derive(Clone)]
pub struct PipelineContext {
    pub pool: PgPool,
    pub generator: Arc<dyn ImageGenerator>,
    pub blobs: Arc<dyn BlobStore>,
    pub events: Arc<EventBus>,
    pub batches: BatchRegistry,
    pub retry_policy: RetryPolicy,
}

impl PipelineContext {
    pub fn new(
        pool: PgPool,
        generator: Arc<dyn ImageGenerator>,
        blobs: Arc<dyn BlobStore>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            pool,
            generator,
            blobs,
            events,
            batches: BatchRegistry::default(),
            retry_policy: RetryPolicy::default(),
        }
    }
}
