use std::sync::Arc;

use deckgen_openai::OpenAiClient;
use deckgen_pipeline::PipelineContext;

use crate::config::ServerConfig;

/// Shared application state available to all axum handlers.
///
/// Cheaply cloneable: inner data is behind `Arc` or is already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: deckgen_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Generation pipeline handle (generator, blob store, batch registry).
    pub pipeline: PipelineContext,
    /// OpenAI client for slide text generation.
    pub openai: OpenAiClient,
}
