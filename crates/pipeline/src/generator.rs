//! Image generator seam.
//!
//! Jobs call the generator through this trait so tests can substitute
//! deterministic stubs for the OpenAI client.

use async_trait::async_trait;

use deckgen_core::retry::FailureKind;
use deckgen_openai::{GeneratedImage, OpenAiClient};

/// A generation attempt failure, pre-classified for the retry policy.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationFailure {
    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }
}

/// Produces one slide visual from a fully-built prompt.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerationFailure>;
}

#[async_trait]
impl ImageGenerator for OpenAiClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage, GenerationFailure> {
        self.generate_image(prompt).await.map_err(|e| GenerationFailure {
            kind: e.failure_kind(),
            message: e.to_string(),
        })
    }
}
