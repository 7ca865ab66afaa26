//! HTTP client configuration for the OpenAI API.

use std::time::Duration;

use crate::error::OpenAiError;

/// Default API base URL.
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Per-request timeout. The generator call enforces its own deadline; the
/// pipeline adds no separate wall-clock timeout on top.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Chat model used for slide text generation.
pub(crate) const TEXT_MODEL: &str = "gpt-4.1-nano";

/// Image model used for slide visuals.
pub(crate) const IMAGE_MODEL: &str = "gpt-image-1";

/// Typed client for the OpenAI REST API.
#[derive(Clone)]
pub struct OpenAiClient {
    pub(crate) http: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
}

impl OpenAiClient {
    /// Create a client with the default base URL.
    pub fn new(api_key: impl Into<String>) -> Result<Self, OpenAiError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against a custom base URL (proxies, test servers).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, OpenAiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| OpenAiError::Connection(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build a POST request against `path` with the bearer token attached.
    pub(crate) fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
    }
}
