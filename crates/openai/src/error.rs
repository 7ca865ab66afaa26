//! Classified OpenAI errors.

use deckgen_core::retry::FailureKind;

/// Errors from the OpenAI API, pre-classified for the retry policy.
#[derive(Debug, thiserror::Error)]
pub enum OpenAiError {
    /// HTTP 429 from the provider.
    #[error("OpenAI rate limit exceeded")]
    RateLimited,

    /// Failed to reach the provider (DNS, connect, timeout).
    #[error("Failed to connect to OpenAI API: {0}")]
    Connection(String),

    /// Non-success status other than 429.
    #[error("OpenAI API returned an error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The provider answered but the payload was unusable.
    #[error("Invalid OpenAI response: {0}")]
    InvalidResponse(String),
}

impl OpenAiError {
    /// Map to the executor's failure classification.
    ///
    /// Rate limits back off exponentially; connection and API errors are
    /// plain transients; an unusable payload is permanent (re-sending the
    /// same request is unlikely to fix a malformed answer contract).
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            OpenAiError::RateLimited => FailureKind::RateLimited,
            OpenAiError::Connection(_) | OpenAiError::Api { .. } => FailureKind::Transient,
            OpenAiError::InvalidResponse(_) => FailureKind::Permanent,
        }
    }
}

impl From<reqwest::Error> for OpenAiError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                return OpenAiError::RateLimited;
            }
            return OpenAiError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }
        OpenAiError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_maps_to_rate_limited_kind() {
        assert_eq!(OpenAiError::RateLimited.failure_kind(), FailureKind::RateLimited);
    }

    #[test]
    fn connection_and_api_errors_are_transient() {
        assert_eq!(
            OpenAiError::Connection("timed out".into()).failure_kind(),
            FailureKind::Transient
        );
        assert_eq!(
            OpenAiError::Api {
                status: 500,
                message: "server error".into()
            }
            .failure_kind(),
            FailureKind::Transient
        );
    }

    #[test]
    fn invalid_response_is_permanent() {
        assert_eq!(
            OpenAiError::InvalidResponse("no b64 payload".into()).failure_kind(),
            FailureKind::Permanent
        );
    }
}
