//! Slide visual generation via the images endpoint.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::client::{OpenAiClient, IMAGE_MODEL};
use crate::error::OpenAiError;

/// Landscape slide dimensions supported by gpt-image-1.
const IMAGE_SIZE: &str = "1536x1024";

/// A decoded slide image.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    /// Raw PNG bytes.
    pub bytes: Vec<u8>,
    /// Prompt rewrite the provider applied, when reported.
    pub revised_prompt: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}

impl OpenAiClient {
    /// Generate a single slide visual from a fully-built prompt.
    pub async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, OpenAiError> {
        tracing::debug!(prompt_len = prompt.len(), "Requesting slide image");

        let request = ImageRequest {
            model: IMAGE_MODEL,
            prompt,
            n: 1,
            size: IMAGE_SIZE,
            quality: "high",
        };

        let response = self
            .post("/images/generations")
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body: ImageResponse = response.json().await.map_err(|e| {
            OpenAiError::InvalidResponse(format!("Malformed image response: {e}"))
        })?;

        let datum = body.data.into_iter().next().ok_or_else(|| {
            OpenAiError::InvalidResponse("Image response contained no data entries".into())
        })?;
        let encoded = datum.b64_json.ok_or_else(|| {
            OpenAiError::InvalidResponse("Image response missing b64_json payload".into())
        })?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| OpenAiError::InvalidResponse(format!("Invalid base64 image data: {e}")))?;

        Ok(GeneratedImage {
            bytes,
            revised_prompt: datum.revised_prompt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_request_serializes_expected_shape() {
        let request = ImageRequest {
            model: IMAGE_MODEL,
            prompt: "a title slide",
            n: 1,
            size: IMAGE_SIZE,
            quality: "high",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-image-1");
        assert_eq!(json["size"], "1536x1024");
        assert_eq!(json["n"], 1);
    }

    #[test]
    fn image_response_decodes_b64_payload() {
        let body: ImageResponse = serde_json::from_str(
            r#"{"data": [{"b64_json": "aGVsbG8=", "revised_prompt": "a nicer title slide"}]}"#,
        )
        .unwrap();
        let datum = body.data.into_iter().next().unwrap();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(datum.b64_json.unwrap())
            .unwrap();
        assert_eq!(bytes, b"hello");
        assert_eq!(datum.revised_prompt.as_deref(), Some("a nicer title slide"));
    }
}
