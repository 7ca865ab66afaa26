//! Slide text generation via chat completions.
//!
//! The model is asked for a strict JSON list of slide objects. Providers
//! wrap answers in code fences or add prose around the payload often
//! enough that extraction is deliberately forgiving: strip fences, take
//! the outermost `[...]`, then validate and normalize each slide.

use serde::{Deserialize, Serialize};

use deckgen_core::content::SlideContent;

use crate::client::{OpenAiClient, TEXT_MODEL};
use crate::error::OpenAiError;

/// Sampling temperature for text generation. Kept low for count adherence.
const TEXT_TEMPERATURE: f64 = 0.6;

/// Requested shape of slide body content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    /// 5-6 short bullet points per slide.
    Bullet,
    /// One 60-90 word paragraph per slide.
    Paragraph,
}

impl TextStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStyle::Bullet => "bullet",
            TextStyle::Paragraph => "paragraph",
        }
    }

    /// Parse a user-supplied style name, defaulting to bullets.
    pub fn from_str(s: &str) -> Self {
        match s {
            "paragraph" => TextStyle::Paragraph,
            _ => TextStyle::Bullet,
        }
    }
}

/// One generated slide: title plus typed body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideDraft {
    /// 1-based position.
    pub slide_number: u32,
    pub title: String,
    pub content: SlideContent,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

impl OpenAiClient {
    /// Generate structured slide text for a presentation.
    ///
    /// The first slide carries only the title and presenter name; slides
    /// 2+ carry body content in the requested style. The model may return
    /// a different count than requested; the result is truncated to
    /// `desired_count` and the mismatch logged, but reconciliation beyond
    /// that is the caller's concern.
    pub async fn generate_slide_text(
        &self,
        topic: &str,
        style: TextStyle,
        desired_count: usize,
        presenter_name: Option<&str>,
    ) -> Result<Vec<SlideDraft>, OpenAiError> {
        let system_prompt = build_system_prompt(topic, style, desired_count, presenter_name);
        let user_prompt = format!(
            "Generate the JSON slide structure for the presentation on '{topic}' following \
             all rules, ensuring EXACTLY {desired_count} slide(s) are generated."
        );

        tracing::info!(
            topic,
            style = style.as_str(),
            desired_count,
            "Requesting slide text content"
        );

        let request = ChatRequest {
            model: TEXT_MODEL,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: TEXT_TEMPERATURE,
        };

        let response = self
            .post("/chat/completions")
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| OpenAiError::InvalidResponse(format!("Malformed chat response: {e}")))?;

        let content = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                OpenAiError::InvalidResponse("AI returned an empty text response".into())
            })?;

        let json = extract_json_array(content)?;
        let raw: Vec<serde_json::Value> = serde_json::from_str(&json)
            .map_err(|e| OpenAiError::InvalidResponse(format!("Response was not valid JSON: {e}")))?;

        let slides = normalize_slides(raw, style, desired_count, topic, presenter_name);
        if slides.is_empty() {
            return Err(OpenAiError::InvalidResponse(
                "No valid slide data could be extracted from the AI response".into(),
            ));
        }
        if slides.len() != desired_count {
            tracing::warn!(
                desired_count,
                actual = slides.len(),
                "AI slide count mismatch"
            );
        }
        Ok(slides)
    }
}

/// System prompt demanding an exact-count JSON slide list.
fn build_system_prompt(
    topic: &str,
    style: TextStyle,
    desired_count: usize,
    presenter_name: Option<&str>,
) -> String {
    let style_instruction = match style {
        TextStyle::Bullet => {
            "a JSON list of short, informative bullet points \
             (5-6 concise bullets, max 15-20 words each)"
        }
        TextStyle::Paragraph => {
            "a single, coherent string paragraph (one clear paragraph, approx. 60-90 words)"
        }
    };
    let first_slide_content = first_slide_content(style, presenter_name).to_storage();

    format!(
        "You are an expert presentation creator AI, tasked with generating accurate, \
         engaging, and well-structured slide content for a presentation about \"{topic}\".\n\
         Generate content for EXACTLY {desired_count} slide(s) in total. This is a strict \
         requirement.\n\
         Return the content as a single JSON list where each object represents a slide.\n\n\
         Slide Structure Rules:\n\
         1. First Slide (Slide 1): MUST have \"slide_number\": 1, a \"slide_title\" (e.g., \
         the presentation topic), and \"slide_content\": {first_slide_content:?} (this exact \
         value, representing the presenter name or empty).\n\
         2. Subsequent Slides (slide 2 onwards, ONLY IF {desired_count} > 1): MUST have an \
         incrementing \"slide_number\", a relevant \"slide_title\", and \"slide_content\" \
         formatted as {style_instruction}.\n\n\
         General Rules:\n\
         - CRITICAL: Generate EXACTLY {desired_count} slide object(s) in the final JSON \
         list. Do NOT add extra slides unless the total count allows for it.\n\
         - For slides 2+, generate informative and coherent content that logically \
         progresses. Ensure content directly supports the title.\n\
         - Prioritize factual accuracy for slides 2+. If unsure, state briefly it's \
         speculative or omit.\n\
         - Output ONLY the JSON list. Start with '[' end with ']'. Escape strings \
         properly. No introductory text, explanations, or ```json markers."
    )
}

/// The enforced content of slide 1: empty bullets, or a "By: name" line
/// for paragraph decks when a presenter name was given.
pub fn first_slide_content(style: TextStyle, presenter_name: Option<&str>) -> SlideContent {
    match style {
        TextStyle::Bullet => SlideContent::Bullets(Vec::new()),
        TextStyle::Paragraph => {
            let byline = presenter_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| format!("By: {name}"))
                .unwrap_or_default();
            SlideContent::Paragraph(byline)
        }
    }
}

/// Extract the outermost JSON array from a model response, tolerating
/// code fences and surrounding prose.
pub fn extract_json_array(response: &str) -> Result<String, OpenAiError> {
    let mut text = response.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }
    let text = text.trim();

    let start = text.find('[');
    let end = text.rfind(']');
    match (start, end) {
        (Some(start), Some(end)) if end > start => Ok(text[start..=end].to_string()),
        _ => Err(OpenAiError::InvalidResponse(
            "AI response did not contain a valid JSON list structure ('[...]')".into(),
        )),
    }
}

/// Validate and normalize raw slide objects.
///
/// Skips entries without a usable title, renumbers by position in the
/// validated list, truncates to `desired_count`, enforces the first-slide
/// content rule, and coerces body content into the requested style.
pub fn normalize_slides(
    raw: Vec<serde_json::Value>,
    style: TextStyle,
    desired_count: usize,
    topic: &str,
    presenter_name: Option<&str>,
) -> Vec<SlideDraft> {
    let mut validated: Vec<SlideDraft> = Vec::new();

    for entry in raw {
        if validated.len() >= desired_count {
            break;
        }
        let Some(object) = entry.as_object() else {
            tracing::warn!("Slide entry is not an object; skipping");
            continue;
        };

        // Tolerate arbitrary key casing from the model.
        let field = |name: &str| {
            object
                .iter()
                .find(|(key, _)| key.to_lowercase() == name)
                .map(|(_, value)| value)
        };

        let Some(title) = field("slide_title").and_then(|v| v.as_str()) else {
            tracing::warn!("Slide entry missing 'slide_title'; skipping");
            continue;
        };

        let slide_number = validated.len() as u32 + 1;
        let (title, content) = if slide_number == 1 {
            let title = if title.is_empty() {
                format!("Presentation on: {topic}")
            } else {
                title.to_string()
            };
            (title, first_slide_content(style, presenter_name))
        } else {
            let content = coerce_content(field("slide_content"), style);
            (title.to_string(), content)
        };

        validated.push(SlideDraft {
            slide_number,
            title,
            content,
        });
    }

    validated
}

/// Coerce a raw `slide_content` value into the requested style.
fn coerce_content(value: Option<&serde_json::Value>, style: TextStyle) -> SlideContent {
    match style {
        TextStyle::Bullet => {
            let bullets = match value {
                Some(serde_json::Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
                Some(serde_json::Value::String(text)) => text
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect(),
                _ => Vec::new(),
            };
            SlideContent::Bullets(bullets)
        }
        TextStyle::Paragraph => {
            let paragraph = match value {
                Some(serde_json::Value::String(text)) => text.clone(),
                Some(serde_json::Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                _ => String::new(),
            };
            SlideContent::Paragraph(paragraph)
        }
    }
}
