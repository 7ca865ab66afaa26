//! Slide body content as an explicit tagged variant.
//!
//! The stored `text_content` column holds either a JSON array of strings
//! (bullet slides) or a raw paragraph string. The variant is decided once
//! when a slide is created and carried explicitly through prompt
//! construction, so nothing downstream ever re-inspects the shape.

use serde::{Deserialize, Serialize};

/// Body content of a single slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideContent {
    /// An ordered sequence of short bullet strings.
    Bullets(Vec<String>),
    /// A single paragraph.
    Paragraph(String),
}

impl SlideContent {
    /// Parse the stored `text_content` column value.
    ///
    /// A value that parses as a JSON array of strings is a bullet slide;
    /// anything else (including malformed JSON) is kept as a raw paragraph,
    /// matching how legacy rows were written.
    pub fn from_storage(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('[') {
            if let Ok(bullets) = serde_json::from_str::<Vec<String>>(raw) {
                return SlideContent::Bullets(bullets);
            }
        }
        SlideContent::Paragraph(raw.to_string())
    }

    /// Serialize for the `text_content` column.
    ///
    /// Bullets are stored as a JSON array string; paragraphs are stored raw.
    pub fn to_storage(&self) -> String {
        match self {
            SlideContent::Bullets(bullets) => {
                serde_json::to_string(bullets).unwrap_or_else(|_| "[]".to_string())
            }
            SlideContent::Paragraph(text) => text.clone(),
        }
    }

    /// Whether there is any visible body text.
    pub fn is_empty(&self) -> bool {
        match self {
            SlideContent::Bullets(bullets) => {
                bullets.iter().all(|b| b.trim().is_empty())
            }
            SlideContent::Paragraph(text) => text.trim().is_empty(),
        }
    }

    /// Render the body text block that goes into the image prompt:
    /// bullets become `- item` lines, paragraphs pass through unchanged.
    pub fn body_text(&self) -> String {
        match self {
            SlideContent::Bullets(bullets) => bullets
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n"),
            SlideContent::Paragraph(text) => text.clone(),
        }
    }

    /// A short hint describing the first piece of content, used to steer
    /// the generated visual. `limit` caps paragraph excerpts.
    pub fn visual_hint(&self, limit: usize) -> Option<String> {
        match self {
            SlideContent::Bullets(bullets) => bullets.first().cloned(),
            SlideContent::Paragraph(text) => {
                if text.trim().is_empty() {
                    None
                } else {
                    Some(format!("{}...", text.chars().take(limit).collect::<String>()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_array_parses_as_bullets() {
        let content = SlideContent::from_storage(r#"["one", "two"]"#);
        assert_eq!(
            content,
            SlideContent::Bullets(vec!["one".to_string(), "two".to_string()])
        );
    }

    #[test]
    fn plain_text_parses_as_paragraph() {
        let content = SlideContent::from_storage("Padel is a blend of tennis and squash.");
        assert!(matches!(content, SlideContent::Paragraph(_)));
    }

    #[test]
    fn malformed_json_array_falls_back_to_paragraph() {
        let content = SlideContent::from_storage("[not actually json");
        assert_eq!(
            content,
            SlideContent::Paragraph("[not actually json".to_string())
        );
    }

    #[test]
    fn storage_round_trip_preserves_variant() {
        let bullets = SlideContent::Bullets(vec!["a".into(), "b".into()]);
        assert_eq!(SlideContent::from_storage(&bullets.to_storage()), bullets);

        let para = SlideContent::Paragraph("just text".into());
        assert_eq!(SlideContent::from_storage(&para.to_storage()), para);
    }

    #[test]
    fn body_text_formats_bullets_as_dash_lines() {
        let bullets = SlideContent::Bullets(vec!["first".into(), "second".into()]);
        assert_eq!(bullets.body_text(), "- first\n- second");
    }

    #[test]
    fn emptiness_ignores_whitespace() {
        assert!(SlideContent::Paragraph("   ".into()).is_empty());
        assert!(SlideContent::Bullets(vec![" ".into()]).is_empty());
        assert!(!SlideContent::Bullets(vec!["x".into()]).is_empty());
    }

    #[test]
    fn visual_hint_prefers_first_bullet() {
        let bullets = SlideContent::Bullets(vec!["headline".into(), "rest".into()]);
        assert_eq!(bullets.visual_hint(80), Some("headline".to_string()));
    }

    #[test]
    fn visual_hint_truncates_paragraphs() {
        let para = SlideContent::Paragraph("abcdefghij".into());
        assert_eq!(para.visual_hint(4), Some("abcd...".to_string()));
    }
}
