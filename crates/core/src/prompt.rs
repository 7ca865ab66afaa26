//! Image prompt construction for a single slide visual.
//!
//! Deterministic given its inputs plus an injected [`Rng`]; the only
//! randomness is the layout pick within a creativity tier. The emitted
//! prompt is a structured natural-language instruction block covering
//! visual content, title, optional body content, style, font/readability
//! rules, layout, safe-zone padding, and color guidance, hard-truncated
//! to [`MAX_PROMPT_LEN`] characters.

use rand::Rng;

use crate::content::SlideContent;

/// Hard ceiling on the prompt sent to the image model.
pub const MAX_PROMPT_LEN: usize = 3950;

/// Title keywords that mark the last slide as a closing slide.
pub const CLOSING_KEYWORDS: &[&str] = &[
    "thank you",
    "q&a",
    "conclusion",
    "summary",
    "next steps",
    "final thoughts",
];

/// Paragraph excerpt length used in the visual hint.
const PARAGRAPH_HINT_LEN: usize = 80;

/// Body text shorter than this is hinted as "short".
const SHORT_BODY_LEN: usize = 150;
/// Body text shorter than this (but not short) is hinted as "medium".
const MEDIUM_BODY_LEN: usize = 300;

/// Shared description of where body text may be placed.
const TEXT_AREA: &str = "a clearly defined area with high contrast against its background \
     (e.g., a solid panel, shape, or clean zone of the visual)";

// ---------------------------------------------------------------------------
// Slide classification
// ---------------------------------------------------------------------------

/// How a slide is treated by prompt construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideKind {
    /// The first slide: title plus optional presenter name, no body.
    Title,
    /// The last slide, when its title matches a closing keyword.
    Closing,
    /// Everything else.
    Content,
}

/// Classify a slide from its position and title.
pub fn classify_slide(slide_number: u32, total_slides: u32, title: &str) -> SlideKind {
    if slide_number == 1 {
        return SlideKind::Title;
    }
    let title_lower = title.to_lowercase();
    let is_likely_closing = CLOSING_KEYWORDS.iter().any(|kw| title_lower.contains(kw));
    if slide_number == total_slides && is_likely_closing {
        SlideKind::Closing
    } else {
        SlideKind::Content
    }
}

// ---------------------------------------------------------------------------
// Creativity tiers
// ---------------------------------------------------------------------------

/// Layout/style tier derived from the user's 1-10 creativity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreativityTier {
    Low,
    Medium,
    High,
}

impl CreativityTier {
    /// Map a 1-10 creativity score to a tier. Out-of-range scores clamp
    /// to the nearest tier.
    pub fn from_score(score: i32) -> Self {
        match score {
            i32::MIN..=3 => CreativityTier::Low,
            4..=7 => CreativityTier::Medium,
            _ => CreativityTier::High,
        }
    }

    /// Style adjective suffix appended to the style description.
    pub fn style_suffix(&self) -> &'static str {
        match self {
            CreativityTier::Low => " Standard, clear, conventional slide design.",
            CreativityTier::Medium => " Professional, well-composed visual. Balanced design.",
            CreativityTier::High => {
                " Highly creative, artistic interpretation. Apple Keynote aesthetic, \
                 cinematic lighting, dynamic composition, unique visual metaphors. \
                 High-end design."
            }
        }
    }
}

/// Candidate layout descriptions for content slides at a given tier.
///
/// The pools are strictly nested: low ⊂ medium ⊂ high.
pub fn layout_candidates(tier: CreativityTier) -> Vec<String> {
    let mut pool = vec![
        format!(
            "Standard: Visual Left 60-70%, title Top-Right, body text Right 30-40% within {TEXT_AREA}."
        ),
        format!(
            "Standard Reversed: Visual Right 60-70%, title Top-Left, body text Left 30-40% within {TEXT_AREA}."
        ),
    ];
    if tier == CreativityTier::Low {
        return pool;
    }

    pool.extend([
        format!(
            "Top Visual: Visual as Background or Top 60-70%, title Top, body text Bottom 30-40% within {TEXT_AREA}."
        ),
        format!(
            "Centered Text: Visual as Background, title Top-Center, body text Centered within {TEXT_AREA}."
        ),
        format!("Split Vertical: Visual fills top half, text fills bottom half within {TEXT_AREA}."),
    ]);
    if tier == CreativityTier::Medium {
        return pool;
    }

    pool.extend([
        format!(
            "Dynamic Integrated: Arrange visual, title, and body text creatively \
             (e.g., text integrated near relevant visual parts, overlapping clean areas). \
             Ensure balance, hierarchy, place text within {TEXT_AREA}."
        ),
        format!(
            "Creative Split Screen: Visual on one side (vertical or horizontal split), \
             text artfully arranged on the other within {TEXT_AREA}. Avoid simple 50/50."
        ),
        format!(
            "Full Background Visual: Compelling full-bleed background image, title/text \
             strategically placed in areas of lower visual complexity within {TEXT_AREA}. \
             Use overlays if needed for contrast."
        ),
        format!(
            "Minimalist Focus: Strong central visual, text placed minimally but impactfully \
             (e.g., corner, edge) within {TEXT_AREA}."
        ),
        format!(
            "Asymmetric Balance: Visual dominates one area (e.g., top-left), text balances \
             in another (e.g., bottom-right) within {TEXT_AREA}."
        ),
    ]);
    pool
}

// ---------------------------------------------------------------------------
// Prompt inputs
// ---------------------------------------------------------------------------

/// Everything needed to build one slide's image prompt.
#[derive(Debug, Clone)]
pub struct PromptInputs<'a> {
    pub slide_title: &'a str,
    pub content: &'a SlideContent,
    /// Resolved style description (predefined catalog entry or custom prompt).
    pub style_description: &'a str,
    /// 1-based position within the presentation.
    pub slide_number: u32,
    pub total_slides: u32,
    /// User's 1-10 creativity score.
    pub creativity_score: i32,
    pub presentation_topic: Option<&'a str>,
    pub font_choice: &'a str,
    pub presenter_name: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Prompt assembly
// ---------------------------------------------------------------------------

/// Build the full image prompt for one slide.
///
/// `rng` is only consulted for the layout pick on content slides; title and
/// closing slides use fixed layouts.
pub fn build_image_prompt(inputs: &PromptInputs<'_>, rng: &mut impl Rng) -> String {
    let kind = classify_slide(inputs.slide_number, inputs.total_slides, inputs.slide_title);
    let tier = CreativityTier::from_score(inputs.creativity_score);
    let presenter = inputs
        .presenter_name
        .map(str::trim)
        .filter(|name| !name.is_empty());

    // Per-kind visual hint, body block, and content shape description.
    let (content_type_description, body_content_text, visual_content_hint) = match kind {
        SlideKind::Title => {
            let hint = inputs
                .presentation_topic
                .filter(|t| !t.is_empty())
                .unwrap_or(if inputs.slide_title.is_empty() {
                    "main theme"
                } else {
                    inputs.slide_title
                })
                .to_string();
            let body = presenter
                .map(|name| format!("By: {name}"))
                .unwrap_or_default();
            ("Title Slide".to_string(), body, hint)
        }
        SlideKind::Closing => {
            let body = if inputs.content.is_empty() {
                String::new()
            } else {
                inputs.content.body_text()
            };
            (
                "Closing Content".to_string(),
                body,
                "simple, clean, abstract graphic or background".to_string(),
            )
        }
        SlideKind::Content => {
            if inputs.content.is_empty() {
                let shape = match inputs.content {
                    SlideContent::Bullets(_) => "bullet points",
                    SlideContent::Paragraph(_) => "a paragraph",
                };
                (
                    format!("content area (layout suitable for {shape})"),
                    String::new(),
                    format!(
                        "visual representing '{}' (no body text provided)",
                        inputs.slide_title
                    ),
                )
            } else {
                let mut hint = format!("core concept of '{}'", inputs.slide_title);
                if let Some(extra) = inputs.content.visual_hint(PARAGRAPH_HINT_LEN) {
                    hint.push_str(&format!(" - {extra}"));
                }
                let shape = match inputs.content {
                    SlideContent::Bullets(_) => "bullet points",
                    SlideContent::Paragraph(_) => "paragraph",
                };
                (shape.to_string(), inputs.content.body_text(), hint)
            }
        }
    };
    let has_body_content = !body_content_text.is_empty();

    let layout_description =
        layout_for(kind, tier, inputs.slide_number, has_body_content, presenter, rng);

    let augmented_style = format!("{}{}", inputs.style_description, tier.style_suffix());

    // Numbered instruction block. Items 1-2 are unconditional; item 3
    // depends on body presence; items 4-9 follow.
    let mut prompt = format!(
        "Create a complete presentation slide visual including all specified text elements, \
         designed for a 3:2 aspect ratio (1536x1024 pixels).\n\n\
         **Instructions:**\n\
         1. **Visual:** Generate visual: '{visual_content_hint}'.\n\
         2. **Title:** Include title: \"{}\".\n",
        inputs.slide_title
    );

    if has_body_content {
        if kind == SlideKind::Title {
            prompt.push_str(&format!(
                "3. **Presenter Name:** Include the exact text: \"{body_content_text}\". \
                 Use a smaller, secondary font size.\n"
            ));
        } else {
            let text_length_hint = if body_content_text.len() < SHORT_BODY_LEN {
                "short"
            } else if body_content_text.len() < MEDIUM_BODY_LEN {
                "medium"
            } else {
                "long"
            };
            prompt.push_str(&format!(
                "3. **Body Content:** Include {content_type_description} ({text_length_hint} length):\n\
                 ```\n{body_content_text}\n```\n"
            ));
        }
    } else {
        prompt.push_str(
            "3. **Body Content:** None required for this slide. Design the layout \
             considering only the title and visual.\n",
        );
    }

    prompt.push_str(&format!(
        "4. **Overall Style:** Adhere strictly to: '{augmented_style}'.\n"
    ));
    prompt.push_str(&format!(
        "5. **Font & Text Size:** Use font '{}' consistently. Ensure EXCELLENT readability. \
         CRITICAL: Adjust text size appropriately (e.g., larger title, smaller body/name) so \
         ALL content fits comfortably well within its designated area based on the layout \
         ({layout_description}). AVOID text overflow, cutoff, or text being excessively large \
         or small for its area. Add reasonable padding around text blocks - text MUST NOT \
         touch the edges of its container or the slide borders.\n",
        inputs.font_choice
    ));

    let style_lower = inputs.style_description.to_lowercase();
    if style_lower.contains("pencil sketch style") || style_lower.contains("pencil & paper") {
        prompt.push_str(
            "   * SPECIAL INSTRUCTION FOR PENCIL STYLE: Make the text (title, body content) \
             appear as if written neatly with a pencil or a simple handwriting font. It should \
             look hand-drawn but legible.\n",
        );
    }

    prompt.push_str(&format!(
        "6. **Layout & Readability:** Arrange elements harmoniously: '{layout_description}'. \
         CRITICAL: Place ALL text (title, body, name) fully inside dedicated areas with HIGH \
         CONTRAST against the background.\n"
    ));
    prompt.push_str(
        "7. **Safe Zone & Padding:** ABSOLUTELY CRITICAL - Ensure ALL text and vital parts of \
         the visual are placed well within the central 90-95% of the 3:2 image canvas. DO NOT \
         place text or essential visual elements touching or extremely close to the absolute \
         edges (top, bottom, left, right). Leave generous padding around text and away from \
         borders.\n",
    );
    prompt.push_str("8. **Colors:** Use colors consistent with style description.\n");
    if inputs.slide_number > 1 {
        prompt.push_str(
            "9. **Variety:** Use a different visual composition/layout than the previous \
             slide, if appropriate for the content and creativity level.\n",
        );
    }

    truncate_prompt(prompt.trim().to_string())
}

/// Select the layout description for a slide.
fn layout_for(
    kind: SlideKind,
    tier: CreativityTier,
    slide_number: u32,
    has_body_content: bool,
    presenter: Option<&str>,
    rng: &mut impl Rng,
) -> String {
    match kind {
        SlideKind::Title => {
            let mut layout = "Place visual 'Main focus or background, visually appealing', \
                              title at 'Prominently Top or Center'."
                .to_string();
            if presenter.is_some() {
                layout.push_str(" Place presenter name 'Subtly below title, smaller font'.");
            }
            layout
        }
        SlideKind::Closing => format!(
            "Place visual 'Subtle background or abstract element, minimalist', title at \
             'Top or Center', body text (if any) in 'Center or Bottom' within {TEXT_AREA}."
        ),
        SlideKind::Content => {
            let pool = layout_candidates(tier);
            let mut layout = pool[rng.random_range(0..pool.len())].clone();
            if slide_number > 2 {
                layout.push_str(" Try a different composition than the previous slide.");
            }
            if !has_body_content {
                layout = layout.replace("body text", "title");
                layout = layout.replace(&format!(" within {TEXT_AREA}"), "");
                layout.push_str(" Ensure ample space for the visual.");
            }
            layout
        }
    }
}

/// Hard cut at [`MAX_PROMPT_LEN`] characters; no word-boundary trimming.
fn truncate_prompt(prompt: String) -> String {
    if prompt.chars().count() <= MAX_PROMPT_LEN {
        prompt
    } else {
        prompt.chars().take(MAX_PROMPT_LEN).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn inputs<'a>(content: &'a SlideContent) -> PromptInputs<'a> {
        PromptInputs {
            slide_title: "The Rise of Padel",
            content,
            style_description: "Clean, modern Apple Keynote aesthetic.",
            slide_number: 3,
            total_slides: 8,
            creativity_score: 5,
            presentation_topic: Some("Padel"),
            font_choice: "Inter",
            presenter_name: Some("Alex Doe"),
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn first_slide_is_title() {
        assert_eq!(classify_slide(1, 8, "Anything"), SlideKind::Title);
    }

    #[test]
    fn last_slide_with_closing_keyword_is_closing() {
        assert_eq!(classify_slide(8, 8, "Thank You!"), SlideKind::Closing);
        assert_eq!(classify_slide(8, 8, "Q&A"), SlideKind::Closing);
    }

    #[test]
    fn last_slide_without_keyword_is_content() {
        assert_eq!(classify_slide(8, 8, "Advanced Tactics"), SlideKind::Content);
    }

    #[test]
    fn middle_slide_is_content() {
        assert_eq!(classify_slide(4, 8, "Summary"), SlideKind::Content);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(CreativityTier::from_score(1), CreativityTier::Low);
        assert_eq!(CreativityTier::from_score(3), CreativityTier::Low);
        assert_eq!(CreativityTier::from_score(4), CreativityTier::Medium);
        assert_eq!(CreativityTier::from_score(7), CreativityTier::Medium);
        assert_eq!(CreativityTier::from_score(8), CreativityTier::High);
        assert_eq!(CreativityTier::from_score(10), CreativityTier::High);
    }

    #[test]
    fn layout_pools_are_nested() {
        let low = layout_candidates(CreativityTier::Low);
        let medium = layout_candidates(CreativityTier::Medium);
        let high = layout_candidates(CreativityTier::High);
        assert_eq!(low.len(), 2);
        assert_eq!(medium.len(), 5);
        assert_eq!(high.len(), 10);
        assert!(low.iter().all(|l| medium.contains(l)));
        assert!(medium.iter().all(|l| high.contains(l)));
    }

    #[test]
    fn low_creativity_always_draws_from_low_pool() {
        let content = SlideContent::Bullets(vec!["one".into(), "two".into()]);
        let mut input = inputs(&content);
        input.creativity_score = 2;
        input.slide_number = 2; // avoid the vary-composition suffix
        let low = layout_candidates(CreativityTier::Low);

        let mut rng = rng();
        for _ in 0..50 {
            let prompt = build_image_prompt(&input, &mut rng);
            assert!(
                low.iter().any(|layout| prompt.contains(layout.as_str())),
                "layout not drawn from the low pool"
            );
        }
    }

    #[test]
    fn high_creativity_reaches_beyond_the_medium_pool() {
        let content = SlideContent::Bullets(vec!["one".into(), "two".into()]);
        let mut input = inputs(&content);
        input.creativity_score = 9;
        input.slide_number = 2;
        let medium = layout_candidates(CreativityTier::Medium);

        let mut rng = rng();
        let mut saw_high_only = false;
        for _ in 0..200 {
            let prompt = build_image_prompt(&input, &mut rng);
            let in_medium = medium.iter().any(|layout| prompt.contains(layout.as_str()));
            if !in_medium {
                saw_high_only = true;
                break;
            }
        }
        assert!(saw_high_only, "high tier never drew a high-only layout");
    }

    #[test]
    fn vary_composition_appended_after_second_slide() {
        let content = SlideContent::Bullets(vec!["one".into()]);
        let mut input = inputs(&content);
        input.slide_number = 3;
        let prompt = build_image_prompt(&input, &mut rng());
        assert!(prompt.contains("Try a different composition than the previous slide."));
    }

    #[test]
    fn title_slide_includes_presenter_name() {
        let content = SlideContent::Bullets(vec![]);
        let mut input = inputs(&content);
        input.slide_number = 1;
        let prompt = build_image_prompt(&input, &mut rng());
        assert!(prompt.contains("By: Alex Doe"));
        assert!(prompt.contains("Presenter Name"));
    }

    #[test]
    fn empty_content_skips_body_section() {
        let content = SlideContent::Bullets(vec![]);
        let mut input = inputs(&content);
        input.slide_number = 4;
        let prompt = build_image_prompt(&input, &mut rng());
        assert!(prompt.contains("None required for this slide"));
    }

    #[test]
    fn pencil_style_adds_handwriting_instruction() {
        let content = SlideContent::Paragraph("Some body".into());
        let mut input = inputs(&content);
        input.style_description = "Hand-drawn pencil sketch style on textured paper background.";
        let prompt = build_image_prompt(&input, &mut rng());
        assert!(prompt.contains("SPECIAL INSTRUCTION FOR PENCIL STYLE"));
    }

    #[test]
    fn prompt_is_hard_truncated() {
        let long_body = "x".repeat(8000);
        let content = SlideContent::Paragraph(long_body);
        let input = inputs(&content);
        let prompt = build_image_prompt(&input, &mut rng());
        assert!(prompt.chars().count() <= MAX_PROMPT_LEN);
    }

    #[test]
    fn style_suffix_matches_tier() {
        let content = SlideContent::Bullets(vec!["a".into()]);
        let mut input = inputs(&content);
        input.creativity_score = 9;
        let prompt = build_image_prompt(&input, &mut rng());
        assert!(prompt.contains("Highly creative, artistic interpretation"));
    }
}
