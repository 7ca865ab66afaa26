//! Predefined visual style catalog.
//!
//! A style choice is either one of these keys or a free-form custom
//! prompt; [`style_description`] resolves both.

/// Predefined style keys and their full descriptions.
pub const STYLE_CATALOG: &[(&str, &str)] = &[
    (
        "keynote_modern",
        "Clean, modern Apple Keynote aesthetic. Ample white space, elegant sans-serif font \
         (like SF Pro or Helvetica Neue), subtle gradients or solid muted backgrounds, \
         high-quality relevant visuals (photos or icons), focus on clarity and hierarchy. \
         Minimalist but polished.",
    ),
    (
        "abstract_gradient",
        "Vibrant, abstract gradient background (e.g., purple-pink-orange, blue-green). \
         Energetic feel, possibly with subtle geometric shapes or overlays. Modern \
         sans-serif font (e.g., Montserrat, Poppins). Focus on color and dynamism.",
    ),
    (
        "minimalist_sketch",
        "Clean, minimalist design using hand-drawn sketch-style illustrations or icons. \
         Lots of white space. Simple, readable sans-serif font (e.g., Quicksand, Nunito). \
         Limited color palette, often monochrome with one accent color.",
    ),
    (
        "cyberpunk_glow",
        "Futuristic cyberpunk aesthetic. Dark background (deep blues, purples, blacks). \
         Neon glowing elements, grids, digital glitches, holographic effects. Tech-inspired \
         sans-serif font (e.g., Orbitron, Teko). Vibrant neon accent colors (pinks, cyans, \
         greens).",
    ),
    (
        "corporate_charts",
        "Professional corporate style. Clean layout, structured design with potential for \
         simple charts/graphs (bar charts, line graphs) if relevant to content. Use of \
         blues, grays, whites. Clear sans-serif font like Lato or Open Sans. Focus on data \
         visualization and professionalism.",
    ),
    (
        "ghibli_inspired",
        "Warm, whimsical Studio Ghibli-inspired anime aesthetic. Hand-painted watercolor \
         backgrounds, soft lighting, nature motifs (plants, clouds, sky). Gentle, rounded \
         font. Pastel color palette (soft blues, greens, pinks, creams). Evokes nostalgia \
         and wonder.",
    ),
    (
        "pencil_paper",
        "Hand-drawn pencil sketch style on textured paper background. Monochrome or limited \
         color palette (e.g., graphite grey, sepia tones). Illustrations should look \
         sketched. IMPORTANT: Text elements (title, body) should appear as if written in \
         pencil or simple handwriting font.",
    ),
    (
        "claymorphism_3d",
        "Soft, rounded 3D claymorphism style. Elements appear like smooth clay or \
         plasticine objects with soft shadows and inner/outer extrusion effects. Pastel or \
         muted color palette. Playful, tactile feel. Use a friendly, rounded sans-serif \
         font.",
    ),
];

/// Resolve a style choice to its full description.
///
/// Known catalog keys expand to their descriptions; anything else is
/// treated as a custom prompt and returned unchanged.
pub fn style_description(key_or_prompt: &str) -> &str {
    STYLE_CATALOG
        .iter()
        .find(|(key, _)| *key == key_or_prompt)
        .map(|(_, description)| *description)
        .unwrap_or(key_or_prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_key_expands_to_description() {
        assert!(style_description("keynote_modern").contains("Apple Keynote"));
        assert!(style_description("pencil_paper").contains("pencil"));
    }

    #[test]
    fn custom_prompt_passes_through() {
        let custom = "Moody oil painting with heavy brush strokes";
        assert_eq!(style_description(custom), custom);
    }
}
