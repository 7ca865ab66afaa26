//! Blob key construction.

use deckgen_core::types::DbId;

/// Build the storage key for a slide image.
///
/// Keys are namespaced by presentation and carry a random suffix so a
/// regenerated image never overwrites the one a client may still be
/// fetching: `{presentation_id}/slide_{n}_{suffix}.png`.
pub fn slide_image_key(presentation_id: DbId, slide_number: u32) -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{presentation_id}/slide_{slide_number}_{}.png",
        &suffix[..8]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_by_presentation() {
        let key = slide_image_key(42, 3);
        assert!(key.starts_with("42/slide_3_"));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn regenerated_keys_differ() {
        assert_ne!(slide_image_key(1, 1), slide_image_key(1, 1));
    }
}
