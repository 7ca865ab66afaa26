//! Credit ledger arithmetic.
//!
//! Credits are an integer currency debited per generated slide and refunded
//! when a batch fails or is cancelled. All balance mutations happen in the
//! `db` crate inside a single transaction; this module only computes amounts.

/// Credits charged per slide visual in a batch.
pub const CREDITS_PER_SLIDE: i32 = 25;

/// Credits charged for regenerating a single slide's visual.
pub const CREDITS_PER_REGENERATE: i32 = 25;

/// Credits granted on signup, keyed by plan name.
pub const SIGNUP_GRANTS: &[(&str, i32)] = &[("free", 250), ("pro", 2500), ("creator", 10000)];

/// Credits granted for a plan at signup. Unknown plans grant nothing.
pub fn signup_grant(plan: &str) -> i32 {
    SIGNUP_GRANTS
        .iter()
        .find(|(name, _)| *name == plan)
        .map(|(_, credits)| *credits)
        .unwrap_or(0)
}

/// Total credits required to submit a batch of `slide_count` slides.
pub fn batch_cost(slide_count: usize) -> i32 {
    slide_count as i32 * CREDITS_PER_SLIDE
}

/// Refund for a cancelled batch: recomputed from the slide count at
/// cancellation time, not the originally debited amount. This mirrors the
/// shipped behaviour and is pinned by the cancellation tests.
pub fn cancellation_refund(slide_count: i64) -> i32 {
    slide_count as i32 * CREDITS_PER_SLIDE
}
