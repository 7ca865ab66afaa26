//! Batch-verdict evaluation for the finalizer.
//!
//! In-memory job outcomes can be decoupled from what was durably persisted
//! (a worker can crash between generating an image and committing the slide
//! row), so success is decided from both signals: at least one job reported
//! success AND at least that many slides actually have a persisted image.

/// Aggregate result of a finished batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Number of jobs that reported `true`. Missing outcomes count as failure.
    pub success_count: usize,
    /// Slides under the presentation with a non-null image reference.
    pub actual_images: i64,
    /// Whether the batch as a whole is considered successful.
    pub successful: bool,
}

/// Evaluate a batch from the per-job outcome list and the persisted image
/// count. `None` entries are jobs that never reported and count as failures.
pub fn evaluate_batch(outcomes: &[Option<bool>], actual_images: i64) -> BatchOutcome {
    let success_count = outcomes.iter().filter(|o| **o == Some(true)).count();
    let successful = success_count > 0 && actual_images >= success_count as i64;
    BatchOutcome {
        success_count,
        actual_images,
        successful,
    }
}
