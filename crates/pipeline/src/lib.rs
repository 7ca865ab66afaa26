//! Visual generation pipeline: fan-out/fan-in batch orchestration.
//!
//! A submitted batch spawns one [`VisualGenerationJob`] per slide on the
//! tokio runtime, collects every job's terminal outcome under a
//! supervisor task, and runs the [`finalizer`] exactly once to settle the
//! presentation's status and perform credit compensation. Cancellation is
//! cooperative: the [`BatchRegistry`] maps each batch token to a
//! `CancellationToken` that in-flight jobs observe between attempts.

pub mod batch;
pub mod cancel;
pub mod context;
pub mod error;
pub mod finalizer;
pub mod generator;
pub mod job;
pub mod progress;
pub mod regenerate;

pub use batch::{submit_visuals, BatchRegistry};
pub use cancel::{cancel_batch, CancelOutcome};
pub use context::PipelineContext;
pub use error::PipelineError;
pub use generator::{GenerationFailure, ImageGenerator};
pub use job::VisualGenerationJob;
pub use progress::batch_progress;
pub use regenerate::{regenerate_slide, RegenerateOverrides, RegeneratedSlide};
