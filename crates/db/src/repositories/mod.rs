//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept an executor as the first argument. Methods that participate in
//! multi-statement transactions (refunds, status finalization) take
//! `impl PgExecutor` so they run against either the pool or an open
//! transaction.

pub mod presentation_repo;
pub mod slide_repo;
pub mod user_repo;

pub use presentation_repo::PresentationRepo;
pub use slide_repo::SlideRepo;
pub use user_repo::UserRepo;
