//! Deckgen event bus.
//!
//! In-process publish/subscribe hub for pipeline progress events, backed
//! by `tokio::sync::broadcast`. The API subscribes to push batch progress
//! to clients; publishers never block on slow consumers.

pub mod bus;

pub use bus::{DeckEvent, EventBus};
