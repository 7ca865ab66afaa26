//! OpenAI content-generation client.
//!
//! Wraps the chat-completions endpoint (slide text) and the images
//! endpoint (`gpt-image-1` slide visuals) behind a typed client with a
//! classified error enum, so the pipeline can decide retry behaviour
//! without inspecting HTTP details.

pub mod client;
pub mod error;
pub mod image;
pub mod styles;
pub mod text;

pub use client::OpenAiClient;
pub use error::OpenAiError;
pub use image::GeneratedImage;
pub use text::{SlideDraft, TextStyle};
