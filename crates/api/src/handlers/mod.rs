//! HTTP request handlers.

pub mod billing;
pub mod files;
pub mod health;
pub mod presentations;
pub mod slides;
pub mod users;
