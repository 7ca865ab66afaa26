//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` entity struct matching the database
//! row plus the create/update DTOs the repositories accept.

pub mod presentation;
pub mod slide;
pub mod user;
