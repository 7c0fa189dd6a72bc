//! Core data models for the document service.
//!
//! These entities represent stored documents and their owning users.
//! They map cleanly to database tables via `sqlx::FromRow` and serialize
//! naturally as JSON via `serde`.

pub mod document;
pub mod user;
