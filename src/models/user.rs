//! Represents an owning identity for documents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A user account that owns documents.
///
/// Every document belongs to exactly one user. The service runs with a
/// single seeded default owner; full identity management lives elsewhere.
#[derive(Serialize, Clone, FromRow, Debug)]
pub struct User {
    /// Integer identifier for this user.
    pub id: i64,

    /// Unique login name.
    pub username: String,

    /// When this account was created.
    pub created_at: DateTime<Utc>,
}
