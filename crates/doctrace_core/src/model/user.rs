//! User account read model.
//!
//! Authentication and sessions live outside this crate; the core only needs
//! a stable owner id to scope documents by, plus the username registry that
//! produces those ids.

use serde::Serialize;

use crate::model::document::OwnerId;

/// Registered account owning documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    /// Store-assigned stable id, used as `owner_id` on documents.
    pub id: OwnerId,
    /// Unique login name.
    pub username: String,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
}
