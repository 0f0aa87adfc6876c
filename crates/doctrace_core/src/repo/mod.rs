//! Persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - Provide owner-scoped CRUD and link APIs over catalog storage.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths validate payloads before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod document_repo;
pub mod user_repo;
