//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and catalog calls into use-case level APIs.
//! - Keep outer transport layers decoupled from storage details.

pub mod document_service;
pub mod link_view;
pub mod resolver;
pub mod user_service;
