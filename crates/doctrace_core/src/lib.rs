//! Core domain logic for the DocTrace document catalog.
//! This crate is the single source of truth for catalog-resolution and
//! link-graph invariants.

pub mod catalog;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use catalog::{
    CatalogEntry, CatalogError, CatalogLink, CatalogResult, CatalogSource, InMemoryCatalog,
    JsonFileCatalog,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{
    Document, DocumentId, DocumentIdentity, DocumentPatch, DocumentValidationError, NewDocument,
    OwnerId,
};
pub use model::user::UserAccount;
pub use repo::document_repo::{
    DocumentRepository, RepoError, RepoResult, SqliteDocumentRepository,
};
pub use repo::user_repo::{SqliteUserRepository, UserRepository};
pub use service::document_service::{DocumentService, DocumentServiceError};
pub use service::link_view::{build_nested_view, DocumentWithLinks, NestedDocument};
pub use service::resolver::CatalogResolver;
pub use service::user_service::{UserService, UserServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
