//! Document use-case service.
//!
//! # Responsibility
//! - Provide owner-scoped create/list/update/delete entry points.
//! - Trigger catalog resolution after first persist.
//! - Assemble the nested link view for list presentation.
//!
//! # Invariants
//! - Every operation is scoped to the requesting owner, including partial
//!   updates.
//! - Creation succeeds even when the catalog is unavailable; only store
//!   failures abort it.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::catalog::CatalogSource;
use crate::model::document::{
    Document, DocumentId, DocumentPatch, DocumentValidationError, NewDocument, OwnerId,
};
use crate::repo::document_repo::{DocumentRepository, RepoError};
use crate::service::link_view::{build_nested_view, DocumentWithLinks, NestedDocument};
use crate::service::resolver::CatalogResolver;

/// Service error for document use-cases.
#[derive(Debug)]
pub enum DocumentServiceError {
    /// Input payload failed validation; resolution was never invoked.
    Validation(DocumentValidationError),
    /// Target document does not exist within the owner's scope.
    DocumentNotFound(DocumentId),
    /// Requesting owner account does not exist.
    UserNotFound(OwnerId),
    /// Identity triple already taken within the owner's scope.
    DuplicateIdentity { owner_id: OwnerId, key: String },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for DocumentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::DuplicateIdentity { owner_id, key } => {
                write!(f, "document `{key}` already exists for owner {owner_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DocumentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::DocumentNotFound(id),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            RepoError::DuplicateIdentity { owner_id, key } => {
                Self::DuplicateIdentity { owner_id, key }
            }
            other => Self::Repo(other),
        }
    }
}

/// Use-case facade over the document store and the external catalog.
pub struct DocumentService<R: DocumentRepository, C: CatalogSource> {
    repo: R,
    catalog: C,
}

impl<R: DocumentRepository, C: CatalogSource> DocumentService<R, C> {
    /// Creates a service from repository and catalog implementations.
    pub fn new(repo: R, catalog: C) -> Self {
        Self { repo, catalog }
    }

    /// Creates one document and resolves it against the catalog.
    ///
    /// # Contract
    /// - Validates the payload before any write.
    /// - Returns the refreshed record, so catalog enrichment applied during
    ///   resolution is visible to the caller.
    pub fn create_document(
        &self,
        owner_id: OwnerId,
        payload: &NewDocument,
    ) -> Result<Document, DocumentServiceError> {
        payload.validate().map_err(DocumentServiceError::Validation)?;

        let document = self.repo.create_document(owner_id, payload)?;
        CatalogResolver::new(&self.catalog, &self.repo).resolve(&document)?;

        let refreshed = self
            .repo
            .get_document(owner_id, document.id)?
            .ok_or(DocumentServiceError::DocumentNotFound(document.id))?;
        Ok(refreshed)
    }

    /// Lists the owner's documents in display order.
    pub fn list_documents(&self, owner_id: OwnerId) -> Result<Vec<Document>, DocumentServiceError> {
        self.repo.list_documents(owner_id).map_err(Into::into)
    }

    /// Lists the owner's documents with direct links expanded into a
    /// nested forest.
    pub fn list_documents_with_links(
        &self,
        owner_id: OwnerId,
    ) -> Result<Vec<NestedDocument>, DocumentServiceError> {
        let documents = self.repo.list_documents(owner_id)?;

        let mut records = Vec::with_capacity(documents.len());
        for document in documents {
            let link_ids = self.repo.direct_link_ids(document.id)?;
            records.push(DocumentWithLinks { document, link_ids });
        }
        Ok(build_nested_view(&records))
    }

    /// Applies a partial update to one of the owner's documents.
    pub fn update_document(
        &self,
        owner_id: OwnerId,
        id: DocumentId,
        patch: &DocumentPatch,
    ) -> Result<Document, DocumentServiceError> {
        self.repo
            .update_document(owner_id, id, patch)
            .map_err(Into::into)
    }

    /// Deletes one of the owner's documents.
    pub fn delete_document(
        &self,
        owner_id: OwnerId,
        id: DocumentId,
    ) -> Result<(), DocumentServiceError> {
        self.repo.delete_document(owner_id, id).map_err(Into::into)
    }

    /// Deletes every document of one owner. Returns the removed count.
    pub fn delete_all_documents(&self, owner_id: OwnerId) -> Result<u64, DocumentServiceError> {
        self.repo.delete_all_documents(owner_id).map_err(Into::into)
    }
}
