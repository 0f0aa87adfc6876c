//! External catalog data source.
//!
//! # Responsibility
//! - Define the read-only catalog entry model and load contract.
//! - Keep catalog loading an injected collaborator, never ambient state.
//!
//! # Invariants
//! - The catalog is reloaded fresh on every resolution call; nothing here
//!   caches entries across calls.
//! - This crate never writes to the catalog.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use crate::model::document::DocumentIdentity;

mod json_file;

pub use json_file::JsonFileCatalog;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Catalog load failure. Callers on the resolution path degrade this to a
/// logged no-op; it must never abort document creation.
#[derive(Debug)]
pub enum CatalogError {
    /// Catalog file missing or unreadable.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Catalog file content is not a valid entry sequence.
    Malformed { path: PathBuf, message: String },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read catalog `{}`: {source}", path.display())
            }
            Self::Malformed { path, message } => {
                write!(f, "malformed catalog `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed { .. } => None,
        }
    }
}

/// One linked-document reference inside a catalog entry.
///
/// Enrichment hints are optional in the file and default to the unset
/// marker; resolution takes enrichment from the referenced identity's full
/// entry, not from these inline hints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogLink {
    pub project_id: String,
    pub doc_type: String,
    pub doc_id: String,
    #[serde(default)]
    pub agile_pn: String,
    #[serde(default)]
    pub agile_rev: String,
    #[serde(default)]
    pub doc_title: String,
}

impl CatalogLink {
    pub fn identity(&self) -> DocumentIdentity {
        DocumentIdentity::new(
            self.project_id.clone(),
            self.doc_type.clone(),
            self.doc_id.clone(),
        )
    }
}

/// One read-only catalog record keyed by an identity triple.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub project_id: String,
    pub doc_type: String,
    pub doc_id: String,
    #[serde(default)]
    pub agile_pn: String,
    #[serde(default)]
    pub agile_rev: String,
    #[serde(default)]
    pub doc_title: String,
    /// Ordered linked-document references. Order is preserved all the way
    /// into stored direct links.
    #[serde(default)]
    pub linked_docs: Vec<CatalogLink>,
}

impl CatalogEntry {
    pub fn identity(&self) -> DocumentIdentity {
        DocumentIdentity::new(
            self.project_id.clone(),
            self.doc_type.clone(),
            self.doc_id.clone(),
        )
    }
}

/// Read-only source of catalog entries.
///
/// Implementations load the full entry sequence on every call so one
/// resolution pass always sees one consistent snapshot.
pub trait CatalogSource {
    fn load_entries(&self) -> CatalogResult<Vec<CatalogEntry>>;
}

/// Fixed in-memory catalog for tests and embedded callers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: Vec<CatalogEntry>,
}

impl InMemoryCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }
}

impl CatalogSource for InMemoryCatalog {
    fn load_entries(&self) -> CatalogResult<Vec<CatalogEntry>> {
        Ok(self.entries.clone())
    }
}
