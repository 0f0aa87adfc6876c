//! Document domain model.
//!
//! # Responsibility
//! - Define the canonical document record keyed by an identity triple.
//! - Provide creation/patch payloads and identity validation.
//!
//! # Invariants
//! - `(owner_id, project_id, doc_type, doc_id)` is unique in storage.
//! - Identity components never contain `/`, which is the key separator.
//! - Enrichment fields (`agile_pn`, `agile_rev`, `doc_title`) treat the
//!   empty string as "unset".

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable integer id assigned to a document by the store.
pub type DocumentId = i64;

/// Stable integer id of the user owning a document.
pub type OwnerId = i64;

static IDENTITY_COMPONENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 ._-]*$").expect("valid identity regex"));

/// Validation failure for document input payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    /// Identity component is empty after trim.
    MissingIdentityField(&'static str),
    /// Identity component contains characters outside the allowed set.
    InvalidIdentityField {
        field: &'static str,
        value: String,
    },
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentityField(field) => {
                write!(f, "required identity field `{field}` is missing or blank")
            }
            Self::InvalidIdentityField { field, value } => {
                write!(f, "identity field `{field}` has invalid value `{value}`")
            }
        }
    }
}

impl Error for DocumentValidationError {}

/// Identity triple locating a document within an owner's scope and within
/// the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentIdentity {
    pub project_id: String,
    pub doc_type: String,
    pub doc_id: String,
}

impl DocumentIdentity {
    pub fn new(
        project_id: impl Into<String>,
        doc_type: impl Into<String>,
        doc_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            doc_type: doc_type.into(),
            doc_id: doc_id.into(),
        }
    }

    /// Returns the `/`-joined triple used as visited-set key by traversal
    /// algorithms and as catalog index key.
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.project_id, self.doc_type, self.doc_id)
    }

    /// Validates all three identity components.
    ///
    /// # Errors
    /// - `MissingIdentityField` when a component is blank after trim.
    /// - `InvalidIdentityField` when a component fails the allowed pattern.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        for (field, value) in [
            ("project_id", self.project_id.as_str()),
            ("doc_type", self.doc_type.as_str()),
            ("doc_id", self.doc_id.as_str()),
        ] {
            if value.trim().is_empty() {
                return Err(DocumentValidationError::MissingIdentityField(field));
            }
            if !IDENTITY_COMPONENT_RE.is_match(value) {
                return Err(DocumentValidationError::InvalidIdentityField {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl Display for DocumentIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Canonical persisted document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    /// Store-assigned stable id.
    pub id: DocumentId,
    /// Owning user. Every read/write path is scoped by this value.
    pub owner_id: OwnerId,
    #[serde(flatten)]
    pub identity: DocumentIdentity,
    /// External part-number label. Empty means unset.
    pub agile_pn: String,
    /// Revision label. Empty means unset.
    pub agile_rev: String,
    /// Human-readable title. Empty means unset.
    pub doc_title: String,
    /// Source URL of the document body.
    pub doc_url: String,
    /// Optional display order for list presentation.
    pub sort_order: Option<i64>,
    /// Creation timestamp in epoch milliseconds, set by the store.
    pub created_at: i64,
}

/// Creation payload for one document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewDocument {
    pub project_id: String,
    pub doc_type: String,
    pub doc_id: String,
    pub agile_pn: String,
    pub agile_rev: String,
    pub doc_title: String,
    pub doc_url: String,
    pub sort_order: Option<i64>,
}

impl NewDocument {
    /// Creates a payload carrying only the identity triple, every other
    /// field left at its unset default.
    pub fn from_identity(identity: &DocumentIdentity) -> Self {
        Self {
            project_id: identity.project_id.clone(),
            doc_type: identity.doc_type.clone(),
            doc_id: identity.doc_id.clone(),
            ..Self::default()
        }
    }

    pub fn identity(&self) -> DocumentIdentity {
        DocumentIdentity::new(
            self.project_id.clone(),
            self.doc_type.clone(),
            self.doc_id.clone(),
        )
    }

    /// Validates the identity triple of this payload.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        self.identity().validate()
    }
}

/// Partial update payload. `None` fields are left untouched.
///
/// `sort_order` is doubly optional so a patch can distinguish "leave as is"
/// (`None`) from "clear the value" (`Some(None)`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentPatch {
    pub project_id: Option<String>,
    pub doc_type: Option<String>,
    pub doc_id: Option<String>,
    pub agile_pn: Option<String>,
    pub agile_rev: Option<String>,
    pub doc_title: Option<String>,
    pub doc_url: Option<String>,
    pub sort_order: Option<Option<i64>>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.project_id.is_none()
            && self.doc_type.is_none()
            && self.doc_id.is_none()
            && self.agile_pn.is_none()
            && self.agile_rev.is_none()
            && self.doc_title.is_none()
            && self.doc_url.is_none()
            && self.sort_order.is_none()
    }

    /// Validates patched identity components against the same rules as
    /// creation payloads. Untouched components are not re-checked.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        for (field, value) in [
            ("project_id", self.project_id.as_deref()),
            ("doc_type", self.doc_type.as_deref()),
            ("doc_id", self.doc_id.as_deref()),
        ] {
            let Some(value) = value else { continue };
            if value.trim().is_empty() {
                return Err(DocumentValidationError::MissingIdentityField(field));
            }
            if !IDENTITY_COMPONENT_RE.is_match(value) {
                return Err(DocumentValidationError::InvalidIdentityField {
                    field,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}
