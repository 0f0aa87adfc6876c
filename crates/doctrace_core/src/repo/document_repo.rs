//! Document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide owner-scoped document CRUD and direct-link persistence.
//! - Keep the flat many-to-many link relation out of the document record.
//!
//! # Invariants
//! - `(owner_id, project_id, doc_type, doc_id)` stays unique per owner.
//! - `get_or_create_document` is one atomic check-and-insert step.
//! - `set_direct_links` replaces the whole link set, never merges.
//! - Link listing is deterministic: `position ASC`.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::document::{
    Document, DocumentId, DocumentIdentity, DocumentPatch, DocumentValidationError, NewDocument,
    OwnerId,
};
use rusqlite::types::Value;
use rusqlite::{
    params, params_from_iter, Connection, ErrorCode, Row, Transaction, TransactionBehavior,
};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const DOCUMENT_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    project_id,
    doc_type,
    doc_id,
    agile_pn,
    agile_rev,
    doc_title,
    doc_url,
    sort_order,
    created_at
FROM documents";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for document and user persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Payload failed model validation before any write.
    Validation(DocumentValidationError),
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target document does not exist within the requesting owner's scope.
    NotFound(DocumentId),
    /// Another document already holds this identity for the same owner.
    DuplicateIdentity { owner_id: OwnerId, key: String },
    /// Referenced owner account does not exist.
    UserNotFound(OwnerId),
    /// Username is blank or otherwise unusable.
    InvalidUsername(String),
    /// Username is already registered.
    DuplicateUsername(String),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::DuplicateIdentity { owner_id, key } => {
                write!(f, "document `{key}` already exists for owner {owner_id}")
            }
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::InvalidUsername(value) => write!(f, "invalid username: `{value}`"),
            Self::DuplicateUsername(value) => {
                write!(f, "username already registered: `{value}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted document data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "repository requires column `{column}` in table `{table}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DocumentValidationError> for RepoError {
    fn from(value: DocumentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for owner-scoped document operations.
pub trait DocumentRepository {
    /// Creates one document; rejects an identity already taken by the owner.
    fn create_document(&self, owner_id: OwnerId, payload: &NewDocument) -> RepoResult<Document>;
    /// Gets one document by id within the owner's scope.
    fn get_document(&self, owner_id: OwnerId, id: DocumentId) -> RepoResult<Option<Document>>;
    /// Finds one document by identity triple within the owner's scope.
    fn find_by_identity(
        &self,
        owner_id: OwnerId,
        identity: &DocumentIdentity,
    ) -> RepoResult<Option<Document>>;
    /// Returns the owner's document for the payload identity, creating it
    /// from the payload when absent. Atomic check-and-insert.
    fn get_or_create_document(
        &self,
        owner_id: OwnerId,
        payload: &NewDocument,
    ) -> RepoResult<Document>;
    /// Lists the owner's documents ordered by `sort_order ASC, id ASC`.
    fn list_documents(&self, owner_id: OwnerId) -> RepoResult<Vec<Document>>;
    /// Returns direct-link target ids for one document in stored order.
    fn direct_link_ids(&self, document_id: DocumentId) -> RepoResult<Vec<DocumentId>>;
    /// Replaces one document's whole direct-link set with the given targets.
    fn set_direct_links(
        &self,
        source_id: DocumentId,
        target_ids: &[DocumentId],
    ) -> RepoResult<()>;
    /// Applies a partial update within the owner's scope.
    fn update_document(
        &self,
        owner_id: OwnerId,
        id: DocumentId,
        patch: &DocumentPatch,
    ) -> RepoResult<Document>;
    /// Deletes one document within the owner's scope.
    fn delete_document(&self, owner_id: OwnerId, id: DocumentId) -> RepoResult<()>;
    /// Deletes every document of one owner. Returns the removed row count.
    fn delete_all_documents(&self, owner_id: OwnerId) -> RepoResult<u64>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_document_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn create_document(&self, owner_id: OwnerId, payload: &NewDocument) -> RepoResult<Document> {
        payload.validate()?;
        let identity = payload.identity();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if select_by_identity(&tx, owner_id, &identity)?.is_some() {
            return Err(RepoError::DuplicateIdentity {
                owner_id,
                key: identity.key(),
            });
        }

        let id = insert_document(&tx, owner_id, payload)?;
        let document = load_required_document(&tx, owner_id, id)?;
        tx.commit()?;
        Ok(document)
    }

    fn get_document(&self, owner_id: OwnerId, id: DocumentId) -> RepoResult<Option<Document>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOCUMENT_SELECT_SQL} WHERE id = ?1 AND owner_id = ?2;"))?;
        let mut rows = stmt.query(params![id, owner_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }
        Ok(None)
    }

    fn find_by_identity(
        &self,
        owner_id: OwnerId,
        identity: &DocumentIdentity,
    ) -> RepoResult<Option<Document>> {
        select_by_identity(self.conn, owner_id, identity)
    }

    fn get_or_create_document(
        &self,
        owner_id: OwnerId,
        payload: &NewDocument,
    ) -> RepoResult<Document> {
        payload.validate()?;
        let identity = payload.identity();

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let document = match select_by_identity(&tx, owner_id, &identity)? {
            Some(existing) => existing,
            None => {
                let id = insert_document(&tx, owner_id, payload)?;
                load_required_document(&tx, owner_id, id)?
            }
        };
        tx.commit()?;
        Ok(document)
    }

    fn list_documents(&self, owner_id: OwnerId) -> RepoResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([owner_id])?;

        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }

    fn direct_link_ids(&self, document_id: DocumentId) -> RepoResult<Vec<DocumentId>> {
        let mut stmt = self.conn.prepare(
            "SELECT target_id
             FROM document_links
             WHERE source_id = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([document_id])?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }
        Ok(ids)
    }

    fn set_direct_links(
        &self,
        source_id: DocumentId,
        target_ids: &[DocumentId],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "DELETE FROM document_links WHERE source_id = ?1;",
            [source_id],
        )?;

        // The relation is a set: duplicates in the input keep their first
        // position and are dropped afterwards.
        let mut seen = HashSet::new();
        let mut position = 0i64;
        for target_id in target_ids {
            if !seen.insert(*target_id) {
                continue;
            }
            tx.execute(
                "INSERT INTO document_links (source_id, target_id, position)
                 VALUES (?1, ?2, ?3);",
                params![source_id, target_id, position],
            )?;
            position += 1;
        }

        tx.commit()?;
        Ok(())
    }

    fn update_document(
        &self,
        owner_id: OwnerId,
        id: DocumentId,
        patch: &DocumentPatch,
    ) -> RepoResult<Document> {
        patch.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing = load_required_document(&tx, owner_id, id)?;

        if patch.is_empty() {
            tx.commit()?;
            return Ok(existing);
        }

        let target_identity = DocumentIdentity::new(
            patch
                .project_id
                .clone()
                .unwrap_or_else(|| existing.identity.project_id.clone()),
            patch
                .doc_type
                .clone()
                .unwrap_or_else(|| existing.identity.doc_type.clone()),
            patch
                .doc_id
                .clone()
                .unwrap_or_else(|| existing.identity.doc_id.clone()),
        );
        if target_identity != existing.identity
            && select_by_identity(&tx, owner_id, &target_identity)?.is_some()
        {
            return Err(RepoError::DuplicateIdentity {
                owner_id,
                key: target_identity.key(),
            });
        }

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        let text_fields = [
            ("project_id = ?", patch.project_id.as_ref()),
            ("doc_type = ?", patch.doc_type.as_ref()),
            ("doc_id = ?", patch.doc_id.as_ref()),
            ("agile_pn = ?", patch.agile_pn.as_ref()),
            ("agile_rev = ?", patch.agile_rev.as_ref()),
            ("doc_title = ?", patch.doc_title.as_ref()),
            ("doc_url = ?", patch.doc_url.as_ref()),
        ];
        for (assignment, value) in text_fields {
            if let Some(value) = value {
                assignments.push(assignment);
                bind_values.push(Value::Text(value.clone()));
            }
        }
        if let Some(sort_order) = patch.sort_order {
            assignments.push("sort_order = ?");
            bind_values.push(match sort_order {
                Some(value) => Value::Integer(value),
                None => Value::Null,
            });
        }

        let sql = format!(
            "UPDATE documents SET {} WHERE id = ? AND owner_id = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Integer(id));
        bind_values.push(Value::Integer(owner_id));

        let changed = tx.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let updated = load_required_document(&tx, owner_id, id)?;
        tx.commit()?;
        Ok(updated)
    }

    fn delete_document(&self, owner_id: OwnerId, id: DocumentId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM documents WHERE id = ?1 AND owner_id = ?2;",
            params![id, owner_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_all_documents(&self, owner_id: OwnerId) -> RepoResult<u64> {
        let changed = self
            .conn
            .execute("DELETE FROM documents WHERE owner_id = ?1;", [owner_id])?;
        Ok(changed as u64)
    }
}

fn insert_document(
    conn: &Connection,
    owner_id: OwnerId,
    payload: &NewDocument,
) -> RepoResult<DocumentId> {
    let result = conn.execute(
        "INSERT INTO documents (
            owner_id,
            project_id,
            doc_type,
            doc_id,
            agile_pn,
            agile_rev,
            doc_title,
            doc_url,
            sort_order
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
        params![
            owner_id,
            payload.project_id.as_str(),
            payload.doc_type.as_str(),
            payload.doc_id.as_str(),
            payload.agile_pn.as_str(),
            payload.agile_rev.as_str(),
            payload.doc_title.as_str(),
            payload.doc_url.as_str(),
            payload.sort_order,
        ],
    );

    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        // Identity duplicates are pre-checked inside the same transaction,
        // so a remaining constraint failure is the owner foreign key.
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            Err(RepoError::UserNotFound(owner_id))
        }
        Err(err) => Err(err.into()),
    }
}

fn select_by_identity(
    conn: &Connection,
    owner_id: OwnerId,
    identity: &DocumentIdentity,
) -> RepoResult<Option<Document>> {
    let mut stmt = conn.prepare(&format!(
        "{DOCUMENT_SELECT_SQL}
         WHERE owner_id = ?1
           AND project_id = ?2
           AND doc_type = ?3
           AND doc_id = ?4;"
    ))?;
    let mut rows = stmt.query(params![
        owner_id,
        identity.project_id.as_str(),
        identity.doc_type.as_str(),
        identity.doc_id.as_str(),
    ])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_document_row(row)?));
    }
    Ok(None)
}

fn load_required_document(
    conn: &Connection,
    owner_id: OwnerId,
    id: DocumentId,
) -> RepoResult<Document> {
    let mut stmt =
        conn.prepare(&format!("{DOCUMENT_SELECT_SQL} WHERE id = ?1 AND owner_id = ?2;"))?;
    let mut rows = stmt.query(params![id, owner_id])?;
    if let Some(row) = rows.next()? {
        return parse_document_row(row);
    }
    Err(RepoError::NotFound(id))
}

fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let document = Document {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        identity: DocumentIdentity::new(
            row.get::<_, String>("project_id")?,
            row.get::<_, String>("doc_type")?,
            row.get::<_, String>("doc_id")?,
        ),
        agile_pn: row.get("agile_pn")?,
        agile_rev: row.get("agile_rev")?,
        doc_title: row.get("doc_title")?,
        doc_url: row.get("doc_url")?,
        sort_order: row.get("sort_order")?,
        created_at: row.get("created_at")?,
    };

    if document.identity.validate().is_err() {
        return Err(RepoError::InvalidData(format!(
            "invalid identity `{}` in documents row {}",
            document.identity.key(),
            document.id
        )));
    }
    Ok(document)
}

fn ensure_document_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "documents")? {
        return Err(RepoError::MissingRequiredTable("documents"));
    }
    if !table_exists(conn, "document_links")? {
        return Err(RepoError::MissingRequiredTable("document_links"));
    }

    for column in [
        "id",
        "owner_id",
        "project_id",
        "doc_type",
        "doc_id",
        "agile_pn",
        "agile_rev",
        "doc_title",
        "doc_url",
        "sort_order",
        "created_at",
    ] {
        if !table_has_column(conn, "documents", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "documents",
                column,
            });
        }
    }

    for column in ["source_id", "target_id", "position"] {
        if !table_has_column(conn, "document_links", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "document_links",
                column,
            });
        }
    }

    Ok(())
}

pub(crate) fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

pub(crate) fn table_has_column(
    conn: &Connection,
    table: &str,
    column: &str,
) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
