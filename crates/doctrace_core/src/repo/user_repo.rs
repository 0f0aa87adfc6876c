//! User account repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide the username registry that produces owner ids.
//!
//! # Invariants
//! - Usernames are unique and stored trimmed.
//! - Credential and session handling stay outside this crate.

use crate::db::migrations::latest_version;
use crate::model::document::OwnerId;
use crate::model::user::UserAccount;
use crate::repo::document_repo::{table_exists, table_has_column, RepoError, RepoResult};
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};

const USER_SELECT_SQL: &str = "SELECT id, username, created_at FROM users";

/// Repository interface for user account operations.
pub trait UserRepository {
    /// Registers one account; rejects blank or already-taken usernames.
    fn create_user(&self, username: &str) -> RepoResult<UserAccount>;
    /// Gets one account by owner id.
    fn get_user(&self, id: OwnerId) -> RepoResult<Option<UserAccount>>;
    /// Finds one account by exact username.
    fn find_by_username(&self, username: &str) -> RepoResult<Option<UserAccount>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Creates a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_user_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, username: &str) -> RepoResult<UserAccount> {
        let trimmed = username.trim();
        if trimmed.is_empty() {
            return Err(RepoError::InvalidUsername(username.to_string()));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if select_by_username(&tx, trimmed)?.is_some() {
            return Err(RepoError::DuplicateUsername(trimmed.to_string()));
        }

        tx.execute("INSERT INTO users (username) VALUES (?1);", [trimmed])?;
        let id = tx.last_insert_rowid();

        let account = tx.query_row(&format!("{USER_SELECT_SQL} WHERE id = ?1;"), [id], |row| {
            Ok(UserAccount {
                id: row.get("id")?,
                username: row.get("username")?,
                created_at: row.get("created_at")?,
            })
        })?;

        tx.commit()?;
        Ok(account)
    }

    fn get_user(&self, id: OwnerId) -> RepoResult<Option<UserAccount>> {
        let mut stmt = self.conn.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_user_row(row)?));
        }
        Ok(None)
    }

    fn find_by_username(&self, username: &str) -> RepoResult<Option<UserAccount>> {
        select_by_username(self.conn, username.trim())
    }
}

fn select_by_username(conn: &Connection, username: &str) -> RepoResult<Option<UserAccount>> {
    let mut stmt = conn.prepare(&format!("{USER_SELECT_SQL} WHERE username = ?1;"))?;
    let mut rows = stmt.query([username])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_user_row(row)?));
    }
    Ok(None)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<UserAccount> {
    Ok(UserAccount {
        id: row.get("id")?,
        username: row.get("username")?,
        created_at: row.get("created_at")?,
    })
}

fn ensure_user_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "users")? {
        return Err(RepoError::MissingRequiredTable("users"));
    }
    for column in ["id", "username", "created_at"] {
        if !table_has_column(conn, "users", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }
    Ok(())
}
