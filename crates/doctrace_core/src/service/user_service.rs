//! User account use-case service.
//!
//! Registration only: credentials and sessions are the embedding
//! application's concern.

use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::model::document::OwnerId;
use crate::model::user::UserAccount;
use crate::repo::document_repo::RepoError;
use crate::repo::user_repo::UserRepository;

/// Service error for user account use-cases.
#[derive(Debug)]
pub enum UserServiceError {
    /// Username is blank or otherwise unusable.
    InvalidUsername(String),
    /// Username is already registered.
    DuplicateUsername(String),
    /// Target account does not exist.
    UserNotFound(OwnerId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUsername(value) => write!(f, "invalid username: `{value}`"),
            Self::DuplicateUsername(value) => {
                write!(f, "username already registered: `{value}`")
            }
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for UserServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidUsername(name) => Self::InvalidUsername(name),
            RepoError::DuplicateUsername(name) => Self::DuplicateUsername(name),
            RepoError::UserNotFound(id) => Self::UserNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Use-case facade for account registration and lookup.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers one account with a unique username.
    pub fn register_user(&self, username: &str) -> Result<UserAccount, UserServiceError> {
        self.repo.create_user(username).map_err(Into::into)
    }

    /// Gets one account by owner id.
    pub fn get_user(&self, id: OwnerId) -> Result<UserAccount, UserServiceError> {
        self.repo
            .get_user(id)?
            .ok_or(UserServiceError::UserNotFound(id))
    }

    /// Finds one account by username.
    pub fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserAccount>, UserServiceError> {
        self.repo.find_by_username(username).map_err(Into::into)
    }
}
