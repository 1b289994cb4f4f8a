//! Repository contracts shared by notebook and note persistence.
//!
//! # Responsibility
//! - Keep SQL details inside the core persistence boundary.
//! - Define the error and ordering vocabulary used by all read/write paths.
//!
//! # Invariants
//! - Read paths reject invalid persisted state instead of masking it.
//! - List ordering is deterministic: sort key first, `uuid ASC` tie-break.

use crate::db::DbError;
use crate::model::RecordId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod note_repo;
pub mod notebook_repo;

pub use note_repo::{NoteRepository, SqliteNoteRepository};
pub use notebook_repo::{NotebookRepository, SqliteNotebookRepository};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for record persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(RecordId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
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

/// List ordering over the creation timestamp.
///
/// Newest-first is the application default for both record kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// `creation_date DESC`, newest first.
    #[default]
    CreationDateDesc,
    /// `creation_date ASC`, oldest first.
    CreationDateAsc,
}

impl SortOrder {
    /// ORDER BY clause fragment including the stable `uuid` tie-break.
    pub(crate) fn order_by_sql(self) -> &'static str {
        match self {
            Self::CreationDateDesc => "ORDER BY creation_date DESC, uuid ASC",
            Self::CreationDateAsc => "ORDER BY creation_date ASC, uuid ASC",
        }
    }
}

pub(crate) fn parse_record_uuid(column: &str, value: &str) -> RepoResult<RecordId> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
