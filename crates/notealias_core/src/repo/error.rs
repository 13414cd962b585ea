//! Repository error type shared by document and alias stores.

use crate::db::DbError;
use crate::model::document::DocumentValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-level error for identity persistence and queries.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Persisted document state breaks an identity invariant.
    Validation(DocumentValidationError),
    DocumentNotFound(String),
    /// `name` is not an alias of the given document.
    AliasNotFound {
        public_id: String,
        name: String,
    },
    /// `name` is already claimed by a public id or alias.
    NameTaken(String),
    /// Primary alias removal attempted while other aliases remain.
    PrimaryAliasNotSole {
        public_id: String,
        name: String,
        alias_count: usize,
    },
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted row cannot be decoded into the model.
    InvalidData(String),
}

impl RepoError {
    /// Whether retrying the same operation may succeed.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_busy())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::AliasNotFound { public_id, name } => {
                write!(f, "alias `{name}` is not used by document {public_id}")
            }
            Self::NameTaken(name) => write!(f, "name `{name}` is already in use"),
            Self::PrimaryAliasNotSole {
                public_id,
                name,
                alias_count,
            } => write!(
                f,
                "alias `{name}` is the primary alias of document {public_id} and {} other alias(es) remain",
                alias_count.saturating_sub(1)
            ),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "identity repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "identity repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "identity repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid identity data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
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

impl From<DocumentValidationError> for RepoError {
    fn from(value: DocumentValidationError) -> Self {
        Self::Validation(value)
    }
}
