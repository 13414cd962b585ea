//! Service error shared by alias and document use-cases.

use crate::model::document::NameKind;
use crate::repo::error::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Abstract failure kinds for transport translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasErrorKind {
    InvalidName,
    ForbiddenName,
    AlreadyExists,
    NotFound,
    PrimaryRemovalForbidden,
    Internal,
}

/// Service error for alias and document lookup use-cases.
#[derive(Debug)]
pub enum AliasServiceError {
    /// Alias is empty or whitespace-only.
    InvalidName,
    /// Alias is on the reserved-name list.
    ForbiddenName(String),
    /// Name is already claimed by an alias or public id.
    AlreadyExists { name: String, conflict: NameKind },
    /// Alias is not used by the target document (or by any document).
    AliasNotFound { name: String },
    DocumentNotFound(String),
    /// Primary alias removal while other aliases remain.
    PrimaryRemovalForbidden { name: String },
    /// Store state breaks an identity invariant, or retries ran out.
    InvariantViolation(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl AliasServiceError {
    pub fn kind(&self) -> AliasErrorKind {
        match self {
            Self::InvalidName => AliasErrorKind::InvalidName,
            Self::ForbiddenName(_) => AliasErrorKind::ForbiddenName,
            Self::AlreadyExists { .. } => AliasErrorKind::AlreadyExists,
            Self::AliasNotFound { .. } | Self::DocumentNotFound(_) => AliasErrorKind::NotFound,
            Self::PrimaryRemovalForbidden { .. } => AliasErrorKind::PrimaryRemovalForbidden,
            Self::InvariantViolation(_) | Self::Repo(_) => AliasErrorKind::Internal,
        }
    }
}

impl Display for AliasServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(f, "alias must not be blank"),
            Self::ForbiddenName(name) => {
                write!(f, "alias `{name}` is forbidden by the administrator")
            }
            Self::AlreadyExists { name, conflict } => match conflict {
                NameKind::Alias => write!(f, "an alias named `{name}` already exists"),
                NameKind::PublicId => {
                    write!(f, "a document with public id `{name}` already exists")
                }
            },
            Self::AliasNotFound { name } => write!(f, "alias `{name}` not found"),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::PrimaryRemovalForbidden { name } => write!(
                f,
                "alias `{name}` is the primary alias and cannot be removed while other aliases exist"
            ),
            Self::InvariantViolation(details) => write!(f, "identity invariant violated: {details}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AliasServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for AliasServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DocumentNotFound(public_id) => Self::DocumentNotFound(public_id),
            RepoError::AliasNotFound { name, .. } => Self::AliasNotFound { name },
            RepoError::PrimaryAliasNotSole { name, .. } => Self::PrimaryRemovalForbidden { name },
            RepoError::NameTaken(name) => Self::AlreadyExists {
                name,
                conflict: NameKind::Alias,
            },
            RepoError::Validation(err) => Self::InvariantViolation(err.to_string()),
            RepoError::InvalidData(message) => Self::InvariantViolation(message),
            other => Self::Repo(other),
        }
    }
}
