//! Document identity model.
//!
//! # Responsibility
//! - Define the document/alias records shared by repositories and services.
//! - Expose the alias-set state machine and its invariant check.
//!
//! # Invariants
//! - `public_id` is immutable once assigned.
//! - A non-empty alias set has exactly one primary alias.
//! - Every alias points back at the document that holds it.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable handle of one alias record.
pub type AliasId = Uuid;

/// Human-chosen name that resolves to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub id: AliasId,
    /// Globally unique across alias names and public ids.
    pub name: String,
    pub primary: bool,
    /// Back reference by key only; the document owns the alias, not the reverse.
    pub document_public_id: String,
}

/// Document identity: one public id plus its ordered alias collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// System-generated identifier, see [`crate::model::public_id`].
    pub public_id: String,
    /// Insertion order. Position carries no priority; `primary` does.
    pub aliases: Vec<Alias>,
    /// Bumped by every alias mutation of this document.
    pub version: i64,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
}

/// Shape of a document alias set.
///
/// Alias operations only ever move a document between these states; every
/// other shape is an invariant violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasState {
    /// No aliases; the public id alone identifies the document.
    NoAlias,
    /// Exactly one alias, and it is primary.
    SinglePrimary,
    /// Two or more aliases, exactly one primary.
    MultiAlias,
}

/// Which half of the shared namespace a name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameKind {
    PublicId,
    Alias,
}

impl NameKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PublicId => "public_id",
            Self::Alias => "alias",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "public_id" => Some(Self::PublicId),
            "alias" => Some(Self::Alias),
            _ => None,
        }
    }
}

/// Transport-facing projection of one alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasView {
    pub name: String,
    pub primary: bool,
    /// Public id of the document the alias resolves to.
    pub public_id: String,
}

/// Invariant failures detected on a document read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentValidationError {
    EmptyPublicId,
    /// Aliases exist but none is primary.
    MissingPrimary { public_id: String },
    MultiplePrimaries { public_id: String, count: usize },
    /// Alias back reference points elsewhere.
    ForeignAlias { public_id: String, alias_id: AliasId },
    /// An alias shadows its own document's public id.
    AliasShadowsPublicId { public_id: String },
}

impl Display for DocumentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPublicId => write!(f, "document public_id must not be empty"),
            Self::MissingPrimary { public_id } => {
                write!(f, "document {public_id} has aliases but no primary alias")
            }
            Self::MultiplePrimaries { public_id, count } => {
                write!(f, "document {public_id} has {count} primary aliases")
            }
            Self::ForeignAlias {
                public_id,
                alias_id,
            } => write!(
                f,
                "alias {alias_id} listed under document {public_id} belongs to another document"
            ),
            Self::AliasShadowsPublicId { public_id } => {
                write!(f, "document {public_id} has an alias equal to its public_id")
            }
        }
    }
}

impl Error for DocumentValidationError {}

impl Alias {
    /// Creates an alias record with a fresh id.
    pub fn new(
        name: impl Into<String>,
        primary: bool,
        document_public_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            primary,
            document_public_id: document_public_id.into(),
        }
    }
}

impl Document {
    /// Primary alias, if the document has any aliases.
    pub fn primary_alias(&self) -> Option<&Alias> {
        self.aliases.iter().find(|alias| alias.primary)
    }

    /// Alias of this document with exactly `name`.
    pub fn alias(&self, name: &str) -> Option<&Alias> {
        self.aliases.iter().find(|alias| alias.name == name)
    }

    pub fn alias_names(&self) -> Vec<&str> {
        self.aliases.iter().map(|alias| alias.name.as_str()).collect()
    }

    /// Current state-machine position of the alias set.
    pub fn alias_state(&self) -> AliasState {
        match self.aliases.len() {
            0 => AliasState::NoAlias,
            1 => AliasState::SinglePrimary,
            _ => AliasState::MultiAlias,
        }
    }

    /// Checks the document-level identity invariants.
    pub fn validate(&self) -> Result<(), DocumentValidationError> {
        if self.public_id.trim().is_empty() {
            return Err(DocumentValidationError::EmptyPublicId);
        }

        for alias in &self.aliases {
            if alias.document_public_id != self.public_id {
                return Err(DocumentValidationError::ForeignAlias {
                    public_id: self.public_id.clone(),
                    alias_id: alias.id,
                });
            }
            if alias.name == self.public_id {
                return Err(DocumentValidationError::AliasShadowsPublicId {
                    public_id: self.public_id.clone(),
                });
            }
        }

        let primaries = self.aliases.iter().filter(|alias| alias.primary).count();
        match (self.aliases.is_empty(), primaries) {
            (true, _) | (false, 1) => Ok(()),
            (false, 0) => Err(DocumentValidationError::MissingPrimary {
                public_id: self.public_id.clone(),
            }),
            (false, count) => Err(DocumentValidationError::MultiplePrimaries {
                public_id: self.public_id.clone(),
                count,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Alias, AliasState, Document, DocumentValidationError};

    const PUBLIC_ID: &str = "w5trddy3zc1tj9mzs7b8rbbvfc";

    fn document(aliases: &[(&str, bool)]) -> Document {
        Document {
            public_id: PUBLIC_ID.to_string(),
            aliases: aliases
                .iter()
                .map(|(name, primary)| Alias::new(*name, *primary, PUBLIC_ID))
                .collect(),
            version: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn alias_state_follows_alias_count() {
        assert_eq!(document(&[]).alias_state(), AliasState::NoAlias);
        assert_eq!(
            document(&[("a", true)]).alias_state(),
            AliasState::SinglePrimary
        );
        assert_eq!(
            document(&[("a", true), ("b", false)]).alias_state(),
            AliasState::MultiAlias
        );
    }

    #[test]
    fn primary_alias_is_found_by_flag_not_position() {
        let doc = document(&[("a", false), ("b", true)]);
        assert_eq!(
            doc.primary_alias().map(|alias| alias.name.as_str()),
            Some("b")
        );
        assert!(doc.alias("a").is_some_and(|alias| !alias.primary));
        assert!(doc.alias("c").is_none());
    }

    #[test]
    fn validate_rejects_missing_and_duplicate_primaries() {
        assert!(document(&[]).validate().is_ok());
        assert!(document(&[("a", true), ("b", false)]).validate().is_ok());

        assert!(matches!(
            document(&[("a", false), ("b", false)]).validate(),
            Err(DocumentValidationError::MissingPrimary { .. })
        ));
        assert!(matches!(
            document(&[("a", true), ("b", true)]).validate(),
            Err(DocumentValidationError::MultiplePrimaries { count: 2, .. })
        ));
    }

    #[test]
    fn validate_rejects_foreign_back_reference() {
        let mut doc = document(&[("a", true)]);
        doc.aliases[0].document_public_id = "someone-else".to_string();
        assert!(matches!(
            doc.validate(),
            Err(DocumentValidationError::ForeignAlias { .. })
        ));
    }
}
