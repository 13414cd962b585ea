//! Document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create documents, optionally with their first (primary) alias.
//! - Load documents with their full alias collection by public id or alias.
//!
//! # Invariants
//! - Every returned document has passed `Document::validate()`.
//! - Document creation claims the public id and initial alias in one
//!   transaction; a collision leaves nothing behind.

use crate::model::document::{Alias, Document};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::rows::{
    claim_error, insert_alias, load_document, load_required_document, name_claim,
    with_read_snapshot,
};
use crate::repo::schema::ensure_identity_schema;
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Repository interface for document identity records.
pub trait DocumentRepository {
    /// Creates a document and, when given, its initial primary alias.
    ///
    /// Fails with `NameTaken` when either name is already claimed.
    fn create_document(
        &self,
        public_id: &str,
        initial_alias: Option<&str>,
    ) -> RepoResult<Document>;
    /// Loads a document by exact public id.
    fn find_by_public_id(&self, public_id: &str) -> RepoResult<Option<Document>>;
    /// Loads the document owning the alias with exactly `name`.
    fn find_by_alias(&self, name: &str) -> RepoResult<Option<Document>>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_identity_schema(conn)?;
        Ok(Self { conn })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn create_document(
        &self,
        public_id: &str,
        initial_alias: Option<&str>,
    ) -> RepoResult<Document> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if name_claim(&tx, public_id)?.is_some() {
            return Err(RepoError::NameTaken(public_id.to_string()));
        }
        if let Some(name) = initial_alias {
            if name == public_id || name_claim(&tx, name)?.is_some() {
                return Err(RepoError::NameTaken(name.to_string()));
            }
        }

        tx.execute("INSERT INTO documents (public_id) VALUES (?1);", [public_id])
            .map_err(|err| claim_error(err, public_id))?;

        if let Some(name) = initial_alias {
            insert_alias(&tx, &Alias::new(name, true, public_id), 0)?;
        }

        let document = load_required_document(&tx, public_id)?;
        tx.commit()?;
        Ok(document)
    }

    fn find_by_public_id(&self, public_id: &str) -> RepoResult<Option<Document>> {
        with_read_snapshot(self.conn, |conn| load_document(conn, public_id))
    }

    fn find_by_alias(&self, name: &str) -> RepoResult<Option<Document>> {
        with_read_snapshot(self.conn, |conn| {
            let owner: Option<String> = conn
                .query_row(
                    "SELECT document_public_id FROM aliases WHERE name = ?1;",
                    [name],
                    |row| row.get(0),
                )
                .optional()?;

            match owner {
                Some(public_id) => load_document(conn, &public_id),
                None => Ok(None),
            }
        })
    }
}
