//! Alias repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Create, look up, delete and promote alias records.
//! - Keep every check that guards a write inside the write's transaction.
//!
//! # Invariants
//! - All mutations run under `BEGIN IMMEDIATE`, so concurrent writers on the
//!   same store are serialized.
//! - Alias names are claimed/released in `identifier_names` by triggers in
//!   the same statement that inserts/deletes the alias row.
//! - Mutations return the post-state document read inside their own
//!   transaction.
//! - A primary alias is only deleted when it is the document's sole alias.

use crate::model::document::{Alias, Document};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::rows::{
    count_aliases, ensure_document_exists, find_alias, insert_alias, load_required_document,
    name_claim, next_position, touch_document,
};
use crate::repo::schema::ensure_identity_schema;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Repository interface for alias lifecycle operations.
pub trait AliasRepository {
    /// Finds an alias of any document by exact name.
    fn find_alias_by_name(&self, name: &str) -> RepoResult<Option<Alias>>;
    /// Appends an alias; it becomes primary iff the document had no aliases.
    fn create_alias(&self, document_public_id: &str, name: &str) -> RepoResult<Document>;
    /// Deletes an alias of the document and releases its name.
    fn delete_alias(&self, document_public_id: &str, name: &str) -> RepoResult<Document>;
    /// Moves the primary flag to `name` in one step.
    ///
    /// No-op (no version bump) when `name` is already primary.
    fn promote_alias(&self, document_public_id: &str, name: &str) -> RepoResult<Document>;
}

/// SQLite-backed alias repository.
pub struct SqliteAliasRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAliasRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_identity_schema(conn)?;
        Ok(Self { conn })
    }
}

impl AliasRepository for SqliteAliasRepository<'_> {
    fn find_alias_by_name(&self, name: &str) -> RepoResult<Option<Alias>> {
        find_alias(self.conn, name)
    }

    fn create_alias(&self, document_public_id: &str, name: &str) -> RepoResult<Document> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_document_exists(&tx, document_public_id)?;

        if name_claim(&tx, name)?.is_some() {
            return Err(RepoError::NameTaken(name.to_string()));
        }

        // Decided from committed state, not from the caller's snapshot.
        let primary = count_aliases(&tx, document_public_id)? == 0;
        let position = next_position(&tx, document_public_id)?;
        insert_alias(&tx, &Alias::new(name, primary, document_public_id), position)?;
        touch_document(&tx, document_public_id)?;

        let document = load_required_document(&tx, document_public_id)?;
        tx.commit()?;
        Ok(document)
    }

    fn delete_alias(&self, document_public_id: &str, name: &str) -> RepoResult<Document> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_document_exists(&tx, document_public_id)?;

        let alias = owned_alias(&tx, document_public_id, name)?;
        let alias_count = count_aliases(&tx, document_public_id)?;
        if alias.primary && alias_count > 1 {
            return Err(RepoError::PrimaryAliasNotSole {
                public_id: document_public_id.to_string(),
                name: name.to_string(),
                alias_count,
            });
        }

        tx.execute("DELETE FROM aliases WHERE id = ?1;", [alias.id.to_string()])?;
        touch_document(&tx, document_public_id)?;

        let document = load_required_document(&tx, document_public_id)?;
        tx.commit()?;
        Ok(document)
    }

    fn promote_alias(&self, document_public_id: &str, name: &str) -> RepoResult<Document> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_document_exists(&tx, document_public_id)?;

        let target = owned_alias(&tx, document_public_id, name)?;
        if !target.primary {
            // Clear first: the partial unique index allows one primary per document.
            tx.execute(
                "UPDATE aliases
                 SET is_primary = 0
                 WHERE document_public_id = ?1
                   AND is_primary = 1;",
                [document_public_id],
            )?;
            tx.execute(
                "UPDATE aliases SET is_primary = 1 WHERE id = ?1;",
                [target.id.to_string()],
            )?;
            touch_document(&tx, document_public_id)?;
        }

        let document = load_required_document(&tx, document_public_id)?;
        tx.commit()?;
        Ok(document)
    }
}

fn owned_alias(conn: &Connection, document_public_id: &str, name: &str) -> RepoResult<Alias> {
    find_alias(conn, name)?
        .filter(|alias| alias.document_public_id == document_public_id)
        .ok_or_else(|| RepoError::AliasNotFound {
            public_id: document_public_id.to_string(),
            name: name.to_string(),
        })
}
