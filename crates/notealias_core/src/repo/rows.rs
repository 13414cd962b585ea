//! Shared SQL helpers for identity repositories.
//!
//! Helpers take `&Connection` so they run unchanged inside a `Transaction`.

use crate::model::document::{Alias, Document, NameKind};
use crate::repo::error::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const ALIAS_SELECT_SQL: &str = "SELECT
    id,
    name,
    document_public_id,
    is_primary
FROM aliases";

/// Columns whose uniqueness is the global identifier namespace.
const NAME_COLUMNS: &[&str] = &[
    "identifier_names.name",
    "aliases.name",
    "documents.public_id",
];

/// Runs several reads against one consistent snapshot.
pub(crate) fn with_read_snapshot<T>(
    conn: &Connection,
    read: impl FnOnce(&Connection) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Deferred)?;
    let value = read(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Loads one document with its aliases and checks its invariants.
pub(crate) fn load_document(conn: &Connection, public_id: &str) -> RepoResult<Option<Document>> {
    let header = conn
        .query_row(
            "SELECT public_id, version, created_at, updated_at
             FROM documents
             WHERE public_id = ?1;",
            [public_id],
            |row| {
                Ok(Document {
                    public_id: row.get("public_id")?,
                    aliases: Vec::new(),
                    version: row.get("version")?,
                    created_at: row.get("created_at")?,
                    updated_at: row.get("updated_at")?,
                })
            },
        )
        .optional()?;

    let Some(mut document) = header else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(&format!(
        "{ALIAS_SELECT_SQL}
         WHERE document_public_id = ?1
         ORDER BY position ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([public_id])?;
    while let Some(row) = rows.next()? {
        document.aliases.push(parse_alias_row(row)?);
    }

    document.validate()?;
    Ok(Some(document))
}

/// Like [`load_document`], but a missing row is `DocumentNotFound`.
pub(crate) fn load_required_document(conn: &Connection, public_id: &str) -> RepoResult<Document> {
    load_document(conn, public_id)?.ok_or_else(|| RepoError::DocumentNotFound(public_id.to_string()))
}

pub(crate) fn ensure_document_exists(conn: &Connection, public_id: &str) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM documents WHERE public_id = ?1);",
        [public_id],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::DocumentNotFound(public_id.to_string()))
    }
}

/// Finds an alias of any document by exact name.
pub(crate) fn find_alias(conn: &Connection, name: &str) -> RepoResult<Option<Alias>> {
    let mut stmt = conn.prepare(&format!("{ALIAS_SELECT_SQL} WHERE name = ?1;"))?;
    let mut rows = stmt.query([name])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_alias_row(row)?));
    }
    Ok(None)
}

/// Reports which namespace, if any, has claimed `name`.
pub(crate) fn name_claim(conn: &Connection, name: &str) -> RepoResult<Option<NameKind>> {
    let kind: Option<String> = conn
        .query_row(
            "SELECT kind FROM identifier_names WHERE name = ?1;",
            [name],
            |row| row.get(0),
        )
        .optional()?;

    kind.map(|value| {
        NameKind::parse(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid name kind `{value}` in identifier_names.kind"
            ))
        })
    })
    .transpose()
}

pub(crate) fn count_aliases(conn: &Connection, public_id: &str) -> RepoResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM aliases WHERE document_public_id = ?1;",
        [public_id],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

pub(crate) fn next_position(conn: &Connection, public_id: &str) -> RepoResult<i64> {
    let next = conn.query_row(
        "SELECT COALESCE(MAX(position), -1) + 1
         FROM aliases
         WHERE document_public_id = ?1;",
        [public_id],
        |row| row.get(0),
    )?;
    Ok(next)
}

/// Inserts one alias row. Name conflicts surface as `NameTaken`.
pub(crate) fn insert_alias(conn: &Connection, alias: &Alias, position: i64) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO aliases (
            id,
            name,
            document_public_id,
            is_primary,
            position
        ) VALUES (?1, ?2, ?3, ?4, ?5);",
        params![
            alias.id.to_string(),
            alias.name.as_str(),
            alias.document_public_id.as_str(),
            bool_to_int(alias.primary),
            position,
        ],
    )
    .map_err(|err| claim_error(err, &alias.name))?;
    Ok(())
}

/// Bumps the document version after an alias mutation.
pub(crate) fn touch_document(conn: &Connection, public_id: &str) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE documents
         SET version = version + 1,
             updated_at = CAST(ROUND((julianday('now') - 2440587.5) * 86400000) AS INTEGER)
         WHERE public_id = ?1;",
        [public_id],
    )?;
    if changed == 0 {
        return Err(RepoError::DocumentNotFound(public_id.to_string()));
    }
    Ok(())
}

/// Maps a uniqueness failure while claiming `name` to `NameTaken`.
///
/// Only the name-bearing columns count. Foreign key, CHECK and
/// single-primary index failures stay storage errors.
pub(crate) fn claim_error(err: rusqlite::Error, name: &str) -> RepoError {
    let err = RepoError::from(err);
    let name_clash = matches!(
        &err,
        RepoError::Db(db) if db
            .unique_violation_target()
            .is_some_and(|target| NAME_COLUMNS.contains(&target))
    );
    if name_clash {
        return RepoError::NameTaken(name.to_string());
    }
    err
}

fn parse_alias_row(row: &Row<'_>) -> RepoResult<Alias> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{id_text}` in aliases.id")))?;

    let primary = match row.get::<_, i64>("is_primary")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_primary value `{other}` in aliases.is_primary"
            )));
        }
    };

    Ok(Alias {
        id,
        name: row.get("name")?,
        primary,
        document_public_id: row.get("document_public_id")?,
    })
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
