//! Core identity logic for notes: public ids, aliases and lookup.
//! This crate is the single source of truth for naming invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CoreConfig, ReservedNames};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, init_logging_from_config};
pub use model::document::{Alias, AliasId, AliasState, AliasView, Document, NameKind};
pub use model::public_id::{encode_public_id, generate_public_id, is_public_id_shaped};
pub use repo::alias_repo::{AliasRepository, SqliteAliasRepository};
pub use repo::document_repo::{DocumentRepository, SqliteDocumentRepository};
pub use repo::error::{RepoError, RepoResult};
pub use service::alias_service::AliasService;
pub use service::document_service::DocumentService;
pub use service::error::{AliasErrorKind, AliasServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
