//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for documents/aliases.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Read paths return only documents that pass `Document::validate()`.
//! - Repository APIs return semantic errors (`DocumentNotFound`,
//!   `AliasNotFound`, `NameTaken`, `PrimaryAliasNotSole`) in addition to DB
//!   transport errors.

pub mod alias_repo;
pub mod document_repo;
pub mod error;
mod rows;
mod schema;
