//! Identity domain model for documents and aliases.
//!
//! # Responsibility
//! - Define canonical data structures used by alias business logic.
//! - Generate public identifiers for new documents.
//!
//! # Invariants
//! - Public ids and alias names share one global namespace.
//! - A document with aliases always has exactly one primary alias.

pub mod document;
pub mod public_id;
