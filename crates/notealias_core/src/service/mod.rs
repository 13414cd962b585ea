//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into alias and lookup use-cases.
//! - Translate storage failures into `AliasServiceError` kinds.

pub mod alias_service;
pub mod document_service;
pub mod error;
