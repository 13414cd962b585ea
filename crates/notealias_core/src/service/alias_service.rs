//! Alias management use-cases.
//!
//! # Responsibility
//! - Validate candidate alias names against reserved names and the global
//!   identifier namespace.
//! - Add, remove and promote aliases, returning the post-state document.
//! - Project aliases into transport-facing views.
//!
//! # Invariants
//! - Validation order is blank, reserved, alias clash, public id clash; the
//!   first failure wins.
//! - The primary decision and the sole-alias check are made by the store
//!   inside the mutating transaction, never from the caller's snapshot.
//! - Alias names are logged only as lengths.

use crate::config::ReservedNames;
use crate::logging::redact_names;
use crate::model::document::{AliasView, Document, NameKind};
use crate::repo::alias_repo::AliasRepository;
use crate::repo::document_repo::DocumentRepository;
use crate::repo::error::RepoError;
use crate::service::error::{AliasErrorKind, AliasServiceError};
use log::{error, info, warn};
use std::thread;
use std::time::Duration;

/// Total promotion attempts before a lock conflict is surfaced.
pub const PROMOTE_MAX_ATTEMPTS: u32 = 3;
const PROMOTE_RETRY_BACKOFF: Duration = Duration::from_millis(25);

/// Alias service facade over alias and document repositories.
pub struct AliasService<A: AliasRepository, D: DocumentRepository> {
    aliases: A,
    documents: D,
    reserved: ReservedNames,
}

impl<A: AliasRepository, D: DocumentRepository> AliasService<A, D> {
    pub fn new(aliases: A, documents: D, reserved: ReservedNames) -> Self {
        Self {
            aliases,
            documents,
            reserved,
        }
    }

    /// Adds `name` to `document`. The first alias of a document is primary.
    pub fn add_alias(
        &self,
        document: &Document,
        name: &str,
    ) -> Result<Document, AliasServiceError> {
        self.check_new_alias(name)
            .and_then(|()| {
                self.aliases
                    .create_alias(&document.public_id, name)
                    .map_err(|err| self.claim_failure(name, err))
            })
            .map(|updated| {
                info!(
                    "event=alias_add module=service status=ok public_id={} name_len={} primary={}",
                    updated.public_id,
                    name.len(),
                    updated.primary_alias().is_some_and(|alias| alias.name == name)
                );
                updated
            })
            .map_err(|err| log_failure("alias_add", &document.public_id, name, err))
    }

    /// Removes `name` from `document`.
    ///
    /// The primary alias can only be removed when it is the sole alias.
    pub fn remove_alias(
        &self,
        document: &Document,
        name: &str,
    ) -> Result<Document, AliasServiceError> {
        self.aliases
            .delete_alias(&document.public_id, name)
            .map(|updated| {
                info!(
                    "event=alias_remove module=service status=ok public_id={} name_len={} remaining={}",
                    updated.public_id,
                    name.len(),
                    updated.aliases.len()
                );
                updated
            })
            .map_err(|err| log_failure("alias_remove", &document.public_id, name, err.into()))
    }

    /// Makes `name` the primary alias of `document`.
    ///
    /// Promoting the current primary is a no-op that returns current state.
    /// Lock conflicts are retried; after [`PROMOTE_MAX_ATTEMPTS`] they become
    /// `InvariantViolation`.
    pub fn make_alias_primary(
        &self,
        document: &Document,
        name: &str,
    ) -> Result<Document, AliasServiceError> {
        let mut attempt = 1;
        let result = loop {
            match self.aliases.promote_alias(&document.public_id, name) {
                Ok(updated) => break Ok(updated),
                Err(err) if err.is_busy() && attempt < PROMOTE_MAX_ATTEMPTS => {
                    warn!(
                        "event=alias_promote module=service status=retry public_id={} attempt={}",
                        document.public_id, attempt
                    );
                    thread::sleep(PROMOTE_RETRY_BACKOFF * attempt);
                    attempt += 1;
                }
                Err(err) if err.is_busy() => {
                    break Err(AliasServiceError::InvariantViolation(format!(
                        "primary alias update for document {} still conflicting after {attempt} attempts: {err}",
                        document.public_id
                    )));
                }
                Err(err) => break Err(err.into()),
            }
        };

        result
            .map(|updated| {
                info!(
                    "event=alias_promote module=service status=ok public_id={} name_len={} version={}",
                    updated.public_id,
                    name.len(),
                    updated.version
                );
                updated
            })
            .map_err(|err| log_failure("alias_promote", &document.public_id, name, err))
    }

    /// Projects alias `name` for transport, reporting `document`'s public id.
    pub fn to_alias_view(
        &self,
        name: &str,
        document: &Document,
    ) -> Result<AliasView, AliasServiceError> {
        self.aliases
            .find_alias_by_name(name)
            .map_err(AliasServiceError::from)
            .and_then(|found| {
                found.ok_or_else(|| AliasServiceError::AliasNotFound {
                    name: name.to_string(),
                })
            })
            .map(|alias| AliasView {
                name: alias.name,
                primary: alias.primary,
                public_id: document.public_id.clone(),
            })
            .map_err(|err| log_failure("alias_view", &document.public_id, name, err))
    }

    fn check_new_alias(&self, name: &str) -> Result<(), AliasServiceError> {
        check_alias_name(name, &self.reserved)?;

        if self.aliases.find_alias_by_name(name)?.is_some() {
            return Err(already_exists(name, NameKind::Alias));
        }
        if self.documents.find_by_public_id(name)?.is_some() {
            return Err(already_exists(name, NameKind::PublicId));
        }
        Ok(())
    }

    /// Resolves which namespace won a uniqueness race on `name`.
    fn claim_failure(&self, name: &str, err: RepoError) -> AliasServiceError {
        if !matches!(err, RepoError::NameTaken(_)) {
            return err.into();
        }
        match self.aliases.find_alias_by_name(name) {
            Ok(Some(_)) => already_exists(name, NameKind::Alias),
            Ok(None) => already_exists(name, NameKind::PublicId),
            Err(lookup_err) => lookup_err.into(),
        }
    }
}

/// Rejects blank and reserved alias names.
pub(crate) fn check_alias_name(
    name: &str,
    reserved: &ReservedNames,
) -> Result<(), AliasServiceError> {
    if name.trim().is_empty() {
        return Err(AliasServiceError::InvalidName);
    }
    if reserved.contains(name) {
        return Err(AliasServiceError::ForbiddenName(name.to_string()));
    }
    Ok(())
}

pub(crate) fn already_exists(name: &str, conflict: NameKind) -> AliasServiceError {
    AliasServiceError::AlreadyExists {
        name: name.to_string(),
        conflict,
    }
}

pub(crate) fn log_failure(
    event: &'static str,
    public_id: &str,
    name: &str,
    err: AliasServiceError,
) -> AliasServiceError {
    match &err {
        internal if internal.kind() == AliasErrorKind::Internal => error!(
            "event={event} module=service status=error public_id={public_id} name_len={} error={}",
            name.len(),
            redact_names(&internal.to_string())
        ),
        AliasServiceError::AlreadyExists { conflict, .. } => info!(
            "event={event} module=service status=rejected public_id={public_id} name_len={} kind=AlreadyExists conflict={}",
            name.len(),
            conflict.as_str()
        ),
        rejected => info!(
            "event={event} module=service status=rejected public_id={public_id} name_len={} kind={:?}",
            name.len(),
            rejected.kind()
        ),
    }
    err
}
