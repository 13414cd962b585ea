//! Document lookup and creation use-cases.
//!
//! # Responsibility
//! - Resolve a public id or alias to its document.
//! - Create documents with a freshly generated public id.
//!
//! # Invariants
//! - Public ids take precedence over aliases during resolution.
//! - A generated public id that collides with an existing name is replaced,
//!   never reused.

use crate::config::ReservedNames;
use crate::model::document::{Document, NameKind};
use crate::model::public_id::generate_public_id;
use crate::repo::document_repo::DocumentRepository;
use crate::repo::error::RepoError;
use crate::service::alias_service::{already_exists, check_alias_name, log_failure};
use crate::service::error::AliasServiceError;
use log::{info, warn};

/// Total public id draws before creation gives up.
pub const CREATE_MAX_ATTEMPTS: u32 = 3;

/// Document service facade over a document repository.
pub struct DocumentService<D: DocumentRepository> {
    repo: D,
    reserved: ReservedNames,
}

impl<D: DocumentRepository> DocumentService<D> {
    pub fn new(repo: D, reserved: ReservedNames) -> Self {
        Self { repo, reserved }
    }

    /// Resolves a public id or alias to its document.
    pub fn resolve(&self, id_or_alias: &str) -> Result<Document, AliasServiceError> {
        self.lookup(id_or_alias)
            .map_err(|err| log_failure("document_resolve", "-", id_or_alias, err))
    }

    fn lookup(&self, id_or_alias: &str) -> Result<Document, AliasServiceError> {
        if let Some(document) = self.repo.find_by_public_id(id_or_alias)? {
            return Ok(document);
        }
        if let Some(document) = self.repo.find_by_alias(id_or_alias)? {
            return Ok(document);
        }
        Err(AliasServiceError::DocumentNotFound(id_or_alias.to_string()))
    }

    /// Creates a document, optionally with its first (primary) alias.
    pub fn create_document(
        &self,
        initial_alias: Option<&str>,
    ) -> Result<Document, AliasServiceError> {
        self.create_with_ids(initial_alias, generate_public_id)
    }

    fn create_with_ids(
        &self,
        initial_alias: Option<&str>,
        mut next_public_id: impl FnMut() -> String,
    ) -> Result<Document, AliasServiceError> {
        if let Some(name) = initial_alias {
            self.check_initial_alias(name)
                .map_err(|err| log_failure("document_create", "-", name, err))?;
        }

        for attempt in 1..=CREATE_MAX_ATTEMPTS {
            let public_id = next_public_id();
            match self.repo.create_document(&public_id, initial_alias) {
                Ok(document) => {
                    info!(
                        "event=document_create module=service status=ok public_id={} aliases={}",
                        document.public_id,
                        document.aliases.len()
                    );
                    return Ok(document);
                }
                Err(RepoError::NameTaken(name)) if name == public_id => {
                    warn!(
                        "event=document_create module=service status=retry reason=public_id_collision attempt={attempt}"
                    );
                }
                Err(RepoError::NameTaken(name)) => {
                    let conflict = match self.repo.find_by_public_id(&name)? {
                        Some(_) => NameKind::PublicId,
                        None => NameKind::Alias,
                    };
                    return Err(log_failure(
                        "document_create",
                        &public_id,
                        &name,
                        already_exists(&name, conflict),
                    ));
                }
                Err(err) => {
                    return Err(log_failure(
                        "document_create",
                        &public_id,
                        initial_alias.unwrap_or_default(),
                        err.into(),
                    ));
                }
            }
        }

        Err(log_failure(
            "document_create",
            "-",
            initial_alias.unwrap_or_default(),
            AliasServiceError::InvariantViolation(format!(
                "generated public ids collided {CREATE_MAX_ATTEMPTS} times"
            )),
        ))
    }

    fn check_initial_alias(&self, name: &str) -> Result<(), AliasServiceError> {
        check_alias_name(name, &self.reserved)?;

        if self.repo.find_by_alias(name)?.is_some() {
            return Err(already_exists(name, NameKind::Alias));
        }
        if self.repo.find_by_public_id(name)?.is_some() {
            return Err(already_exists(name, NameKind::PublicId));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DocumentService, CREATE_MAX_ATTEMPTS};
    use crate::config::ReservedNames;
    use crate::model::document::{Alias, Document};
    use crate::repo::document_repo::DocumentRepository;
    use crate::repo::error::{RepoError, RepoResult};
    use crate::service::error::AliasServiceError;
    use std::cell::RefCell;

    const TAKEN_ID: &str = "00000000000000000000000000";
    const FREE_ID: &str = "w5trddy3zc1tj9mzs7b8rbbvfc";

    /// Store that already holds one document under `TAKEN_ID`.
    struct OneDocument {
        attempted_ids: RefCell<Vec<String>>,
    }

    impl DocumentRepository for OneDocument {
        fn create_document(
            &self,
            public_id: &str,
            initial_alias: Option<&str>,
        ) -> RepoResult<Document> {
            self.attempted_ids.borrow_mut().push(public_id.to_string());
            if public_id == TAKEN_ID {
                return Err(RepoError::NameTaken(public_id.to_string()));
            }
            Ok(Document {
                public_id: public_id.to_string(),
                aliases: initial_alias
                    .map(|name| vec![Alias::new(name, true, public_id)])
                    .unwrap_or_default(),
                version: 1,
                created_at: 0,
                updated_at: 0,
            })
        }

        fn find_by_public_id(&self, _public_id: &str) -> RepoResult<Option<Document>> {
            Ok(None)
        }

        fn find_by_alias(&self, _name: &str) -> RepoResult<Option<Document>> {
            Ok(None)
        }
    }

    fn service() -> DocumentService<OneDocument> {
        DocumentService::new(
            OneDocument {
                attempted_ids: RefCell::new(Vec::new()),
            },
            ReservedNames::new(["new"]),
        )
    }

    #[test]
    fn colliding_public_id_is_regenerated() {
        let service = service();
        let mut ids = [TAKEN_ID, FREE_ID].into_iter();
        let document = service
            .create_with_ids(Some("meeting"), || {
                ids.next().unwrap_or(FREE_ID).to_string()
            })
            .expect("second id should be accepted");

        assert_eq!(document.public_id, FREE_ID);
        assert_eq!(
            document.primary_alias().map(|alias| alias.name.as_str()),
            Some("meeting")
        );
        assert_eq!(
            *service.repo.attempted_ids.borrow(),
            vec![TAKEN_ID.to_string(), FREE_ID.to_string()]
        );
    }

    #[test]
    fn repeated_collisions_are_bounded() {
        let service = service();
        let err = service
            .create_with_ids(None, || TAKEN_ID.to_string())
            .expect_err("every id collides");

        assert!(matches!(err, AliasServiceError::InvariantViolation(_)));
        assert_eq!(
            service.repo.attempted_ids.borrow().len(),
            CREATE_MAX_ATTEMPTS as usize
        );
    }

    #[test]
    fn reserved_initial_alias_is_rejected_before_any_write() {
        let service = service();
        let err = service
            .create_document(Some("new"))
            .expect_err("reserved alias must fail");

        assert!(matches!(err, AliasServiceError::ForbiddenName(ref name) if name == "new"));
        assert!(service.repo.attempted_ids.borrow().is_empty());
    }
}
