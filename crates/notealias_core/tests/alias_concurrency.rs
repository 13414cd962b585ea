//! Races between independent connections on one store file.

use notealias_core::db::open_db;
use notealias_core::{
    AliasErrorKind, AliasService, AliasState, Document, DocumentService, ReservedNames,
    SqliteAliasRepository, SqliteDocumentRepository,
};
use std::path::Path;
use std::sync::Barrier;
use std::thread;

const WORKERS: usize = 6;

fn with_alias_service<T>(
    path: &Path,
    op: impl FnOnce(&AliasService<SqliteAliasRepository<'_>, SqliteDocumentRepository<'_>>) -> T,
) -> T {
    let conn = open_db(path).unwrap();
    let service = AliasService::new(
        SqliteAliasRepository::try_new(&conn).unwrap(),
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        ReservedNames::default(),
    );
    op(&service)
}

fn create_document(path: &Path, initial_alias: Option<&str>) -> Document {
    let conn = open_db(path).unwrap();
    let service = DocumentService::new(
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        ReservedNames::default(),
    );
    service.create_document(initial_alias).unwrap()
}

fn reload(path: &Path, public_id: &str) -> Document {
    let conn = open_db(path).unwrap();
    let service = DocumentService::new(
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        ReservedNames::default(),
    );
    service.resolve(public_id).unwrap()
}

fn primary_count(document: &Document) -> usize {
    document.aliases.iter().filter(|alias| alias.primary).count()
}

#[test]
fn concurrent_adds_of_one_name_yield_exactly_one_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race-add.db");
    let documents: Vec<Document> = (0..WORKERS)
        .map(|_| create_document(&path, None))
        .collect();
    let barrier = Barrier::new(WORKERS);

    let outcomes: Vec<Result<Document, AliasErrorKind>> = thread::scope(|scope| {
        let handles: Vec<_> = documents
            .iter()
            .map(|document| {
                let (path, barrier) = (&path, &barrier);
                scope.spawn(move || {
                    with_alias_service(path, |service| {
                        barrier.wait();
                        service
                            .add_alias(document, "contested")
                            .map_err(|err| err.kind())
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<&Document> = outcomes.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "outcomes: {outcomes:?}");
    assert!(outcomes
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|kind| *kind == AliasErrorKind::AlreadyExists));

    let owner = reload(&path, "contested");
    assert_eq!(owner.public_id, winners[0].public_id);
    assert_eq!(owner.alias_state(), AliasState::SinglePrimary);
}

#[test]
fn concurrent_first_aliases_leave_exactly_one_primary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race-first.db");
    let document = create_document(&path, None);
    let barrier = Barrier::new(WORKERS);

    thread::scope(|scope| {
        for worker in 0..WORKERS {
            let (path, barrier, document) = (&path, &barrier, &document);
            scope.spawn(move || {
                with_alias_service(path, |service| {
                    barrier.wait();
                    service
                        .add_alias(document, &format!("first-{worker}"))
                        .unwrap();
                });
            });
        }
    });

    let reloaded = reload(&path, &document.public_id);
    assert_eq!(reloaded.aliases.len(), WORKERS);
    assert_eq!(primary_count(&reloaded), 1);
    assert_eq!(reloaded.version, WORKERS as i64);
}

#[test]
fn concurrent_promotions_never_leave_zero_or_two_primaries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race-promote.db");
    let seed = create_document(&path, Some("alias-0"));
    let document = with_alias_service(&path, |service| {
        let mut current = seed;
        for index in 1..WORKERS {
            current = service
                .add_alias(&current, &format!("alias-{index}"))
                .unwrap();
        }
        current
    });
    let barrier = Barrier::new(WORKERS);

    let results: Vec<Document> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WORKERS)
            .map(|index| {
                let (path, barrier, document) = (&path, &barrier, &document);
                scope.spawn(move || {
                    with_alias_service(path, |service| {
                        barrier.wait();
                        service
                            .make_alias_primary(document, &format!("alias-{index}"))
                            .unwrap()
                    })
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for post_state in &results {
        assert_eq!(primary_count(post_state), 1);
    }
    let reloaded = reload(&path, &document.public_id);
    assert_eq!(primary_count(&reloaded), 1);
    assert_eq!(reloaded.aliases.len(), WORKERS);
}

#[test]
fn racing_sole_primary_removal_and_add_keeps_invariant() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("race-remove.db");
    let document = create_document(&path, Some("solo"));
    let barrier = Barrier::new(2);

    let (removed, added) = thread::scope(|scope| {
        let remove = scope.spawn(|| {
            with_alias_service(&path, |service| {
                barrier.wait();
                service.remove_alias(&document, "solo").map_err(|err| err.kind())
            })
        });
        let add = scope.spawn(|| {
            with_alias_service(&path, |service| {
                barrier.wait();
                service.add_alias(&document, "extra").map_err(|err| err.kind())
            })
        });
        (remove.join().unwrap(), add.join().unwrap())
    });

    assert!(added.is_ok());
    let reloaded = reload(&path, &document.public_id);
    match removed {
        Ok(_) => {
            // Removal committed first; the later add became primary.
            assert_eq!(reloaded.alias_names(), vec!["extra"]);
            assert!(reloaded.aliases[0].primary);
        }
        Err(kind) => {
            assert_eq!(kind, AliasErrorKind::PrimaryRemovalForbidden);
            assert_eq!(reloaded.alias_names(), vec!["solo", "extra"]);
            assert!(reloaded.alias("solo").unwrap().primary);
        }
    }
    assert_eq!(primary_count(&reloaded), 1);
}
