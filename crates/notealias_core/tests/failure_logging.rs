//! Internal failures on read paths reach the log without alias names.

use log::{Level, LevelFilter, Log, Metadata, Record};
use notealias_core::db::open_db_in_memory;
use notealias_core::{
    AliasErrorKind, AliasService, DocumentService, ReservedNames, SqliteAliasRepository,
    SqliteDocumentRepository,
};
use std::sync::{Mutex, Once};

struct CapturingLogger {
    records: Mutex<Vec<(Level, String)>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.records
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    records: Mutex::new(Vec::new()),
};
static INSTALL: Once = Once::new();

fn capture_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Error-level messages for `event`. Tests in this file run concurrently, so
/// callers filter by something unique to their own scenario.
fn errors_for(event: &str) -> Vec<String> {
    let needle = format!("event={event} ");
    LOGGER
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, message)| *level == Level::Error && message.contains(&needle))
        .map(|(_, message)| message.clone())
        .collect()
}

#[test]
fn resolve_logs_corrupted_primary_state_without_the_alias() {
    capture_logs();
    let conn = open_db_in_memory().unwrap();
    let documents = DocumentService::new(
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        ReservedNames::default(),
    );
    documents.create_document(Some("quarterly-plan")).unwrap();
    conn.execute("UPDATE aliases SET is_primary = 0;", []).unwrap();

    let err = documents.resolve("quarterly-plan").unwrap_err();
    assert_eq!(err.kind(), AliasErrorKind::Internal);

    let logged = errors_for("document_resolve");
    let line = logged
        .iter()
        .find(|message| message.contains("name_len=14"))
        .unwrap_or_else(|| panic!("no error record for the failed resolve: {logged:?}"));
    assert!(line.contains("status=error"));
    assert!(!line.contains("quarterly-plan"));
}

#[test]
fn alias_view_logs_unreadable_alias_rows_without_names() {
    capture_logs();
    let conn = open_db_in_memory().unwrap();
    let documents = DocumentService::new(
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        ReservedNames::default(),
    );
    let aliases = AliasService::new(
        SqliteAliasRepository::try_new(&conn).unwrap(),
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        ReservedNames::default(),
    );
    let document = documents.create_document(Some("home")).unwrap();
    conn.execute(
        "INSERT INTO aliases (id, name, document_public_id, is_primary, position)
         VALUES ('not-a-uuid', 'garden-journal', ?1, 0, 1);",
        [document.public_id.as_str()],
    )
    .unwrap();

    let err = aliases.to_alias_view("garden-journal", &document).unwrap_err();
    assert_eq!(err.kind(), AliasErrorKind::Internal);

    let logged = errors_for("alias_view");
    let line = logged
        .iter()
        .find(|message| message.contains(&document.public_id))
        .unwrap_or_else(|| panic!("no error record for the failed view: {logged:?}"));
    assert!(line.contains("name_len=14"));
    assert!(!line.contains("garden-journal"));
    assert!(!line.contains("not-a-uuid"));
}

#[test]
fn missing_alias_is_logged_as_a_rejection() {
    capture_logs();
    let conn = open_db_in_memory().unwrap();
    let documents = DocumentService::new(
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        ReservedNames::default(),
    );
    let aliases = AliasService::new(
        SqliteAliasRepository::try_new(&conn).unwrap(),
        SqliteDocumentRepository::try_new(&conn).unwrap(),
        ReservedNames::default(),
    );
    let document = documents.create_document(None).unwrap();

    let err = aliases.to_alias_view("absent", &document).unwrap_err();
    assert_eq!(err.kind(), AliasErrorKind::NotFound);

    assert!(!errors_for("alias_view")
        .iter()
        .any(|message| message.contains(&document.public_id)));
    let records = LOGGER.records.lock().unwrap();
    assert!(records.iter().any(|(level, message)| {
        *level == Level::Info
            && message.contains("event=alias_view")
            && message.contains("status=rejected")
            && message.contains(&document.public_id)
    }));
}
