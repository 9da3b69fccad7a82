use rusqlite::Connection;
use snipshelf_core::session::{BLOCKED_NOTICE, FAILED_NOTICE};
use snipshelf_core::{
    ConnectionState, Group, HandshakeError, ServiceError, Session, SnippetDraft, StorageConfig,
    StoreError,
};

#[tokio::test]
async fn services_are_unusable_before_connect() {
    let session = Session::new(StorageConfig::in_memory());
    assert_eq!(session.state(), &ConnectionState::Connecting);

    let err = session.groups().add_group("Work").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Store(StoreError::NotConnected { .. })
    ));
}

#[tokio::test]
async fn connect_loads_caches_and_becomes_ready() {
    let mut session = Session::new(StorageConfig::in_memory());
    session.connect().await.unwrap();

    assert!(session.is_ready());
    assert_eq!(*session.groups().groups(), vec![Group::new("Common")]);
    assert!(session.snippets().categories().is_empty());

    session.connect().await.unwrap();
}

#[tokio::test]
async fn file_backed_session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = StorageConfig::at_path(dir.path().join("snipshelf.sqlite3"));

    let mut first = Session::new(config.clone());
    first.connect().await.unwrap();
    first.snippets().add_category("Shell").await.unwrap();
    first
        .snippets()
        .save_snippet("Shell", SnippetDraft::new("Common", "hi", ["echo hi"]))
        .await
        .unwrap();
    drop(first);

    let mut second = Session::new(config);
    second.connect().await.unwrap();
    let shell = second.snippets().category("Shell").unwrap();
    assert_eq!(shell.snippets.len(), 1);
    assert_eq!(shell.snippets[0].content[0].value, "echo hi");
}

#[tokio::test]
async fn newer_schema_on_disk_blocks_session_permanently() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 42;").unwrap();
    drop(conn);

    let mut session = Session::new(StorageConfig::at_path(&path));
    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, HandshakeError::Blocked { .. }));
    assert_eq!(err.notice(), BLOCKED_NOTICE);
    assert!(matches!(session.state(), ConnectionState::Blocked(_)));

    // Fixing the file does not matter: the session does not reconnect.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 0;").unwrap();
    drop(conn);
    assert_eq!(session.connect().await.unwrap_err(), err);
}

#[tokio::test]
async fn unreadable_database_fails_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.sqlite3");
    std::fs::write(&path, vec![b'x'; 8192]).unwrap();

    let mut session = Session::new(StorageConfig::at_path(&path));
    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, HandshakeError::Failed { .. }));
    assert_eq!(err.notice(), FAILED_NOTICE);
    assert!(matches!(session.state(), ConnectionState::Failed(_)));
}

#[tokio::test]
async fn failed_initial_load_leaves_services_disconnected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt_doc.sqlite3");
    let config = StorageConfig::at_path(&path);

    let mut first = Session::new(config.clone());
    first.connect().await.unwrap();
    drop(first);
    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO snippet_categories (name, doc) VALUES ('Broken', 'not json')",
        [],
    )
    .unwrap();
    drop(conn);

    let mut session = Session::new(config);
    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, HandshakeError::Failed { .. }));

    let err = session.groups().add_group("AfterFailure").await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Store(StoreError::NotConnected { .. })
    ));
    assert!(session.groups().groups().is_empty());
}
