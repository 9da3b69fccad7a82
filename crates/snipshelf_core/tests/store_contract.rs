use snipshelf_core::config::StorageConfig;
use snipshelf_core::db::{open_db_in_memory, DbHandle};
use snipshelf_core::{
    ContentBlock, Group, Snippet, SnippetCategory, SqliteStore, Store, StoreError,
    StoreErrorKind,
};
use std::sync::Arc;

fn connected_handle() -> DbHandle {
    DbHandle::connected(open_db_in_memory(&StorageConfig::in_memory()).unwrap())
}

fn group_store(handle: &DbHandle) -> SqliteStore<Group> {
    SqliteStore::new(handle.clone())
}

fn category_store(handle: &DbHandle) -> SqliteStore<SnippetCategory> {
    SqliteStore::new(handle.clone())
}

fn snippet(id: &str, name: &str, line: &str) -> Snippet {
    Snippet {
        id: id.to_string(),
        group: "Common".to_string(),
        name: name.to_string(),
        content: vec![ContentBlock::new(line)],
    }
}

#[tokio::test]
async fn add_then_find_all_returns_seed_then_new_group() {
    let handle = connected_handle();
    let groups = group_store(&handle);

    let added = groups.add(Group::new("Work")).await.unwrap();
    assert_eq!(added, Group::new("Work"));

    let all = groups.find_all().await.unwrap();
    assert_eq!(all, vec![Group::new("Common"), Group::new("Work")]);
}

#[tokio::test]
async fn duplicate_add_fails_and_keeps_first_version() {
    let handle = connected_handle();
    let categories = category_store(&handle);

    let mut first = SnippetCategory::new("Shell");
    first.snippets.push(snippet("1", "hi", "echo hi"));
    categories.add(first.clone()).await.unwrap();

    let err = categories
        .add(SnippetCategory::new("Shell"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), StoreErrorKind::DuplicateKey);
    assert!(matches!(err, StoreError::DuplicateKey { ref key, .. } if key == "Shell"));

    assert_eq!(categories.find_all().await.unwrap(), vec![first]);
}

#[tokio::test]
async fn round_trip_preserves_nested_snippets_and_expand_flag() {
    let handle = connected_handle();
    let categories = category_store(&handle);

    let mut category = SnippetCategory::new("Docker");
    category.expand = Some(true);
    category.snippets.push(Snippet {
        content: vec![ContentBlock::new("docker ps"), ContentBlock::new("docker ps -a")],
        ..snippet("1700000000000", "ps", "")
    });
    categories.add(category.clone()).await.unwrap();

    let loaded = categories.find_by_key("Docker").await.unwrap();
    assert_eq!(loaded, Some(category));
}

#[tokio::test]
async fn find_by_missing_key_is_absent_not_error() {
    let handle = connected_handle();
    assert_eq!(group_store(&handle).find_by_key("Nope").await.unwrap(), None);
}

#[tokio::test]
async fn update_replaces_document_in_place() {
    let handle = connected_handle();
    let categories = category_store(&handle);
    categories.add(SnippetCategory::new("A")).await.unwrap();
    categories.add(SnippetCategory::new("B")).await.unwrap();

    let mut replacement = SnippetCategory::new("A");
    replacement.expand = Some(false);
    categories.update(replacement.clone()).await.unwrap();

    let names: Vec<_> = categories
        .find_all()
        .await
        .unwrap()
        .into_iter()
        .map(|category| (category.name, category.expand))
        .collect();
    assert_eq!(
        names,
        vec![("A".to_string(), Some(false)), ("B".to_string(), None)]
    );
}

#[tokio::test]
async fn find_one_and_update_appends_snippet() {
    let handle = connected_handle();
    let categories = category_store(&handle);
    categories
        .add(SnippetCategory::new("Snippets1"))
        .await
        .unwrap();

    let updated = categories
        .find_one_and_update("Snippets1", |mut doc| {
            doc.snippets.push(snippet("1", "s1", "echo hi"));
            doc
        })
        .await
        .unwrap();

    assert_eq!(updated.snippets.len(), 1);
    assert_eq!(updated.snippets[0].id, "1");
    assert_eq!(
        categories.find_by_key("Snippets1").await.unwrap(),
        Some(updated)
    );
}

#[tokio::test]
async fn find_one_and_update_on_missing_key_is_not_found_and_writes_nothing() {
    let handle = connected_handle();
    let categories = category_store(&handle);

    let err = categories
        .find_one_and_update("Ghost", |doc| doc)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), StoreErrorKind::NotFound);
    assert!(categories.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn find_one_and_update_rejects_key_change() {
    let handle = connected_handle();
    let categories = category_store(&handle);
    categories.add(SnippetCategory::new("Old")).await.unwrap();

    let err = categories
        .find_one_and_update("Old", |mut doc| {
            doc.name = "New".to_string();
            doc
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::KeyMismatch { .. }));
    assert_eq!(
        categories.find_all().await.unwrap(),
        vec![SnippetCategory::new("Old")]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_read_modify_writes_on_one_key_do_not_lose_updates() {
    let handle = connected_handle();
    let categories = Arc::new(category_store(&handle));
    categories.add(SnippetCategory::new("Hot")).await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let categories = Arc::clone(&categories);
            tokio::spawn(async move {
                categories
                    .find_one_and_update("Hot", move |mut doc| {
                        doc.snippets.push(snippet(&i.to_string(), "s", "x"));
                        doc
                    })
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let hot = categories.find_by_key("Hot").await.unwrap().unwrap();
    assert_eq!(hot.snippets.len(), 16);
}

#[tokio::test]
async fn delete_returns_key_and_removes_document() {
    let handle = connected_handle();
    let groups = group_store(&handle);
    groups.add(Group::new("Work")).await.unwrap();

    assert_eq!(groups.delete("Work").await.unwrap(), "Work");
    assert_eq!(groups.find_by_key("Work").await.unwrap(), None);
    assert_eq!(groups.delete("Work").await.unwrap(), "Work");
}

#[tokio::test]
async fn every_operation_fails_fast_without_a_connection() {
    let handle = DbHandle::new();
    let groups = group_store(&handle);

    let errors = vec![
        groups.add(Group::new("Work")).await.unwrap_err(),
        groups.find_all().await.unwrap_err(),
        groups.find_by_key("Work").await.unwrap_err(),
        groups.update(Group::new("Work")).await.unwrap_err(),
        groups
            .find_one_and_update("Work", |doc| doc)
            .await
            .unwrap_err(),
        groups.delete("Work").await.unwrap_err(),
    ];

    for err in errors {
        assert_eq!(err.kind(), StoreErrorKind::NotConnected);
    }
}

#[tokio::test]
async fn stores_built_before_attach_work_after_attach() {
    let handle = DbHandle::new();
    let groups = group_store(&handle);
    assert!(groups.find_all().await.is_err());

    handle.attach(open_db_in_memory(&StorageConfig::in_memory()).unwrap());
    assert_eq!(groups.find_all().await.unwrap(), vec![Group::new("Common")]);
}
