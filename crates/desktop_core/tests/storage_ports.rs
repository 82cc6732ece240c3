use desktop_core::{
    open_storage, DesktopItem, ItemKind, MemoryItemStore, Position, SqliteItemStore,
    StorageBackend, StoragePort,
};
use serde_json::json;
use std::sync::Arc;

fn item(id: &str, owner: &str, created_at: i64) -> DesktopItem {
    let mut item = DesktopItem::with_id(
        id,
        owner,
        ItemKind::Note,
        format!("note {id}"),
        Position::new(1.0, 1.0),
        json!("body"),
    );
    item.created_at = created_at;
    item.updated_at = created_at;
    item
}

fn backends() -> Vec<Arc<dyn StoragePort>> {
    vec![
        Arc::new(MemoryItemStore::new()),
        Arc::new(SqliteItemStore::open_in_memory().unwrap()),
    ]
}

#[tokio::test]
async fn delete_with_wrong_owner_keeps_the_item() {
    for store in backends() {
        let backend = store.backend_name();
        store.save(&item("x", "alice", 1)).await.unwrap();

        assert!(
            !store.delete("x", "bob").await.unwrap(),
            "{backend}: cross-owner delete must fail"
        );
        let alice = store.load_all("alice").await.unwrap();
        assert_eq!(alice.len(), 1, "{backend}");
        assert_eq!(alice[0].id, "x");

        assert!(store.delete("x", "alice").await.unwrap(), "{backend}");
        assert!(store.load_all("alice").await.unwrap().is_empty(), "{backend}");
    }
}

#[tokio::test]
async fn delete_of_missing_item_returns_false() {
    for store in backends() {
        assert!(!store.delete("ghost", "alice").await.unwrap());
    }
}

#[tokio::test]
async fn saving_same_item_twice_keeps_one_record() {
    for store in backends() {
        let backend = store.backend_name();
        let note = item("dup", "alice", 5);
        store.save(&note).await.unwrap();
        store.save(&note).await.unwrap();

        let mut changed = note.clone();
        changed.title = "renamed".to_string();
        store.save(&changed).await.unwrap();

        let loaded = store.load_all("alice").await.unwrap();
        assert_eq!(loaded.len(), 1, "{backend}: save must upsert");
        assert_eq!(loaded[0].title, "renamed", "{backend}");
    }
}

#[tokio::test]
async fn load_all_is_scoped_and_sorted_newest_first() {
    for store in backends() {
        let backend = store.backend_name();
        store.save(&item("old", "alice", 100)).await.unwrap();
        store.save(&item("new", "alice", 300)).await.unwrap();
        store.save(&item("mid", "alice", 200)).await.unwrap();
        store.save(&item("other", "bob", 400)).await.unwrap();

        let ids = store
            .load_all("alice")
            .await
            .unwrap()
            .into_iter()
            .map(|item| item.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["new", "mid", "old"], "{backend}");
        assert!(store.load_all("carol").await.unwrap().is_empty(), "{backend}");
    }
}

#[tokio::test]
async fn invalid_items_are_rejected_by_every_backend() {
    for store in backends() {
        let mut bad = item("bad", "alice", 10);
        bad.updated_at = 5;
        assert!(store.save(&bad).await.is_err(), "{}", store.backend_name());
        assert!(store.load_all("alice").await.unwrap().is_empty());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_store_serializes_concurrent_writers() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SqliteItemStore::open(dir.path().join("desktop.db")).unwrap());

    let mut handles = Vec::new();
    for index in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .save(&item(&format!("item-{index}"), "alice", index))
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.load_all("alice").await.unwrap().len(), 32);
}

#[tokio::test]
async fn sqlite_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desktop.db");

    {
        let store = SqliteItemStore::open(&path).unwrap();
        let mut table = item("t1", "alice", 42);
        table.kind = ItemKind::Table;
        table.content = json!([["Name", "Age"], ["Bob", "25"]]);
        store.save(&table).await.unwrap();
    }

    let reopened = open_storage(&StorageBackend::Sqlite { path }).unwrap();
    assert_eq!(reopened.backend_name(), "sqlite");
    let loaded = reopened.load_all("alice").await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].kind, ItemKind::Table);
    assert_eq!(loaded[0].content, json!([["Name", "Age"], ["Bob", "25"]]));
}
