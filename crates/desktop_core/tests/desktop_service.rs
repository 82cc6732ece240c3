use desktop_core::{
    CanvasState, DesktopConfig, DesktopEvent, DesktopService, EventBus, ItemKind,
    MemoryItemStore, MockAiProvider, PersistError, PipelineOptions, Position, ProviderChain,
    ServiceError, SqliteItemStore, StorageBackend, StoragePort, Viewport,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;

fn service_with(store: Arc<dyn StoragePort>, ai: ProviderChain) -> DesktopService {
    DesktopService::new(store, PipelineOptions::default(), ai, EventBus::default())
}

fn memory_service() -> DesktopService {
    let ai = ProviderChain::new(vec![Arc::new(MockAiProvider::default())]);
    service_with(Arc::new(MemoryItemStore::new()), ai)
}

fn event_names(rx: &mut Receiver<DesktopEvent>) -> Vec<&'static str> {
    let mut names = Vec::new();
    while let Ok(event) = rx.try_recv() {
        names.push(event.name());
    }
    names
}

#[tokio::test]
async fn created_items_become_loadable_after_flush() {
    let service = memory_service();

    let note = service
        .create_item(
            "alice",
            ItemKind::Note,
            "Test Note",
            Position::new(100.0, 100.0),
            Some(json!("This is a test note")),
        )
        .unwrap();
    let table = service
        .create_item(
            "alice",
            ItemKind::Table,
            "Defaults",
            Position::new(200.0, 200.0),
            None,
        )
        .unwrap();

    assert!(service.load_user_items("alice").await.unwrap().is_empty());
    service.force_flush().await;

    let loaded = service.load_user_items("alice").await.unwrap();
    assert_eq!(loaded.len(), 2);
    let stored_table = loaded.iter().find(|item| item.id == table.id).unwrap();
    assert_eq!(
        stored_table.content,
        json!([["ID", "Name"], ["1", "Placeholder"]])
    );
    assert!(loaded.iter().any(|item| item.id == note.id));
}

#[tokio::test]
async fn update_and_delete_publish_events() {
    let service = memory_service();
    let mut rx = service.events().subscribe();

    let mut item = service
        .create_item("alice", ItemKind::Code, "script", Position::new(0.0, 0.0), None)
        .unwrap();
    item.title = "renamed".to_string();
    service.update_item(item.clone()).unwrap();
    service.force_flush().await;

    assert!(!service.delete_item(&item.id, "mallory").await.unwrap());
    assert!(service.delete_item(&item.id, "alice").await.unwrap());

    assert_eq!(
        event_names(&mut rx),
        vec![
            "item_created",
            "item_updated",
            "flush_completed",
            "item_deleted"
        ]
    );
    assert!(service.load_user_items("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn update_event_carries_the_persisted_version() {
    let service = memory_service();
    let mut rx = service.events().subscribe();

    let mut item = service
        .create_item("alice", ItemKind::Note, "draft", Position::default(), None)
        .unwrap();
    item.title = "final".to_string();
    item.updated_at = item.created_at;
    let stamped = service.update_item(item).unwrap();
    service.force_flush().await;

    let mut published = None;
    while let Ok(event) = rx.try_recv() {
        if let DesktopEvent::ItemUpdated(updated) = event {
            published = Some(updated);
        }
    }
    let published = published.unwrap();
    let stored = service.load_user_items("alice").await.unwrap();

    assert_eq!(published, stamped);
    assert_eq!(stored, vec![stamped]);
}

#[tokio::test]
async fn ai_code_generation_creates_code_item() {
    let service = memory_service();
    let mut rx = service.events().subscribe();

    let item = service
        .generate_ai_content(
            "alice",
            "Create a Python class for vector operations",
            "code",
            Position::new(300.0, 300.0),
        )
        .await
        .unwrap();

    assert_eq!(item.kind, ItemKind::Code);
    assert!(item.title.starts_with("AI: Create a Python class"));
    assert!(item
        .content
        .as_str()
        .unwrap()
        .contains("vector operations"));
    assert_eq!(
        event_names(&mut rx),
        vec!["item_created", "ai_content_generated"]
    );
}

#[tokio::test]
async fn ai_content_kind_selects_item_kind() {
    let service = memory_service();

    let note = service
        .generate_ai_content("alice", "standup", "note", Position::default())
        .await
        .unwrap();
    let table = service
        .generate_ai_content("alice", "crm", "table", Position::default())
        .await
        .unwrap();
    let chart = service
        .generate_ai_content("alice", "q3", "chart", Position::default())
        .await
        .unwrap();

    assert_eq!(note.kind, ItemKind::Note);
    assert_eq!(table.kind, ItemKind::Table);
    assert_eq!(chart.kind, ItemKind::Table);
    assert_eq!(chart.content, json!("Generated chart: q3"));
}

#[tokio::test]
async fn ai_failure_surfaces_and_creates_nothing() {
    let ai = ProviderChain::new(vec![Arc::new(MockAiProvider::failing("down"))]);
    let store = Arc::new(MemoryItemStore::new());
    let service = service_with(store.clone(), ai);

    let err = service
        .generate_ai_content("alice", "x", "code", Position::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Ai(_)));
    assert_eq!(service.pipeline().pending_len(), 0);
}

#[tokio::test]
async fn canvas_state_drives_visible_items() {
    let service = memory_service();
    let near = service
        .create_item("alice", ItemKind::Note, "near", Position::new(150.0, 150.0), None)
        .unwrap();
    let far = service
        .create_item("alice", ItemKind::Note, "far", Position::new(900.0, 900.0), None)
        .unwrap();
    let items = vec![near.clone(), far];

    service.update_canvas_state(
        "alice",
        CanvasState {
            position: Position::new(150.0, 150.0),
            scale: 1.5,
            ..CanvasState::default()
        },
    );

    let visible = service.visible_items("alice", &items, Viewport::new(800.0, 600.0));
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, near.id);
    assert_eq!(service.canvas_state("bob"), CanvasState::default());
}

#[tokio::test]
async fn shutdown_persists_to_sqlite_and_rejects_later_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desktop.db");
    let config = DesktopConfig {
        debounce_ms: 10_000,
        storage: StorageBackend::Sqlite { path: path.clone() },
        ..DesktopConfig::default()
    };
    let service = DesktopService::from_config(&config).unwrap();
    assert_eq!(service.pipeline().delay(), Duration::from_secs(10));

    let item = service
        .create_item("alice", ItemKind::Note, "unsaved", Position::default(), None)
        .unwrap();
    let outcome = service.shutdown().await;
    assert_eq!(outcome.summary().succeeded, 1);

    let err = service
        .create_item("alice", ItemKind::Note, "late", Position::default(), None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Persist(PersistError::Closed)));

    let reopened = SqliteItemStore::open(&path).unwrap();
    let loaded = reopened.load_all("alice").await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, item.id);
}
