//! In-memory storage adapter.
//!
//! Used when no durable backend is configured. One lock guards the whole map.

use crate::model::item::{DesktopItem, ItemId};
use crate::storage::{sort_newest_first, StorageError, StoragePort, StorageResult};
use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Process-local item map keyed by id.
#[derive(Default)]
pub struct MemoryItemStore {
    items: Mutex<HashMap<ItemId, DesktopItem>>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        info!("event=storage_open module=storage status=ok backend=memory");
        Self::default()
    }

    /// Number of stored items across all owners.
    pub fn len(&self) -> usize {
        self.lock().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, HashMap<ItemId, DesktopItem>>> {
        self.items.lock().map_err(|_| StorageError::LockPoisoned)
    }
}

#[async_trait]
impl StoragePort for MemoryItemStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, item: &DesktopItem) -> StorageResult<()> {
        item.validate()?;
        self.lock()?.insert(item.id.clone(), item.clone());
        debug!(
            "event=item_save module=storage status=ok backend=memory item_id={}",
            item.id
        );
        Ok(())
    }

    async fn load_all(&self, owner_id: &str) -> StorageResult<Vec<DesktopItem>> {
        let mut owned = self
            .lock()?
            .values()
            .filter(|item| item.owner_id == owner_id)
            .cloned()
            .collect::<Vec<_>>();
        sort_newest_first(&mut owned);
        debug!(
            "event=items_load module=storage status=ok backend=memory count={}",
            owned.len()
        );
        Ok(owned)
    }

    async fn delete(&self, item_id: &str, owner_id: &str) -> StorageResult<bool> {
        let mut items = self.lock()?;
        let owned = items
            .get(item_id)
            .is_some_and(|item| item.owner_id == owner_id);
        if owned {
            items.remove(item_id);
        }
        debug!(
            "event=item_delete module=storage status=ok backend=memory item_id={} removed={}",
            item_id, owned
        );
        Ok(owned)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryItemStore;
    use crate::model::item::{DesktopItem, ItemKind, Position};
    use crate::storage::StoragePort;
    use serde_json::json;

    fn item(owner: &str, title: &str, created_at: i64) -> DesktopItem {
        let mut item = DesktopItem::new(
            owner,
            ItemKind::Note,
            title,
            Position::new(0.0, 0.0),
            json!(title),
        );
        item.created_at = created_at;
        item.updated_at = created_at;
        item
    }

    #[tokio::test]
    async fn load_all_filters_by_owner_and_sorts_newest_first() {
        let store = MemoryItemStore::new();
        store.save(&item("alice", "old", 10)).await.unwrap();
        store.save(&item("alice", "new", 20)).await.unwrap();
        store.save(&item("bob", "other", 30)).await.unwrap();

        let items = store.load_all("alice").await.unwrap();
        let titles = items.iter().map(|i| i.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn delete_requires_matching_owner() {
        let store = MemoryItemStore::new();
        let note = item("alice", "mine", 1);
        store.save(&note).await.unwrap();

        assert!(!store.delete(&note.id, "bob").await.unwrap());
        assert_eq!(store.load_all("alice").await.unwrap().len(), 1);

        assert!(store.delete(&note.id, "alice").await.unwrap());
        assert!(!store.delete(&note.id, "alice").await.unwrap());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn save_rejects_invalid_item() {
        let store = MemoryItemStore::new();
        let mut bad = item("alice", "bad", 1);
        bad.id.clear();
        assert!(store.save(&bad).await.is_err());
        assert!(store.is_empty());
    }
}
