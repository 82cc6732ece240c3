//! Single-file SQLite storage adapter.
//!
//! # Responsibility
//! - Persist desktop items in the `desktop_items` table.
//! - Keep SQL details inside the storage boundary.
//!
//! # Invariants
//! - SQLite allows one writer at a time, so every operation runs while
//!   holding the adapter's connection mutex.
//! - Write paths call `DesktopItem::validate()` before SQL mutations.
//! - Read paths reject invalid persisted rows instead of masking them.

use crate::db::{open_db, open_db_in_memory};
use crate::model::item::{DesktopItem, ItemKind, Position};
use crate::storage::{StorageError, StoragePort, StorageResult};
use async_trait::async_trait;
use log::{debug, error, info};
use rusqlite::{params, Connection, Row};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

const ITEM_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    type,
    title,
    position_x,
    position_y,
    position_z,
    content,
    metadata,
    created_at,
    updated_at
FROM desktop_items";

/// SQLite-backed item store sharing one connection across callers.
pub struct SqliteItemStore {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl SqliteItemStore {
    /// Opens (or creates) the database file at `path` and migrates it.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn = open_db(&path)?;
        let location = path.display().to_string();
        info!(
            "event=storage_open module=storage status=ok backend=sqlite path={}",
            location
        );
        Ok(Self::from_connection(conn, location))
    }

    /// Opens a private in-memory database; mainly for tests.
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = open_db_in_memory()?;
        Ok(Self::from_connection(conn, ":memory:".to_string()))
    }

    fn from_connection(conn: Connection, location: String) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// Runs `op` on the blocking pool while holding the connection lock.
    async fn with_conn<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StorageError::LockPoisoned)?;
            op(&guard)
        })
        .await
        .map_err(|err| StorageError::Unavailable(format!("sqlite task failed: {err}")))?
    }
}

#[async_trait]
impl StoragePort for SqliteItemStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn save(&self, item: &DesktopItem) -> StorageResult<()> {
        item.validate()?;
        let item = item.clone();
        let item_id = item.id.clone();

        let result = self.with_conn(move |conn| upsert_item(conn, &item)).await;
        match &result {
            Ok(()) => debug!(
                "event=item_save module=storage status=ok backend=sqlite item_id={}",
                item_id
            ),
            Err(err) => error!(
                "event=item_save module=storage status=error backend=sqlite item_id={} error={}",
                item_id, err
            ),
        }
        result
    }

    async fn load_all(&self, owner_id: &str) -> StorageResult<Vec<DesktopItem>> {
        let owner_id = owner_id.to_string();
        let items = self
            .with_conn(move |conn| {
                let mut stmt = conn.prepare(&format!(
                    "{ITEM_SELECT_SQL}
                     WHERE owner_id = ?1
                     ORDER BY created_at DESC, id ASC;"
                ))?;
                let mut rows = stmt.query([owner_id.as_str()])?;
                let mut items = Vec::new();
                while let Some(row) = rows.next()? {
                    items.push(parse_item_row(row)?);
                }
                Ok(items)
            })
            .await?;

        debug!(
            "event=items_load module=storage status=ok backend=sqlite count={}",
            items.len()
        );
        Ok(items)
    }

    async fn delete(&self, item_id: &str, owner_id: &str) -> StorageResult<bool> {
        let id = item_id.to_string();
        let owner = owner_id.to_string();
        let changed = self
            .with_conn(move |conn| {
                let changed = conn.execute(
                    "DELETE FROM desktop_items WHERE id = ?1 AND owner_id = ?2;",
                    params![id, owner],
                )?;
                Ok(changed)
            })
            .await?;

        debug!(
            "event=item_delete module=storage status=ok backend=sqlite item_id={} removed={}",
            item_id,
            changed > 0
        );
        Ok(changed > 0)
    }
}

fn upsert_item(conn: &Connection, item: &DesktopItem) -> StorageResult<()> {
    let content = serde_json::to_string(&item.content)?;
    let metadata = serde_json::to_string(&item.metadata)?;

    conn.execute(
        "INSERT INTO desktop_items (
            id,
            owner_id,
            type,
            title,
            position_x,
            position_y,
            position_z,
            content,
            metadata,
            created_at,
            updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        ON CONFLICT(id) DO UPDATE SET
            owner_id = excluded.owner_id,
            type = excluded.type,
            title = excluded.title,
            position_x = excluded.position_x,
            position_y = excluded.position_y,
            position_z = excluded.position_z,
            content = excluded.content,
            metadata = excluded.metadata,
            created_at = excluded.created_at,
            updated_at = excluded.updated_at;",
        params![
            item.id.as_str(),
            item.owner_id.as_str(),
            item.kind.as_str(),
            item.title.as_str(),
            item.position.x,
            item.position.y,
            item.position.z,
            content,
            metadata,
            item.created_at,
            item.updated_at,
        ],
    )?;
    Ok(())
}

fn parse_item_row(row: &Row<'_>) -> StorageResult<DesktopItem> {
    let type_text: String = row.get("type")?;
    let kind = ItemKind::parse(&type_text).ok_or_else(|| {
        StorageError::InvalidData(format!(
            "invalid item type `{type_text}` in desktop_items.type"
        ))
    })?;

    let content_text: String = row.get("content")?;
    let content: Value = serde_json::from_str(&content_text).map_err(|err| {
        StorageError::InvalidData(format!("invalid json in desktop_items.content: {err}"))
    })?;

    let metadata_text: String = row.get("metadata")?;
    let metadata: Map<String, Value> = serde_json::from_str(&metadata_text).map_err(|err| {
        StorageError::InvalidData(format!("invalid json in desktop_items.metadata: {err}"))
    })?;

    let item = DesktopItem {
        id: row.get("id")?,
        owner_id: row.get("owner_id")?,
        kind,
        title: row.get("title")?,
        position: Position {
            x: row.get("position_x")?,
            y: row.get("position_y")?,
            z: row.get("position_z")?,
        },
        content,
        metadata,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    item.validate()?;
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::SqliteItemStore;
    use crate::model::item::{DesktopItem, ItemKind, Position};
    use crate::storage::StoragePort;
    use serde_json::json;

    #[tokio::test]
    async fn save_and_load_preserves_payload_and_metadata() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let mut item = DesktopItem::new(
            "alice",
            ItemKind::Table,
            "Budget",
            Position::new(12.5, -4.0).with_z(3),
            json!([["Name", "Age"], ["Alice", "30"]]),
        );
        item.metadata.insert("color".to_string(), json!("teal"));
        store.save(&item).await.unwrap();

        let loaded = store.load_all("alice").await.unwrap();
        assert_eq!(loaded, vec![item]);
    }

    #[tokio::test]
    async fn rejects_unknown_kind_in_persisted_row() {
        let store = SqliteItemStore::open_in_memory().unwrap();
        let item = DesktopItem::new(
            "alice",
            ItemKind::Note,
            "n",
            Position::new(0.0, 0.0),
            json!("x"),
        );
        store.save(&item).await.unwrap();
        store
            .with_conn(|conn| {
                conn.execute("UPDATE desktop_items SET type = 'spreadsheet';", [])?;
                Ok(())
            })
            .await
            .unwrap();

        let err = store.load_all("alice").await.unwrap_err();
        assert!(err.to_string().contains("spreadsheet"));
    }
}
