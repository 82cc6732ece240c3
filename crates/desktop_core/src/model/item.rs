//! Desktop item domain model.
//!
//! # Responsibility
//! - Define the record placed on the canvas and persisted by storage ports.
//! - Provide validation and timestamp helpers shared by write paths.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `updated_at` is never earlier than `created_at`.
//! - `touch` never moves `updated_at` backwards.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque identifier of a desktop item.
///
/// Generated ids are UUIDv4 strings, but imported ids are accepted as-is.
pub type ItemId = String;

/// Kind of window an item renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Note,
    Table,
    Code,
    Browser,
    Terminal,
    Media,
    Chart,
    Calendar,
}

impl ItemKind {
    pub const ALL: [ItemKind; 8] = [
        ItemKind::Note,
        ItemKind::Table,
        ItemKind::Code,
        ItemKind::Browser,
        ItemKind::Terminal,
        ItemKind::Media,
        ItemKind::Chart,
        ItemKind::Calendar,
    ];

    /// Stable lowercase name used in storage and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Table => "table",
            Self::Code => "code",
            Self::Browser => "browser",
            Self::Terminal => "terminal",
            Self::Media => "media",
            Self::Chart => "chart",
            Self::Calendar => "calendar",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value.trim())
    }

    /// Content a freshly created item of this kind starts with.
    pub fn default_content(self) -> Value {
        match self {
            Self::Note => Value::String(String::new()),
            Self::Table => json!([["ID", "Name"], ["1", "Placeholder"]]),
            Self::Code => Value::String("# Enter code here".to_string()),
            _ => Value::Null,
        }
    }
}

/// Canvas position. `z` is the stacking order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: i32,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: 0 }
    }

    pub fn with_z(mut self, z: i32) -> Self {
        self.z = z;
        self
    }
}

/// Canonical record for one item on a user's desktop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesktopItem {
    pub id: ItemId,
    pub owner_id: String,
    /// Serialized as `type` to match the persisted layout.
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub title: String,
    pub position: Position,
    /// Kind-specific payload (markdown text, table rows, source code...).
    pub content: Value,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Non-decreasing per id.
    pub updated_at: i64,
}

impl DesktopItem {
    /// Creates an item with a generated id, stamped with the current time.
    pub fn new(
        owner_id: impl Into<String>,
        kind: ItemKind,
        title: impl Into<String>,
        position: Position,
        content: Value,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4().to_string(),
            owner_id,
            kind,
            title,
            position,
            content,
        )
    }

    /// Creates an item with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(
        id: impl Into<ItemId>,
        owner_id: impl Into<String>,
        kind: ItemKind,
        title: impl Into<String>,
        position: Position,
        content: Value,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: id.into(),
            owner_id: owner_id.into(),
            kind,
            title: title.into(),
            position,
            content,
            metadata: Map::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Advances `updated_at` to `now_ms`, never backwards.
    pub fn touch(&mut self, now_ms: i64) {
        self.updated_at = self.updated_at.max(now_ms);
    }

    /// Checks structural invariants before persistence.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id.trim().is_empty() {
            return Err(ItemValidationError::EmptyId);
        }
        if self.owner_id.trim().is_empty() {
            return Err(ItemValidationError::EmptyOwner);
        }
        if !self.position.x.is_finite() || !self.position.y.is_finite() {
            return Err(ItemValidationError::NonFinitePosition);
        }
        if self.updated_at < self.created_at {
            return Err(ItemValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        Ok(())
    }
}

/// Structural violations detected by `DesktopItem::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    EmptyId,
    EmptyOwner,
    NonFinitePosition,
    UpdatedBeforeCreated { created_at: i64, updated_at: i64 },
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "item id cannot be empty"),
            Self::EmptyOwner => write!(f, "item owner_id cannot be empty"),
            Self::NonFinitePosition => write!(f, "item position must be finite"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "item updated_at {updated_at} is earlier than created_at {created_at}"
            ),
        }
    }
}

impl Error for ItemValidationError {}

/// Current wall-clock time in Unix epoch milliseconds.
///
/// Falls back to `0` if the system clock is before the epoch.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{DesktopItem, ItemKind, ItemValidationError, Position};
    use serde_json::{json, Value};

    fn note() -> DesktopItem {
        DesktopItem::new(
            "alice",
            ItemKind::Note,
            "title",
            Position::new(1.0, 2.0),
            Value::Null,
        )
    }

    #[test]
    fn new_item_is_valid_and_has_matching_timestamps() {
        let item = note();
        assert!(item.validate().is_ok());
        assert_eq!(item.created_at, item.updated_at);
        assert!(!item.id.is_empty());
    }

    #[test]
    fn touch_never_moves_updated_at_backwards() {
        let mut item = note();
        let original = item.updated_at;
        item.touch(original - 1_000);
        assert_eq!(item.updated_at, original);
        item.touch(original + 5);
        assert_eq!(item.updated_at, original + 5);
    }

    #[test]
    fn validate_rejects_blank_owner_and_nan_position() {
        let mut item = note();
        item.owner_id = "  ".to_string();
        assert_eq!(item.validate(), Err(ItemValidationError::EmptyOwner));

        let mut item = note();
        item.position.x = f64::NAN;
        assert_eq!(item.validate(), Err(ItemValidationError::NonFinitePosition));
    }

    #[test]
    fn validate_rejects_updated_before_created() {
        let mut item = note();
        item.updated_at = item.created_at - 1;
        assert!(matches!(
            item.validate(),
            Err(ItemValidationError::UpdatedBeforeCreated { .. })
        ));
    }

    #[test]
    fn kind_round_trips_through_name() {
        for kind in ItemKind::ALL {
            assert_eq!(ItemKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ItemKind::parse("spreadsheet"), None);
    }

    #[test]
    fn default_content_depends_on_kind() {
        assert_eq!(ItemKind::Note.default_content(), json!(""));
        assert_eq!(
            ItemKind::Table.default_content(),
            json!([["ID", "Name"], ["1", "Placeholder"]])
        );
        assert_eq!(ItemKind::Media.default_content(), Value::Null);
    }

    #[test]
    fn serializes_kind_as_type_field() {
        let item = note();
        let encoded = serde_json::to_value(&item).expect("item should serialize");
        assert_eq!(encoded["type"], json!("note"));
        assert_eq!(encoded["position"]["z"], json!(0));
    }
}
