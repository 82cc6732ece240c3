//! Flush batch and outcome types.

use crate::model::item::{DesktopItem, ItemId};
use crate::storage::StorageError;
use serde::{Deserialize, Serialize};

/// Immutable snapshot of the pending writes taken when a flush starts.
#[derive(Debug, Clone, Default)]
pub struct FlushBatch {
    items: Vec<DesktopItem>,
}

impl FlushBatch {
    pub(crate) fn new(items: Vec<DesktopItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[DesktopItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn into_items(self) -> Vec<DesktopItem> {
        self.items
    }
}

/// Result of writing one item of a batch.
#[derive(Debug)]
pub struct ItemWriteResult {
    pub item_id: ItemId,
    pub result: Result<(), StorageError>,
}

impl ItemWriteResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Batch-level tally published after each flush cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Per-item results of one flush cycle.
#[derive(Debug, Default)]
pub struct FlushOutcome {
    pub results: Vec<ItemWriteResult>,
}

impl FlushOutcome {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> FlushSummary {
        let succeeded = self.results.iter().filter(|r| r.is_success()).count();
        FlushSummary {
            attempted: self.results.len(),
            succeeded,
            failed: self.results.len() - succeeded,
        }
    }

    /// Ids whose write failed; callers re-enqueue these to retry.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.item_id.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
