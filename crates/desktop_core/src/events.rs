//! In-process event bus for desktop notifications.
//!
//! Publishing never blocks and never fails; with no subscribers an event is
//! simply dropped. Slow subscribers lag instead of stalling publishers.

use crate::model::canvas::CanvasState;
use crate::model::item::{DesktopItem, ItemId};
use crate::persist::FlushSummary;
use log::trace;
use tokio::sync::broadcast;

const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub enum DesktopEvent {
    ItemCreated(DesktopItem),
    ItemUpdated(DesktopItem),
    ItemDeleted { item_id: ItemId, owner_id: String },
    ItemsLoaded { owner_id: String, count: usize },
    AiContentGenerated(DesktopItem),
    CanvasUpdated { owner_id: String, state: CanvasState },
    FlushCompleted(FlushSummary),
}

impl DesktopEvent {
    /// Stable event name used by subscribers and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ItemCreated(_) => "item_created",
            Self::ItemUpdated(_) => "item_updated",
            Self::ItemDeleted { .. } => "item_deleted",
            Self::ItemsLoaded { .. } => "items_loaded",
            Self::AiContentGenerated(_) => "ai_content_generated",
            Self::CanvasUpdated { .. } => "canvas_updated",
            Self::FlushCompleted(_) => "flush_completed",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DesktopEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DesktopEvent> {
        self.sender.subscribe()
    }

    /// Returns how many subscribers received the event.
    pub fn emit(&self, event: DesktopEvent) -> usize {
        let name = event.name();
        let delivered = self.sender.send(event).unwrap_or(0);
        trace!("event=event_emit module=events name={name} subscribers={delivered}");
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
