//! Per-owner canvas state registry.

use crate::model::canvas::{visible_items, CanvasState, Viewport};
use crate::model::item::DesktopItem;
use log::debug;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Holds the pan/zoom state of every owner seen by this process.
#[derive(Default)]
pub struct CanvasService {
    states: RwLock<HashMap<String, CanvasState>>,
}

impl CanvasService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the owner's state, initialising it to the default view.
    pub fn state(&self, owner_id: &str) -> CanvasState {
        if let Some(state) = self.read().get(owner_id) {
            return state.clone();
        }
        self.write()
            .entry(owner_id.to_string())
            .or_default()
            .clone()
    }

    pub fn update(&self, owner_id: &str, state: CanvasState) {
        self.write().insert(owner_id.to_string(), state);
        debug!("event=canvas_update module=service status=ok");
    }

    /// Items of `items` inside the owner's current viewport.
    pub fn visible_items<'a>(
        &self,
        owner_id: &str,
        items: &'a [DesktopItem],
        viewport: Viewport,
    ) -> Vec<&'a DesktopItem> {
        let state = self.state(owner_id);
        let visible = visible_items(&state, items, viewport);
        debug!(
            "event=canvas_cull module=service status=ok visible={} total={}",
            visible.len(),
            items.len()
        );
        visible
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CanvasState>> {
        self.states
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CanvasState>> {
        self.states
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
