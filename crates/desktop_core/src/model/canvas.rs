//! Canvas state and viewport culling.
//!
//! Pure geometry. Nothing here holds shared state.

use crate::model::item::{DesktopItem, Position};
use serde::{Deserialize, Serialize};

/// Optional hard limits of the pannable area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

/// Pan/zoom state of one user's infinite canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasState {
    /// Canvas point at the center of the viewport.
    pub position: Position,
    pub scale: f64,
    pub velocity: Position,
    pub scale_velocity: f64,
    #[serde(default)]
    pub bounds: Option<CanvasBounds>,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            position: Position::default(),
            scale: 1.0,
            velocity: Position::default(),
            scale_velocity: 0.0,
            bounds: None,
        }
    }
}

/// Screen size of the area showing the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Canvas-space rectangle, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl VisibleRect {
    pub fn contains(&self, position: &Position) -> bool {
        self.left <= position.x
            && position.x <= self.right
            && self.top <= position.y
            && position.y <= self.bottom
    }
}

impl CanvasState {
    /// Scale used for math; invalid zoom levels collapse to 1.0.
    pub fn effective_scale(&self) -> f64 {
        if self.scale.is_finite() && self.scale > 0.0 {
            self.scale
        } else {
            1.0
        }
    }

    /// Canvas rectangle currently on screen.
    pub fn visible_rect(&self, viewport: Viewport) -> VisibleRect {
        let scale = self.effective_scale();
        let half_width = viewport.width / (2.0 * scale);
        let half_height = viewport.height / (2.0 * scale);
        VisibleRect {
            left: self.position.x - half_width,
            right: self.position.x + half_width,
            top: self.position.y - half_height,
            bottom: self.position.y + half_height,
        }
    }
}

/// Returns the items whose anchor point lies inside the viewport.
pub fn visible_items<'a>(
    state: &CanvasState,
    items: &'a [DesktopItem],
    viewport: Viewport,
) -> Vec<&'a DesktopItem> {
    let rect = state.visible_rect(viewport);
    items
        .iter()
        .filter(|item| rect.contains(&item.position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{visible_items, CanvasState, Viewport};
    use crate::model::item::{DesktopItem, ItemKind, Position};
    use serde_json::Value;

    fn item_at(x: f64, y: f64) -> DesktopItem {
        DesktopItem::new("u", ItemKind::Note, "n", Position::new(x, y), Value::Null)
    }

    #[test]
    fn default_viewport_rect_is_centered_on_origin() {
        let rect = CanvasState::default().visible_rect(Viewport::new(200.0, 100.0));
        assert_eq!(rect.left, -100.0);
        assert_eq!(rect.right, 100.0);
        assert_eq!(rect.top, -50.0);
        assert_eq!(rect.bottom, 50.0);
    }

    #[test]
    fn zoom_shrinks_visible_area() {
        let state = CanvasState {
            scale: 2.0,
            ..CanvasState::default()
        };
        let items = vec![item_at(40.0, 0.0), item_at(60.0, 0.0)];
        let visible = visible_items(&state, &items, Viewport::new(200.0, 200.0));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].position.x, 40.0);
    }

    #[test]
    fn edges_are_inclusive() {
        let state = CanvasState::default();
        let items = vec![item_at(100.0, 50.0)];
        let visible = visible_items(&state, &items, Viewport::new(200.0, 100.0));
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn invalid_scale_falls_back_to_one() {
        let state = CanvasState {
            scale: 0.0,
            ..CanvasState::default()
        };
        assert_eq!(state.effective_scale(), 1.0);
    }
}
