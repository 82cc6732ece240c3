//! Domain model for desktop items and canvas geometry.
//!
//! # Responsibility
//! - Define the canonical item record persisted by every storage backend.
//! - Keep viewport math pure and free of shared state.
//!
//! # Invariants
//! - Every item is identified by a stable `ItemId`.
//! - `updated_at` never moves backwards for one item.

pub mod canvas;
pub mod item;
