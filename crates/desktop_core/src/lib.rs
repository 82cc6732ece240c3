//! Core backend for the virtual desktop.
//!
//! Items placed on a user's infinite canvas are persisted through a
//! write-coalescing pipeline: bursts of updates to the same item collapse into
//! one storage write, issued after a quiet period or on an explicit flush.

pub mod ai;
pub mod config;
pub mod db;
pub mod events;
pub mod logging;
pub mod model;
pub mod persist;
pub mod service;
pub mod storage;

pub use ai::{AiError, AiProvider, ContentKind, MockAiProvider, ProviderChain};
pub use config::{ConfigError, DesktopConfig, StorageBackend};
pub use events::{DesktopEvent, EventBus};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::canvas::{visible_items, CanvasState, Viewport};
pub use model::item::{DesktopItem, ItemId, ItemKind, ItemValidationError, Position};
pub use persist::{
    FlushOutcome, FlushSummary, PersistError, PersistencePipeline, PipelineOptions,
};
pub use service::canvas_service::CanvasService;
pub use service::desktop_service::{DesktopService, ServiceError, ServiceResult};
pub use storage::{
    open_storage, MemoryItemStore, SqliteItemStore, StorageError, StoragePort, StorageResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
