//! Desktop use-case service.
//!
//! # Responsibility
//! - Provide the entry points UI/CLI layers call for desktop items.
//! - Route item writes through the coalescing pipeline and reads/deletes
//!   straight to the storage port.
//! - Publish a `DesktopEvent` for every completed use case.
//!
//! # Invariants
//! - Create/update never write to storage directly; they only enqueue.
//! - Services stay storage-agnostic and only see `dyn StoragePort`.

use crate::ai::{AiError, ContentKind, MockAiProvider, ProviderChain};
use crate::config::DesktopConfig;
use crate::events::{DesktopEvent, EventBus};
use crate::model::canvas::{CanvasState, Viewport};
use crate::model::item::{DesktopItem, ItemKind, Position};
use crate::persist::{FlushOutcome, PersistError, PersistencePipeline, PipelineOptions};
use crate::service::canvas_service::CanvasService;
use crate::storage::{open_storage, StorageError, StoragePort};
use log::{error, info};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const AI_TITLE_PROMPT_CHARS: usize = 50;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Persist(PersistError),
    Storage(StorageError),
    Ai(AiError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Persist(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::Ai(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Persist(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::Ai(err) => Some(err),
        }
    }
}

impl From<PersistError> for ServiceError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

impl From<StorageError> for ServiceError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<AiError> for ServiceError {
    fn from(value: AiError) -> Self {
        Self::Ai(value)
    }
}

/// Composition root for desktop item use cases.
pub struct DesktopService {
    storage: Arc<dyn StoragePort>,
    pipeline: PersistencePipeline,
    ai: ProviderChain,
    canvas: CanvasService,
    events: EventBus,
}

impl DesktopService {
    pub fn new(
        storage: Arc<dyn StoragePort>,
        options: PipelineOptions,
        ai: ProviderChain,
        events: EventBus,
    ) -> Self {
        let pipeline = PersistencePipeline::new(Arc::clone(&storage), options, events.clone());
        Self {
            storage,
            pipeline,
            ai,
            canvas: CanvasService::new(),
            events,
        }
    }

    /// Builds the configured storage backend with the mock AI provider.
    pub fn from_config(config: &DesktopConfig) -> ServiceResult<Self> {
        let storage = open_storage(&config.storage)?;
        let ai = ProviderChain::new(vec![Arc::new(MockAiProvider::default())]);
        Ok(Self::new(
            storage,
            PipelineOptions::from(config),
            ai,
            EventBus::default(),
        ))
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn pipeline(&self) -> &PersistencePipeline {
        &self.pipeline
    }

    /// Creates an item and queues it for persistence.
    ///
    /// # Contract
    /// - `content = None` uses `ItemKind::default_content`.
    /// - Returns the created item; it is durable after the next flush.
    pub fn create_item(
        &self,
        owner_id: &str,
        kind: ItemKind,
        title: impl Into<String>,
        position: Position,
        content: Option<Value>,
    ) -> ServiceResult<DesktopItem> {
        let content = content.unwrap_or_else(|| kind.default_content());
        let item = self
            .pipeline
            .enqueue(DesktopItem::new(owner_id, kind, title, position, content))?;
        info!(
            "event=item_create module=service status=ok kind={} item_id={}",
            kind.as_str(),
            item.id
        );
        self.events.emit(DesktopEvent::ItemCreated(item.clone()));
        Ok(item)
    }

    /// Queues a new version of an existing item.
    ///
    /// Returns the version as stamped by the pipeline; `ItemUpdated`
    /// carries the same value.
    pub fn update_item(&self, item: DesktopItem) -> ServiceResult<DesktopItem> {
        let item = self.pipeline.enqueue(item)?;
        self.events.emit(DesktopEvent::ItemUpdated(item.clone()));
        Ok(item)
    }

    /// Deletes an item owned by `owner_id` directly in storage.
    ///
    /// Returns `false` when the item does not exist or belongs to another
    /// owner.
    pub async fn delete_item(&self, item_id: &str, owner_id: &str) -> ServiceResult<bool> {
        let removed = self.storage.delete(item_id, owner_id).await?;
        if removed {
            info!("event=item_delete module=service status=ok item_id={item_id}");
            self.events.emit(DesktopEvent::ItemDeleted {
                item_id: item_id.to_string(),
                owner_id: owner_id.to_string(),
            });
        }
        Ok(removed)
    }

    /// Loads persisted items of `owner_id`, newest first.
    ///
    /// Writes still buffered in the pipeline are not visible until flushed.
    pub async fn load_user_items(&self, owner_id: &str) -> ServiceResult<Vec<DesktopItem>> {
        let items = self.storage.load_all(owner_id).await?;
        self.events.emit(DesktopEvent::ItemsLoaded {
            owner_id: owner_id.to_string(),
            count: items.len(),
        });
        Ok(items)
    }

    /// Generates content with the AI chain and places it as a new item.
    ///
    /// `code` produces a code item, `note` a note item, anything else a
    /// table item.
    pub async fn generate_ai_content(
        &self,
        owner_id: &str,
        prompt: &str,
        content_kind: &str,
        position: Position,
    ) -> ServiceResult<DesktopItem> {
        let requested = ContentKind::parse(content_kind);
        let generated = match &requested {
            ContentKind::Code => self
                .ai
                .generate_code(prompt)
                .await
                .map(|code| (ItemKind::Code, Value::String(code))),
            ContentKind::Note => self
                .ai
                .generate_content(prompt, &requested)
                .await
                .map(|content| (ItemKind::Note, content)),
            _ => self
                .ai
                .generate_content(prompt, &requested)
                .await
                .map(|content| (ItemKind::Table, content)),
        };

        let (kind, content) = generated.map_err(|err| {
            error!(
                "event=ai_generate module=service status=error kind={} error={}",
                requested.as_str(),
                err
            );
            err
        })?;

        let item = self.create_item(
            owner_id,
            kind,
            ai_title(prompt),
            position,
            Some(content),
        )?;
        self.events
            .emit(DesktopEvent::AiContentGenerated(item.clone()));
        Ok(item)
    }

    pub fn canvas_state(&self, owner_id: &str) -> CanvasState {
        self.canvas.state(owner_id)
    }

    pub fn update_canvas_state(&self, owner_id: &str, state: CanvasState) {
        self.canvas.update(owner_id, state.clone());
        self.events.emit(DesktopEvent::CanvasUpdated {
            owner_id: owner_id.to_string(),
            state,
        });
    }

    pub fn visible_items<'a>(
        &self,
        owner_id: &str,
        items: &'a [DesktopItem],
        viewport: Viewport,
    ) -> Vec<&'a DesktopItem> {
        self.canvas.visible_items(owner_id, items, viewport)
    }

    pub async fn force_flush(&self) -> FlushOutcome {
        self.pipeline.force_flush().await
    }

    /// Flushes buffered writes and rejects any later create/update.
    pub async fn shutdown(&self) -> FlushOutcome {
        self.pipeline.shutdown().await
    }
}

fn ai_title(prompt: &str) -> String {
    let head = prompt
        .chars()
        .take(AI_TITLE_PROMPT_CHARS)
        .collect::<String>();
    format!("AI: {head}...")
}
