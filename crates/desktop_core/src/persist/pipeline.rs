//! Persistence orchestrator composing queue, executor and storage port.
//!
//! # Responsibility
//! - Public entry point for buffering item writes.
//! - Stamp `updated_at` at enqueue time.
//! - Report every flush cycle through logs and the event bus.
//! - Flush everything before teardown completes.

use crate::config::DesktopConfig;
use crate::events::{DesktopEvent, EventBus};
use crate::model::item::{now_epoch_ms, DesktopItem};
use crate::persist::executor::FlushExecutor;
use crate::persist::outcome::FlushOutcome;
use crate::persist::queue::{FlushHook, FlushTrigger, WriteQueue};
use crate::persist::PersistResult;
use crate::storage::StoragePort;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Quiet period after the last enqueue before a flush starts.
    pub delay: Duration,
    /// Upper bound on concurrent saves; `None` means the batch size.
    pub max_in_flight: Option<usize>,
    /// Source of `updated_at` stamps, in epoch milliseconds.
    pub clock: fn() -> i64,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DEBOUNCE,
            max_in_flight: None,
            clock: now_epoch_ms,
        }
    }
}

impl From<&DesktopConfig> for PipelineOptions {
    fn from(config: &DesktopConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.debounce_ms),
            max_in_flight: config.max_in_flight_writes,
            ..Self::default()
        }
    }
}

pub struct PersistencePipeline {
    queue: WriteQueue,
    clock: fn() -> i64,
}

impl PersistencePipeline {
    pub fn new(storage: Arc<dyn StoragePort>, options: PipelineOptions, events: EventBus) -> Self {
        let executor = FlushExecutor::new(Arc::clone(&storage), options.max_in_flight);
        let backend = storage.backend_name();
        let on_flushed: FlushHook = Arc::new(
            move |outcome: &FlushOutcome, trigger: FlushTrigger, elapsed: Duration| {
                report_cycle(backend, &events, outcome, trigger, elapsed);
            },
        );

        info!(
            "event=pipeline_start module=persist status=ok backend={} delay_ms={} max_in_flight={}",
            backend,
            options.delay.as_millis(),
            options
                .max_in_flight
                .map_or_else(|| "batch".to_string(), |limit| limit.to_string())
        );

        Self {
            queue: WriteQueue::new(options.delay, executor, on_flushed),
            clock: options.clock,
        }
    }

    /// Buffers the latest version of `item` for the next flush.
    ///
    /// `updated_at` is stamped with the pipeline clock here and never moves
    /// backwards relative to the incoming value or a pending version.
    /// Returns the stamped version, exactly as it will be written.
    ///
    /// # Errors
    /// - `PersistError::Closed` after `shutdown`.
    /// - `PersistError::NoRuntime` outside a Tokio runtime.
    pub fn enqueue(&self, mut item: DesktopItem) -> PersistResult<DesktopItem> {
        item.touch((self.clock)());
        self.queue.enqueue(item)
    }

    /// Writes everything buffered now, without waiting for the debounce.
    pub async fn force_flush(&self) -> FlushOutcome {
        self.queue.force_flush().await
    }

    /// Rejects new writes, then flushes whatever is still buffered.
    ///
    /// Safe to call more than once; later calls flush nothing.
    pub async fn shutdown(&self) -> FlushOutcome {
        if self.queue.close() {
            info!(
                "event=pipeline_shutdown module=persist status=start pending={}",
                self.queue.pending_len()
            );
        }
        let outcome = self.queue.force_flush().await;
        let summary = outcome.summary();
        info!(
            "event=pipeline_shutdown module=persist status=ok attempted={} failed={}",
            summary.attempted, summary.failed
        );
        outcome
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    pub fn pending_len(&self) -> usize {
        self.queue.pending_len()
    }

    pub fn delay(&self) -> Duration {
        self.queue.delay()
    }

    /// Whether a debounce timer is currently armed.
    pub fn has_armed_timer(&self) -> bool {
        self.queue.has_armed_timer()
    }
}

fn report_cycle(
    backend: &str,
    events: &EventBus,
    outcome: &FlushOutcome,
    trigger: FlushTrigger,
    elapsed: Duration,
) {
    let summary = outcome.summary();
    if summary.failed == 0 {
        info!(
            "event=flush_batch module=persist status=ok backend={} trigger={} attempted={} succeeded={} duration_ms={}",
            backend,
            trigger,
            summary.attempted,
            summary.succeeded,
            elapsed.as_millis()
        );
    } else {
        warn!(
            "event=flush_batch module=persist status=error backend={} trigger={} attempted={} succeeded={} failed={} duration_ms={}",
            backend,
            trigger,
            summary.attempted,
            summary.succeeded,
            summary.failed,
            elapsed.as_millis()
        );
    }
    events.emit(DesktopEvent::FlushCompleted(summary));
}
