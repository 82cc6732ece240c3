//! Write-coalescing queue with one queue-wide debounce timer.
//!
//! # Responsibility
//! - Keep only the latest pending version of every item id.
//! - Arm, re-arm and cancel the single debounce timer.
//! - Hand the whole buffer to the flush executor as one snapshot.
//!
//! # Invariants
//! - At most one pending write per id; a newer enqueue overwrites.
//! - Zero or one debounce timer is armed at any instant. The armed timer is
//!   identified by a generation number, and a timer that wakes up with a
//!   stale generation does nothing.
//! - Buffer mutation, timer replacement and snapshot hand-off all happen under
//!   the `state` mutex, so they are linearizable with respect to each other.
//! - Flush cycles run one at a time, and each takes its snapshot only after
//!   the previous cycle finished. A newer version of an id can therefore
//!   never be overwritten by an older one still in flight.
//! - A flush cycle runs in its own task. Cancelling a caller of
//!   `force_flush` detaches from the cycle; it never aborts the writes of a
//!   batch already taken from the buffer.

use crate::model::item::{DesktopItem, ItemId};
use crate::persist::executor::FlushExecutor;
use crate::persist::outcome::{FlushBatch, FlushOutcome};
use crate::persist::{PersistError, PersistResult};
use log::warn;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// What started a flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Debounce,
    Forced,
}

impl Display for FlushTrigger {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Debounce => write!(f, "debounce"),
            Self::Forced => write!(f, "forced"),
        }
    }
}

/// Called after every non-empty flush cycle.
pub(crate) type FlushHook = Arc<dyn Fn(&FlushOutcome, FlushTrigger, Duration) + Send + Sync>;

struct DebounceTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct QueueState {
    pending: HashMap<ItemId, DesktopItem>,
    timer: Option<DebounceTimer>,
    generation: u64,
    closed: bool,
}

impl QueueState {
    /// Invalidates the armed timer, if any.
    fn cancel_timer(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(timer) = self.timer.take() {
            timer.handle.abort();
        }
    }
}

struct QueueInner {
    state: Mutex<QueueState>,
    cycle: tokio::sync::Mutex<()>,
    delay: Duration,
    executor: FlushExecutor,
    on_flushed: FlushHook,
}

#[derive(Clone)]
pub struct WriteQueue {
    inner: Arc<QueueInner>,
}

impl WriteQueue {
    pub(crate) fn new(delay: Duration, executor: FlushExecutor, on_flushed: FlushHook) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(QueueState::default()),
                cycle: tokio::sync::Mutex::new(()),
                delay,
                executor,
                on_flushed,
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Buffers `item` as the latest version of its id and re-arms the timer.
    ///
    /// Never suspends. Must be called from within a Tokio runtime, since the
    /// debounce timer is a spawned task.
    ///
    /// Returns the version that was buffered.
    pub fn enqueue(&self, mut item: DesktopItem) -> PersistResult<DesktopItem> {
        let runtime = Handle::try_current().map_err(|_| PersistError::NoRuntime)?;
        let mut state = self.inner.lock_state();
        if state.closed {
            return Err(PersistError::Closed);
        }

        if let Some(previous) = state.pending.get(&item.id) {
            item.touch(previous.updated_at);
        }
        state.pending.insert(item.id.clone(), item.clone());

        state.cancel_timer();
        let generation = state.generation;
        let inner = Arc::clone(&self.inner);
        let handle = runtime.spawn(async move {
            tokio::time::sleep(inner.delay).await;
            inner.on_timer(generation).await;
        });
        state.timer = Some(DebounceTimer { generation, handle });
        Ok(item)
    }

    /// Cancels the armed timer and flushes everything buffered right now.
    ///
    /// Waits for an in-flight cycle to finish first, then runs its own.
    /// Dropping the returned future does not stop the cycle.
    pub async fn force_flush(&self) -> FlushOutcome {
        self.inner.lock_state().cancel_timer();
        let Ok(runtime) = Handle::try_current() else {
            return self.inner.run_cycle(FlushTrigger::Forced).await;
        };

        let inner = Arc::clone(&self.inner);
        let cycle = runtime.spawn(async move { inner.run_cycle(FlushTrigger::Forced).await });
        match cycle.await {
            Ok(outcome) => outcome,
            // The cycle task only dies with its runtime.
            Err(err) => {
                warn!(
                    "event=flush_batch module=persist status=error trigger=forced error=cycle task failed: {}",
                    err
                );
                FlushOutcome::empty()
            }
        }
    }

    /// Rejects further enqueues. Returns `false` when already closed.
    pub fn close(&self) -> bool {
        let mut state = self.inner.lock_state();
        !std::mem::replace(&mut state.closed, true)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock_state().closed
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock_state().pending.len()
    }

    pub fn has_armed_timer(&self) -> bool {
        self.inner.lock_state().timer.is_some()
    }
}

impl QueueInner {
    fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        // Nothing panics while the guard is held, so the data is consistent.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn on_timer(&self, generation: u64) {
        {
            let mut state = self.lock_state();
            let armed = state.timer.as_ref().map(|timer| timer.generation);
            if armed != Some(generation) {
                return;
            }
            state.timer = None;
        }
        self.run_cycle(FlushTrigger::Debounce).await;
    }

    async fn run_cycle(&self, trigger: FlushTrigger) -> FlushOutcome {
        let _cycle = self.cycle.lock().await;
        let batch = self.take_batch();
        if batch.is_empty() {
            return FlushOutcome::empty();
        }

        let started_at = Instant::now();
        let outcome = self.executor.execute(batch).await;
        (self.on_flushed)(&outcome, trigger, started_at.elapsed());
        outcome
    }

    fn take_batch(&self) -> FlushBatch {
        let pending = std::mem::take(&mut self.lock_state().pending);
        FlushBatch::new(pending.into_values().collect())
    }
}
