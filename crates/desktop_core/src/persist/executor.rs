//! Flush executor: writes one batch through the storage port.
//!
//! # Invariants
//! - Every item of a batch gets exactly one `save` attempt and exactly one
//!   entry in the outcome.
//! - One failing (or panicking) save never affects the others.
//! - At most `max_in_flight` saves run at once.

use crate::model::item::ItemId;
use crate::persist::outcome::{FlushBatch, FlushOutcome, ItemWriteResult};
use crate::storage::{StorageError, StoragePort};
use futures::FutureExt;
use log::warn;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub struct FlushExecutor {
    storage: Arc<dyn StoragePort>,
    max_in_flight: Option<usize>,
}

impl FlushExecutor {
    /// `max_in_flight = None` bounds fan-out by the batch size.
    pub fn new(storage: Arc<dyn StoragePort>, max_in_flight: Option<usize>) -> Self {
        Self {
            storage,
            max_in_flight,
        }
    }

    /// Saves every item of `batch` concurrently and waits for all of them.
    pub async fn execute(&self, batch: FlushBatch) -> FlushOutcome {
        if batch.is_empty() {
            return FlushOutcome::empty();
        }

        let limit = self
            .max_in_flight
            .unwrap_or(batch.len())
            .clamp(1, batch.len());
        let permits = Arc::new(Semaphore::new(limit));
        let mut tasks = JoinSet::new();
        let mut unresolved = batch
            .items()
            .iter()
            .map(|item| item.id.clone())
            .collect::<HashSet<ItemId>>();

        for item in batch.into_items() {
            let storage = Arc::clone(&self.storage);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => AssertUnwindSafe(storage.save(&item))
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|_| {
                            Err(StorageError::Unavailable("save panicked".to_string()))
                        }),
                    Err(_) => Err(StorageError::Unavailable(
                        "write permits closed".to_string(),
                    )),
                };
                ItemWriteResult {
                    item_id: item.id,
                    result,
                }
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(write) => {
                    unresolved.remove(&write.item_id);
                    results.push(write);
                }
                // Only reachable when the runtime is shutting down.
                Err(join_err) => warn!(
                    "event=item_save module=persist status=error backend={} error=save task aborted: {}",
                    self.storage.backend_name(),
                    join_err
                ),
            }
        }
        // Tasks that never reported back still count as failed writes.
        results.extend(unresolved.into_iter().map(|item_id| ItemWriteResult {
            item_id,
            result: Err(StorageError::Unavailable("save task aborted".to_string())),
        }));

        for write in &results {
            if let Err(err) = &write.result {
                warn!(
                    "event=item_save module=persist status=error backend={} item_id={} error={}",
                    self.storage.backend_name(),
                    write.item_id,
                    err
                );
            }
        }

        FlushOutcome { results }
    }
}
