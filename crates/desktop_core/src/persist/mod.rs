//! Write-coalescing persistence pipeline.
//!
//! # Responsibility
//! - Absorb high-frequency item mutations and turn them into a bounded,
//!   ordered sequence of storage writes.
//! - Guarantee that buffered writes eventually happen, including on shutdown.
//!
//! # Invariants
//! - For a given id, the version written by a flush is the most recent one
//!   enqueued before that flush's snapshot.
//! - Failed writes are reported, never retried here.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod executor;
pub mod outcome;
pub mod pipeline;
pub mod queue;

pub use executor::FlushExecutor;
pub use outcome::{FlushBatch, FlushOutcome, FlushSummary, ItemWriteResult};
pub use pipeline::{PersistencePipeline, PipelineOptions};
pub use queue::{FlushTrigger, WriteQueue};

pub type PersistResult<T> = Result<T, PersistError>;

/// Caller misuse of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// The pipeline was shut down; the write was not buffered.
    Closed,
    /// `enqueue` was called outside a Tokio runtime.
    NoRuntime,
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "persistence pipeline is shut down"),
            Self::NoRuntime => write!(f, "enqueue requires a running tokio runtime"),
        }
    }
}

impl Error for PersistError {}
