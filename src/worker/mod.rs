//! Worker pool for parallel vanity address search.
//!
//! This module provides:
//! - CPU workers running a cancellable generate → match → report loop
//! - A typed command/event protocol between workers and the coordinator
//! - The coordinator: a single-consumer actor enforcing the result limit

mod coordinator;
mod cpu;
mod message;

pub use coordinator::{
    Coordinator, SearchError, SearchEvents, SearchOptions, SessionHandle, SessionStatus,
    SessionSummary,
};
pub use cpu::{CpuWorker, WorkerConfig, WorkerState, DEFAULT_BATCH_SIZE, DEFAULT_REPORT_INTERVAL};
pub use message::{FoundAddress, WorkerCommand, WorkerEvent, WorkerMessage, WorkerStats};
