//! Messages exchanged between the coordinator and its workers.
//!
//! Workers never share mutable state with the coordinator; everything they
//! produce travels over a channel as one of these values.

use serde::Serialize;

use crate::crypto::GeneratedAddress;
use crate::matcher::SearchPattern;

/// Coordinator → worker control messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Begin searching for `pattern`.
    Start(SearchPattern),
    /// Finish the current batch and exit.
    Stop,
}

/// Counters a worker reports about itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Keys generated since `Start`
    pub total_hashes: u64,
    /// Keys per second over the last reporting window
    pub hashes_per_second: u64,
}

/// Worker → coordinator events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Stats(WorkerStats),
    Found(GeneratedAddress),
    Error { message: String },
}

/// An event tagged with the worker that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerMessage {
    pub worker_id: usize,
    pub event: WorkerEvent,
}

/// An accepted match, as forwarded to the event sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundAddress {
    /// The matching address
    pub address: String,
    /// Private key for the address
    pub private_key: String,
    /// The ID of the worker that found this result
    pub worker_id: usize,
    /// 1-based position among the session's accepted results
    pub index: usize,
}
