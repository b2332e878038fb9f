//! Merges per-worker counters into session-wide throughput figures.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::matcher::SearchPattern;
use crate::worker::WorkerStats;

use super::probability::{eta_seconds, expected_attempts, probability};

/// Rate assumed for ETA display before any worker has reported.
pub const DEFAULT_ASSUMED_RATE: u64 = 100;

/// Aggregated view of a running search, handed to the event sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Keys generated across all workers
    pub total_hashes: u64,
    /// Sum of the workers' latest window rates
    pub hashes_per_second: u64,
    /// Time since the session started
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    /// Fraction of the expected attempts already spent, clamped to 1
    pub progress: f64,
    /// Seconds to the first expected match at the learned rate
    pub eta_seconds: Option<u64>,
    /// Workers that have reported at least once
    pub active_workers: usize,
    /// Cores available on this machine
    pub available_cores: usize,
}

fn serialize_secs<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_secs())
}

/// Session-wide statistics, owned by the coordinator.
///
/// Only ever mutated from the coordinator's thread; workers contribute
/// through `record` calls driven by their `Stats` messages.
#[derive(Debug, Clone)]
pub struct StatsAggregator {
    per_worker: BTreeMap<usize, WorkerStats>,
    learned_rate: u64,
    start_time: Instant,
    available_cores: usize,
}

impl StatsAggregator {
    /// Creates an aggregator seeded with a previously learned rate.
    pub fn new(initial_rate: u64) -> Self {
        Self {
            per_worker: BTreeMap::new(),
            learned_rate: initial_rate,
            start_time: Instant::now(),
            available_cores: num_cpus::get(),
        }
    }

    /// Replaces the latest stats of `worker_id`.
    pub fn record(&mut self, worker_id: usize, stats: WorkerStats) {
        self.per_worker.insert(worker_id, stats);

        let rate = self.hashes_per_second();
        if rate > 0 {
            self.learned_rate = rate;
        }
    }

    /// Drops every worker's counters; used when the session stops.
    pub fn clear_workers(&mut self) {
        self.per_worker.clear();
    }

    /// Total keys generated across all workers.
    pub fn total_hashes(&self) -> u64 {
        self.per_worker
            .values()
            .fold(0u64, |acc, s| acc.saturating_add(s.total_hashes))
    }

    /// Current aggregate rate (sum of each worker's last window).
    pub fn hashes_per_second(&self) -> u64 {
        self.per_worker
            .values()
            .fold(0u64, |acc, s| acc.saturating_add(s.hashes_per_second))
    }

    /// Last nonzero aggregate rate observed, or the seed rate.
    pub fn learned_rate(&self) -> u64 {
        self.learned_rate
    }

    /// Time since the aggregator was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Number of workers that have reported.
    pub fn active_workers(&self) -> usize {
        self.per_worker.len()
    }

    /// Fraction of expected attempts spent, in `[0, 1]`.
    pub fn progress(&self, pattern: &SearchPattern) -> f64 {
        let expected = expected_attempts(pattern);
        if expected <= 0.0 || !expected.is_finite() {
            return 0.0;
        }
        (self.total_hashes() as f64 / expected).min(1.0)
    }

    /// ETA at the learned rate, so it is defined even while idle.
    pub fn eta_seconds(&self, pattern: &SearchPattern) -> Option<u64> {
        eta_seconds(probability(pattern), self.learned_rate as f64)
    }

    /// Builds the snapshot forwarded to the sink.
    pub fn snapshot(&self, pattern: &SearchPattern) -> StatsSnapshot {
        StatsSnapshot {
            total_hashes: self.total_hashes(),
            hashes_per_second: self.hashes_per_second(),
            elapsed: self.elapsed(),
            progress: self.progress(pattern),
            eta_seconds: self.eta_seconds(pattern),
            active_workers: self.active_workers(),
            available_cores: self.available_cores,
        }
    }
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_ASSUMED_RATE)
    }
}
