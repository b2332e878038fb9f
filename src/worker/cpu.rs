//! CPU-based worker for vanity address generation.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use tracing::{debug, warn};

use crate::crypto::KeyGenerator;
use crate::matcher::SearchPattern;

use super::message::{WorkerCommand, WorkerEvent, WorkerMessage, WorkerStats};

/// Keys generated between two cancellation checks.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Minimum time between two `Stats` reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// Tunables for a worker's loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    pub batch_size: usize,
    pub report_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            report_interval: DEFAULT_REPORT_INTERVAL,
        }
    }
}

/// Lifecycle of a worker. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Stopping,
    Stopped,
}

/// A CPU worker that generates and tests keypairs.
pub struct CpuWorker {
    /// Worker ID
    id: usize,
    /// Source of random accounts
    generator: Arc<dyn KeyGenerator>,
    /// Commands from the coordinator
    control_rx: Receiver<WorkerCommand>,
    /// Events to the coordinator
    event_tx: Sender<WorkerMessage>,
    config: WorkerConfig,
    state: WorkerState,
}

impl CpuWorker {
    /// Creates a new idle CPU worker.
    pub fn new(
        id: usize,
        generator: Arc<dyn KeyGenerator>,
        control_rx: Receiver<WorkerCommand>,
        event_tx: Sender<WorkerMessage>,
        config: WorkerConfig,
    ) -> Self {
        Self {
            id,
            generator,
            control_rx,
            event_tx,
            config: WorkerConfig {
                batch_size: config.batch_size.max(1),
                ..config
            },
            state: WorkerState::Idle,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs the worker until it is stopped.
    ///
    /// Waits idle for `Start`, then generates keys in fixed-size batches until:
    /// - `Stop` is received or the control channel closes
    /// - The key generator fails (reported as `Error`)
    /// - The coordinator stops listening for events
    pub fn run(&mut self) {
        let pattern = match self.wait_for_start() {
            Some(pattern) => pattern,
            None => {
                self.state = WorkerState::Stopped;
                return;
            }
        };

        self.state = WorkerState::Running;
        debug!(worker = self.id, %pattern, "worker started");

        let network = pattern.network();
        let mut total_hashes = 0u64;
        let mut window_hashes = 0u64;
        let mut last_report = Instant::now();

        while self.state == WorkerState::Running {
            for _ in 0..self.config.batch_size {
                let account = match self.generator.generate(network) {
                    Ok(account) => account,
                    Err(e) => {
                        warn!(worker = self.id, error = %e, "key generation failed");
                        self.emit(WorkerEvent::Error {
                            message: e.to_string(),
                        });
                        self.state = WorkerState::Stopped;
                        return;
                    }
                };

                total_hashes += 1;
                window_hashes += 1;

                if pattern.matches(&account.address).is_match() {
                    debug!(worker = self.id, address = %account.address, "match found");
                    if !self.emit(WorkerEvent::Found(account)) {
                        break;
                    }
                }
            }

            self.poll_control();
            if self.state != WorkerState::Running {
                break;
            }

            let elapsed = last_report.elapsed();
            if elapsed >= self.config.report_interval {
                let hashes_per_second = (window_hashes as f64 / elapsed.as_secs_f64()) as u64;
                self.emit(WorkerEvent::Stats(WorkerStats {
                    total_hashes,
                    hashes_per_second,
                }));
                last_report = Instant::now();
                window_hashes = 0;
            }

            thread::yield_now();
        }

        debug!(worker = self.id, total_hashes, "worker stopped");
        self.state = WorkerState::Stopped;
    }

    /// Blocks until `Start`. A `Stop` or closed channel while idle ends the worker.
    fn wait_for_start(&self) -> Option<SearchPattern> {
        match self.control_rx.recv() {
            Ok(WorkerCommand::Start(pattern)) => Some(pattern),
            Ok(WorkerCommand::Stop) | Err(_) => None,
        }
    }

    /// Drains pending commands between batches.
    fn poll_control(&mut self) {
        loop {
            match self.control_rx.try_recv() {
                Ok(WorkerCommand::Stop) | Err(TryRecvError::Disconnected) => {
                    self.state = WorkerState::Stopping;
                    return;
                }
                Ok(WorkerCommand::Start(_)) => {
                    debug!(worker = self.id, "ignoring start while running");
                }
                Err(TryRecvError::Empty) => return,
            }
        }
    }

    /// Sends an event; a closed channel moves the worker to `Stopping`.
    fn emit(&mut self, event: WorkerEvent) -> bool {
        let message = WorkerMessage {
            worker_id: self.id,
            event,
        };
        if self.event_tx.send(message).is_err() {
            self.state = WorkerState::Stopping;
            return false;
        }
        true
    }
}
