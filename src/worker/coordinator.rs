//! Search coordination: worker spawning, event serialization and the result cap.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, unbounded, Receiver, SendError, Sender};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::crypto::KeyGenerator;
use crate::matcher::{PatternError, SearchPattern};
use crate::network::Network;
use crate::stats::{StatsAggregator, StatsSnapshot, DEFAULT_ASSUMED_RATE};

use super::cpu::{CpuWorker, WorkerConfig};
use super::message::{FoundAddress, WorkerCommand, WorkerEvent, WorkerMessage, WorkerStats};

/// Errors surfaced synchronously by `start_search`.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    InvalidPattern(#[from] PatternError),

    #[error("Result limit must be at least 1")]
    ZeroLimit,

    #[error("Failed to spawn search thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Coordinator thread panicked")]
    CoordinatorPanicked,
}

/// Where a session stands. Everything except `Running` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Running,
    /// The result limit was reached
    Finished,
    /// Cancelled from outside
    Stopped,
    /// A worker reported a generator failure
    Failed,
}

/// Final figures of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub status: SessionStatus,
    pub found: usize,
    pub limit: usize,
    pub total_hashes: u64,
    #[serde(rename = "elapsed_secs", serialize_with = "serialize_secs_f64")]
    pub elapsed: Duration,
    /// Seed for the next session's ETA estimate
    pub learned_rate: u64,
}

impl SessionSummary {
    /// Average keys per second over the whole session.
    pub fn average_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_hashes as f64 / secs
        } else {
            0.0
        }
    }
}

fn serialize_secs_f64<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64())
}

/// Receives everything a session reports. Called only from the
/// coordinator thread, one event at a time.
pub trait SearchEvents: Send + 'static {
    /// An accepted result; at most `limit` calls per session.
    fn on_found(&mut self, result: &FoundAddress);

    /// Aggregated statistics after a worker report.
    fn on_stats(&mut self, stats: &StatsSnapshot);

    /// The session's first generator failure. Never called twice.
    fn on_error(&mut self, message: &str);

    /// The session reached a terminal state. Always the last call.
    fn on_finished(&mut self, summary: &SessionSummary);
}

/// Options shared by every session a coordinator starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Number of workers; 0 means one per available core
    pub workers: usize,
    pub worker: WorkerConfig,
    /// Rate used for ETA until workers report
    pub initial_rate: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            workers: 0,
            worker: WorkerConfig::default(),
            initial_rate: DEFAULT_ASSUMED_RATE,
        }
    }
}

impl SearchOptions {
    /// Effective worker count, never below 1.
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }
}

/// Starts search sessions.
pub struct Coordinator {
    generator: Arc<dyn KeyGenerator>,
    options: SearchOptions,
}

impl Coordinator {
    /// Creates a coordinator drawing keys from `generator`.
    pub fn new(generator: Arc<dyn KeyGenerator>, options: SearchOptions) -> Self {
        Self { generator, options }
    }

    /// Validates raw pattern strings, then starts a session.
    ///
    /// Invalid input is rejected before any worker exists.
    pub fn start_search_raw<E: SearchEvents>(
        &self,
        prefix: &str,
        suffix: &str,
        network: Network,
        limit: usize,
        sink: E,
    ) -> Result<SessionHandle, SearchError> {
        let pattern = SearchPattern::new(prefix, suffix, network)?;
        self.start_search(pattern, limit, sink)
    }

    /// Spawns the workers and the coordinator thread for one session.
    pub fn start_search<E: SearchEvents>(
        &self,
        pattern: SearchPattern,
        limit: usize,
        sink: E,
    ) -> Result<SessionHandle, SearchError> {
        if limit == 0 {
            return Err(SearchError::ZeroLimit);
        }

        let num_workers = self.options.worker_count();
        let (event_tx, event_rx) = unbounded();
        let (cancel_tx, cancel_rx) = bounded(1);
        let (workers_tx, workers_rx) = bounded(1);

        let session = Session {
            pattern: pattern.clone(),
            limit,
            found: 0,
            status: SessionStatus::Running,
            error_reported: false,
            workers: Vec::new(),
            stats: StatsAggregator::new(self.options.initial_rate),
            sink,
        };

        // No worker exists yet, so a failure here leaves nothing to clean up.
        let thread = spawn_session(session, workers_rx, event_rx, cancel_rx)
            .map_err(SearchError::Spawn)?;

        let workers = match self.spawn_workers(num_workers, &pattern, event_tx) {
            Ok(workers) => workers,
            Err(e) => {
                drop(workers_tx);
                let _ = thread.join();
                return Err(e);
            }
        };

        if let Err(SendError(mut workers)) = workers_tx.send(workers) {
            stop_and_join(&mut workers);
            let _ = thread.join();
            return Err(SearchError::CoordinatorPanicked);
        }

        info!(
            network = %pattern.network(),
            %pattern,
            workers = num_workers,
            limit,
            "search started"
        );

        Ok(SessionHandle {
            cancel_tx,
            thread: Some(thread),
        })
    }

    /// Spawns worker threads and sends each its `Start` command.
    ///
    /// On failure every worker already running is stopped and joined.
    fn spawn_workers(
        &self,
        num_workers: usize,
        pattern: &SearchPattern,
        event_tx: Sender<WorkerMessage>,
    ) -> Result<Vec<WorkerHandle>, SearchError> {
        let mut workers = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            let (control_tx, control_rx) = unbounded();
            let generator = self.generator.clone();
            let event_tx = event_tx.clone();
            let config = self.options.worker;

            let spawned = thread::Builder::new()
                .name(format!("vanity-worker-{}", id))
                .spawn(move || {
                    let mut worker = CpuWorker::new(id, generator, control_rx, event_tx, config);
                    worker.run();
                });

            let thread = match spawned {
                Ok(thread) => thread,
                Err(e) => {
                    stop_and_join(&mut workers);
                    return Err(SearchError::Spawn(e));
                }
            };

            let _ = control_tx.send(WorkerCommand::Start(pattern.clone()));

            workers.push(WorkerHandle {
                id,
                control_tx,
                thread: Some(thread),
                last_stats: WorkerStats::default(),
            });
        }

        Ok(workers)
    }
}

/// Starts the coordinator thread. It waits for the worker handles before
/// running the session and exits quietly, without touching the sink, if the
/// handles never arrive.
fn spawn_session<E: SearchEvents>(
    mut session: Session<E>,
    workers: Receiver<Vec<WorkerHandle>>,
    events: Receiver<WorkerMessage>,
    cancel: Receiver<()>,
) -> std::io::Result<JoinHandle<Option<SessionSummary>>> {
    thread::Builder::new()
        .name("vanity-coordinator".into())
        .spawn(move || {
            session.workers = workers.recv().ok()?;
            Some(session.run(events, cancel))
        })
}

/// Coordinator-side view of one worker.
struct WorkerHandle {
    id: usize,
    /// Sending `Stop` here is the worker's cancellation signal
    control_tx: Sender<WorkerCommand>,
    thread: Option<JoinHandle<()>>,
    last_stats: WorkerStats,
}

fn stop_and_join(workers: &mut [WorkerHandle]) {
    for worker in workers.iter() {
        let _ = worker.control_tx.send(WorkerCommand::Stop);
    }
    for worker in workers.iter_mut() {
        if let Some(thread) = worker.thread.take() {
            if thread.join().is_err() {
                warn!(worker = worker.id, "worker thread panicked");
            }
        }
    }
}

/// Single-consumer actor state; lives on the coordinator thread.
struct Session<E> {
    pattern: SearchPattern,
    limit: usize,
    found: usize,
    status: SessionStatus,
    error_reported: bool,
    workers: Vec<WorkerHandle>,
    stats: StatsAggregator,
    sink: E,
}

impl<E: SearchEvents> Session<E> {
    fn run(mut self, events: Receiver<WorkerMessage>, cancel: Receiver<()>) -> SessionSummary {
        while self.status == SessionStatus::Running {
            select! {
                recv(events) -> message => match message {
                    Ok(message) => self.handle(message),
                    Err(_) => {
                        // Every worker exited without a terminal event
                        self.report_error("all workers exited unexpectedly".into());
                    }
                },
                recv(cancel) -> _ => {
                    info!("search cancelled");
                    self.finish(SessionStatus::Stopped);
                }
            }
        }

        stop_and_join(&mut self.workers);
        for worker in &self.workers {
            debug!(
                worker = worker.id,
                total_hashes = worker.last_stats.total_hashes,
                "worker joined"
            );
        }

        let summary = SessionSummary {
            status: self.status,
            found: self.found,
            limit: self.limit,
            total_hashes: self.stats.total_hashes(),
            elapsed: self.stats.elapsed(),
            learned_rate: self.stats.learned_rate(),
        };
        self.stats.clear_workers();

        info!(
            status = ?summary.status,
            found = summary.found,
            total_hashes = summary.total_hashes,
            "search ended"
        );
        self.sink.on_finished(&summary);
        summary
    }

    fn handle(&mut self, message: WorkerMessage) {
        let WorkerMessage { worker_id, event } = message;

        match event {
            WorkerEvent::Stats(stats) => {
                if let Some(worker) = self.workers.iter_mut().find(|w| w.id == worker_id) {
                    worker.last_stats = stats;
                }
                self.stats.record(worker_id, stats);
                let snapshot = self.stats.snapshot(&self.pattern);
                self.sink.on_stats(&snapshot);
            }
            WorkerEvent::Found(account) => {
                // Check before incrementing; only this thread touches `found`.
                if self.found >= self.limit {
                    debug!(worker = worker_id, "discarding result past the limit");
                    return;
                }

                self.found += 1;
                let result = FoundAddress {
                    address: account.address,
                    private_key: account.private_key,
                    worker_id,
                    index: self.found,
                };
                info!(worker = worker_id, address = %result.address, "result accepted");
                self.sink.on_found(&result);

                if self.found == self.limit {
                    self.finish(SessionStatus::Finished);
                }
            }
            WorkerEvent::Error { message } => {
                warn!(worker = worker_id, %message, "worker failed");
                self.report_error(message);
            }
        }
    }

    /// First error wins: one notification, one stop. Later ones are dropped.
    fn report_error(&mut self, message: String) {
        if self.error_reported {
            debug!(%message, "suppressing duplicate error");
            return;
        }
        self.error_reported = true;
        self.sink.on_error(&message);
        self.finish(SessionStatus::Failed);
    }

    /// Moves to a terminal state and tells every worker to stop.
    fn finish(&mut self, status: SessionStatus) {
        if self.status != SessionStatus::Running {
            return;
        }
        self.status = status;
        for worker in &self.workers {
            let _ = worker.control_tx.send(WorkerCommand::Stop);
        }
    }
}

/// Caller-side handle to a running session.
pub struct SessionHandle {
    cancel_tx: Sender<()>,
    thread: Option<JoinHandle<Option<SessionSummary>>>,
}

impl SessionHandle {
    /// Asks the session to stop. Safe to call any number of times, including
    /// after the session already ended.
    pub fn cancel(&self) {
        // Full: a cancel is already pending. Disconnected: already ended.
        let _ = self.cancel_tx.try_send(());
    }

    /// Returns true once the coordinator thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Returns a detached canceller, e.g. for a Ctrl-C handler.
    pub fn canceller(&self) -> impl Fn() + Send + Sync + 'static {
        let cancel_tx = self.cancel_tx.clone();
        move || {
            let _ = cancel_tx.try_send(());
        }
    }

    /// Waits for the session to end and returns its summary.
    pub fn wait(mut self) -> Result<SessionSummary, SearchError> {
        self.thread
            .take()
            .and_then(|thread| thread.join().ok().flatten())
            .ok_or(SearchError::CoordinatorPanicked)
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.cancel();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::crypto::{GeneratedAddress, GeneratorError};

    #[derive(Debug, Clone, PartialEq)]
    enum Recorded {
        Found(FoundAddress),
        Stats(u64),
        Error(String),
        Finished(SessionStatus),
    }

    struct Recorder(Sender<Recorded>);

    impl SearchEvents for Recorder {
        fn on_found(&mut self, result: &FoundAddress) {
            let _ = self.0.send(Recorded::Found(result.clone()));
        }
        fn on_stats(&mut self, stats: &StatsSnapshot) {
            let _ = self.0.send(Recorded::Stats(stats.total_hashes));
        }
        fn on_error(&mut self, message: &str) {
            let _ = self.0.send(Recorded::Error(message.into()));
        }
        fn on_finished(&mut self, summary: &SessionSummary) {
            let _ = self.0.send(Recorded::Finished(summary.status));
        }
    }

    fn recorder() -> (Recorder, Receiver<Recorded>) {
        let (tx, rx) = unbounded();
        (Recorder(tx), rx)
    }

    /// Every generated address matches any TRON prefix starting with `A`.
    struct AlwaysMatch(AtomicU64);

    impl KeyGenerator for AlwaysMatch {
        fn generate(&self, _network: Network) -> Result<GeneratedAddress, GeneratorError> {
            let n = self.0.fetch_add(1, Ordering::Relaxed);
            Ok(GeneratedAddress {
                address: format!("TA{:032}", n),
                private_key: format!("{:064x}", n),
            })
        }
    }

    /// Never matches; never fails.
    struct NeverMatch;

    impl KeyGenerator for NeverMatch {
        fn generate(&self, _network: Network) -> Result<GeneratedAddress, GeneratorError> {
            Ok(GeneratedAddress {
                address: "TZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZZ".into(),
                private_key: "11".repeat(32),
            })
        }
    }

    struct Broken;

    impl KeyGenerator for Broken {
        fn generate(&self, _network: Network) -> Result<GeneratedAddress, GeneratorError> {
            Err(GeneratorError::Unavailable("no curve library".into()))
        }
    }

    fn coordinator(generator: Arc<dyn KeyGenerator>, workers: usize) -> Coordinator {
        Coordinator::new(
            generator,
            SearchOptions {
                workers,
                worker: WorkerConfig {
                    batch_size: 64,
                    report_interval: Duration::from_millis(1),
                },
                initial_rate: DEFAULT_ASSUMED_RATE,
            },
        )
    }

    fn tron(prefix: &str) -> SearchPattern {
        SearchPattern::new(prefix, "", Network::Tron).unwrap()
    }

    #[test]
    fn test_cap_holds_under_many_producers() {
        let generator = Arc::new(AlwaysMatch(AtomicU64::new(0)));
        let (sink, events) = recorder();

        let handle = coordinator(generator, 8)
            .start_search(tron("A"), 5, sink)
            .unwrap();
        let summary = handle.wait().unwrap();

        assert_eq!(summary.status, SessionStatus::Finished);
        assert_eq!(summary.found, 5);

        let recorded: Vec<_> = events.try_iter().collect();
        let found: Vec<_> = recorded
            .iter()
            .filter_map(|r| match r {
                Recorded::Found(f) => Some(f.index),
                _ => None,
            })
            .collect();
        assert_eq!(found, vec![1, 2, 3, 4, 5]);
        assert_eq!(recorded.last(), Some(&Recorded::Finished(SessionStatus::Finished)));
    }

    #[test]
    fn test_limit_one_stops_everything() {
        let generator = Arc::new(AlwaysMatch(AtomicU64::new(0)));
        let (sink, events) = recorder();

        let handle = coordinator(generator, 4)
            .start_search(tron("A"), 1, sink)
            .unwrap();
        let summary = handle.wait().unwrap();
        assert_eq!(summary.found, 1);

        let recorded: Vec<_> = events.try_iter().collect();
        let first_found = recorded
            .iter()
            .position(|r| matches!(r, Recorded::Found(_)))
            .unwrap();
        // Only the terminal notification follows the accepted result
        assert_eq!(
            &recorded[first_found + 1..],
            &[Recorded::Finished(SessionStatus::Finished)]
        );
    }

    #[test]
    fn test_first_error_wins() {
        let (sink, events) = recorder();

        let handle = coordinator(Arc::new(Broken), 6)
            .start_search(tron("A"), 3, sink)
            .unwrap();
        let summary = handle.wait().unwrap();
        assert_eq!(summary.status, SessionStatus::Failed);

        let recorded: Vec<_> = events.try_iter().collect();
        assert_eq!(
            recorded,
            vec![
                Recorded::Error("Key generator unavailable: no curve library".into()),
                Recorded::Finished(SessionStatus::Failed),
            ]
        );
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let (sink, events) = recorder();

        let handle = coordinator(Arc::new(NeverMatch), 2)
            .start_search(tron("A"), 1, sink)
            .unwrap();

        // Wait for at least one stats report so the session is really running
        loop {
            match events.recv_timeout(Duration::from_secs(10)).unwrap() {
                Recorded::Stats(total) if total > 0 => break,
                _ => {}
            }
        }

        handle.cancel();
        handle.cancel();
        while !handle.is_finished() {
            thread::sleep(Duration::from_millis(5));
        }
        handle.cancel();

        let summary = handle.wait().unwrap();
        assert_eq!(summary.status, SessionStatus::Stopped);
        assert!(summary.total_hashes > 0);
        assert_eq!(summary.found, 0);

        let finished: Vec<_> = events
            .try_iter()
            .filter(|r| matches!(r, Recorded::Finished(_)))
            .collect();
        assert_eq!(finished, vec![Recorded::Finished(SessionStatus::Stopped)]);
    }

    #[test]
    fn test_invalid_pattern_rejected_before_spawn() {
        let (sink, events) = recorder();

        let result = coordinator(Arc::new(NeverMatch), 2).start_search_raw(
            "abc",
            "",
            Network::Tron,
            1,
            sink,
        );

        assert!(matches!(
            result,
            Err(SearchError::InvalidPattern(PatternError::LowercaseLeader('a')))
        ));
        // The sink was dropped without ever hearing from a session
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let (sink, _events) = recorder();
        let result = coordinator(Arc::new(NeverMatch), 1).start_search(tron("A"), 0, sink);
        assert!(matches!(result, Err(SearchError::ZeroLimit)));
    }

    #[test]
    fn test_worker_count_defaults_to_cores() {
        let options = SearchOptions::default();
        assert_eq!(options.worker_count(), num_cpus::get().max(1));
        let options = SearchOptions {
            workers: 3,
            ..Default::default()
        };
        assert_eq!(options.worker_count(), 3);
    }

    fn idle_session(sink: Recorder) -> Session<Recorder> {
        Session {
            pattern: tron("A"),
            limit: 1,
            found: 0,
            status: SessionStatus::Running,
            error_reported: false,
            workers: Vec::new(),
            stats: StatsAggregator::default(),
            sink,
        }
    }

    #[test]
    fn test_session_exits_quietly_when_startup_aborts() {
        let (sink, events) = recorder();
        let (_event_tx, event_rx) = unbounded();
        let (_cancel_tx, cancel_rx) = bounded(1);
        let (workers_tx, workers_rx) = bounded(1);

        let thread = spawn_session(idle_session(sink), workers_rx, event_rx, cancel_rx).unwrap();
        drop(workers_tx);

        assert_eq!(thread.join().unwrap(), None);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_session_owns_and_joins_handed_over_workers() {
        let (sink, events) = recorder();
        let (event_tx, event_rx) = unbounded();
        let (cancel_tx, cancel_rx) = bounded(1);
        let (workers_tx, workers_rx) = bounded(1);

        let thread = spawn_session(idle_session(sink), workers_rx, event_rx, cancel_rx).unwrap();
        let workers = coordinator(Arc::new(NeverMatch), 3)
            .spawn_workers(3, &tron("A"), event_tx)
            .unwrap();
        assert_eq!(workers.len(), 3);
        workers_tx.send(workers).unwrap();

        cancel_tx.send(()).unwrap();
        let summary = thread.join().unwrap().unwrap();
        assert_eq!(summary.status, SessionStatus::Stopped);

        let recorded: Vec<_> = events.try_iter().collect();
        assert_eq!(
            recorded.last(),
            Some(&Recorded::Finished(SessionStatus::Stopped))
        );
    }
}
