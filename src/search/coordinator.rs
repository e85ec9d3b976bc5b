//! FilterCoordinator - main API for filtering a ticket snapshot.

use std::ops::Range;
use std::sync::Arc;

use parking_lot::Mutex;

use super::evaluate::evaluate_batch;
use super::generation::Generation;
use super::mask::RowFilter;
use super::partition::partition;
use super::sink::{update_channel, FilterSink, FilterUpdate, FilterUpdates};
use crate::cancel::GenerationTracker;
use crate::config::FilterConfig;
use crate::error::Result;
use crate::query::CompiledQuery;
use crate::types::TicketSnapshot;

#[derive(Debug, Default)]
struct CoordinatorState {
    live: Option<Arc<Generation>>,
    shut_down: bool,
}

/// Owns the worker pool and the live generation.
///
/// All requests are expected from one owning thread (typically the thread
/// that drives the view). Each request cancels the previous generation before
/// any of its own batches are submitted, and only the live generation can
/// ever publish.
pub struct FilterCoordinator {
    pool: rayon::ThreadPool,
    worker_threads: usize,
    config: FilterConfig,
    tracker: GenerationTracker,
    sink: Arc<dyn FilterSink>,
    state: Mutex<CoordinatorState>,
}

impl std::fmt::Debug for FilterCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterCoordinator")
            .field("worker_threads", &self.worker_threads)
            .field("config", &self.config)
            .field("generation", &self.tracker.current_version())
            .field("sink", &"<sink>")
            .finish()
    }
}

impl FilterCoordinator {
    /// Creates a coordinator that publishes results to `sink`.
    pub fn new(config: FilterConfig, sink: impl FilterSink) -> Result<Self> {
        Self::with_tracker(config, GenerationTracker::new(), Arc::new(sink))
    }

    /// Creates a coordinator together with a channel receiver for its results.
    pub fn with_channel(config: FilterConfig) -> Result<(Self, FilterUpdates)> {
        let tracker = GenerationTracker::new();
        let (sink, updates) = update_channel(tracker.clone());
        let coordinator = Self::with_tracker(config, tracker, Arc::new(sink))?;
        Ok((coordinator, updates))
    }

    fn with_tracker(
        config: FilterConfig,
        tracker: GenerationTracker,
        sink: Arc<dyn FilterSink>,
    ) -> Result<Self> {
        config.validate()?;
        let worker_threads = config.resolved_worker_threads();
        let thread_name_prefix = config.thread_name_prefix.clone();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_threads)
            .thread_name(move |index| format!("{thread_name_prefix}-{index}"))
            .panic_handler(|_| log::error!("ticket filter worker panicked, batch dropped"))
            .build()?;

        log::info!(
            "ticket filter coordinator started workers={} initial_batch={} max_batch={}",
            worker_threads,
            config.initial_batch_size,
            config.max_batch_size,
        );

        Ok(Self {
            pool,
            worker_threads,
            config,
            tracker,
            sink,
            state: Mutex::new(CoordinatorState::default()),
        })
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The most recently started generation.
    pub fn current_generation(&self) -> u64 {
        self.tracker.current_version()
    }

    pub fn is_live(&self, generation: u64) -> bool {
        self.tracker.is_live(generation)
    }

    /// Starts filtering `tickets` with `query` and returns the generation id.
    ///
    /// The previous generation is cancelled first; its result will never be
    /// published. An empty query publishes [`RowFilter::IncludeAll`] and an
    /// empty snapshot publishes an empty mask, both before this returns.
    /// Everything else is published from a worker once the last batch is in.
    /// Returns `None` after [`shutdown`](Self::shutdown).
    pub fn compute_filter(&self, tickets: &TicketSnapshot, query: &CompiledQuery) -> Option<u64> {
        let mut state = self.state.lock();
        if state.shut_down {
            log::debug!("ticket filter request dropped after shutdown");
            return None;
        }
        self.cancel_live(&mut state);
        let id = self.tracker.next_version();

        if query.is_empty() {
            log::debug!("ticket filter generation={id} matches everything");
            self.sink.publish(FilterUpdate {
                generation: id,
                filter: RowFilter::IncludeAll,
            });
            return Some(id);
        }

        let batches = partition(
            tickets.len(),
            self.config.initial_batch_size,
            self.config.max_batch_size,
        );
        let generation = Arc::new(Generation::new(
            id,
            self.tracker.token_for_version(id),
            tickets.len(),
            batches.len(),
        ));
        state.live = Some(generation.clone());
        drop(state);

        log::debug!(
            "ticket filter generation={} records={} terms={} batches={}",
            id,
            tickets.len(),
            query.len(),
            batches.len(),
        );

        if generation.publish_if_empty(self.sink.as_ref()) {
            return Some(id);
        }

        for batch in batches {
            let generation = generation.clone();
            let tickets = tickets.clone();
            let query = query.clone();
            let sink = self.sink.clone();
            self.pool.spawn(move || {
                run_batch(&generation, &tickets, &query, batch, sink.as_ref());
            });
        }

        Some(id)
    }

    /// Cancels the live generation without starting a new one.
    pub fn cancel(&self) {
        let mut state = self.state.lock();
        self.cancel_live(&mut state);
        self.tracker.next_version();
    }

    /// Cancels the live generation and drops all further requests.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        state.shut_down = true;
        self.cancel_live(&mut state);
        self.tracker.next_version();
    }

    fn cancel_live(&self, state: &mut CoordinatorState) {
        if let Some(previous) = state.live.take() {
            if previous.cancel() {
                log::debug!("ticket filter generation={} cancelled", previous.id());
            }
        }
    }
}

impl Drop for FilterCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_batch(
    generation: &Generation,
    tickets: &TicketSnapshot,
    query: &CompiledQuery,
    batch: Range<usize>,
    sink: &dyn FilterSink,
) {
    let Some(slice) = tickets.as_slice().get(batch.clone()) else {
        return;
    };
    match evaluate_batch(slice, query.terms(), generation.cancel_token()) {
        Some(mask) => {
            generation.complete_batch(batch, &mask, sink);
        }
        None => log::trace!(
            "ticket filter batch abandoned generation={} start={} len={}",
            generation.id(),
            batch.start,
            batch.len(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    use crate::search::ticket_matches;
    use crate::types::Ticket;

    const WAIT: Duration = Duration::from_secs(10);
    const QUIET: Duration = Duration::from_millis(200);

    fn single_worker() -> FilterConfig {
        FilterConfig {
            worker_threads: Some(1),
            ..FilterConfig::default()
        }
    }

    fn recording(
        config: FilterConfig,
    ) -> (FilterCoordinator, mpsc::Receiver<FilterUpdate>) {
        let (sender, receiver) = mpsc::channel();
        let sender = Mutex::new(sender);
        let coordinator = FilterCoordinator::new(config, move |update: FilterUpdate| {
            let _ = sender.lock().send(update);
        })
        .expect("coordinator");
        (coordinator, receiver)
    }

    /// Occupies the single worker until the returned sender is dropped.
    fn block_worker(coordinator: &FilterCoordinator) -> mpsc::Sender<()> {
        let (release, gate) = mpsc::channel::<()>();
        coordinator.pool.spawn(move || {
            let _ = gate.recv();
        });
        release
    }

    fn tickets(count: u64) -> TicketSnapshot {
        TicketSnapshot::from_tickets(
            (1..=count)
                .map(|id| {
                    let status = if id % 3 == 0 { "closed" } else { "open" };
                    Ticket::new(id)
                        .with_field("summary", format!("ticket number {id}"))
                        .with_field("status", status)
                })
                .collect(),
        )
    }

    #[test]
    fn empty_query_publishes_include_all_synchronously() {
        let (coordinator, published) = recording(single_worker());
        let id = coordinator
            .compute_filter(&tickets(10), &CompiledQuery::compile("  "))
            .expect("accepted");
        let update = published.try_recv().expect("published before returning");
        assert_eq!(update.generation, id);
        assert!(update.filter.is_include_all());
    }

    #[test]
    fn empty_snapshot_publishes_empty_mask_synchronously() {
        let (coordinator, published) = recording(single_worker());
        let id = coordinator
            .compute_filter(&TicketSnapshot::default(), &CompiledQuery::compile("bug"))
            .expect("accepted");
        let update = published.try_recv().expect("published before returning");
        assert_eq!(update.generation, id);
        assert_eq!(update.filter.matched_count(), Some(0));
    }

    #[test]
    fn result_matches_sequential_evaluation() {
        let config = FilterConfig {
            worker_threads: Some(4),
            ..FilterConfig::default()
        };
        let (coordinator, published) = recording(config);
        let snapshot = tickets(2_500);
        let query = CompiledQuery::compile("status:open -summary:7");

        let id = coordinator.compute_filter(&snapshot, &query).expect("accepted");
        let update = published.recv_timeout(WAIT).expect("published");
        assert_eq!(update.generation, id);

        let expected: Vec<usize> = snapshot
            .iter()
            .enumerate()
            .filter(|(_, ticket)| ticket_matches(ticket, query.terms()))
            .map(|(index, _)| index)
            .collect();
        let mask = update.filter.mask().expect("mask");
        assert_eq!(mask.iter_ones().collect::<Vec<_>>(), expected);
        assert!(published.recv_timeout(QUIET).is_err());
    }

    #[test]
    fn overlapping_requests_publish_only_the_latest() {
        let (coordinator, published) = recording(single_worker());
        let release = block_worker(&coordinator);
        let snapshot = tickets(300);

        let first = coordinator
            .compute_filter(&snapshot, &CompiledQuery::compile("closed"))
            .expect("accepted");
        let second = coordinator
            .compute_filter(&snapshot, &CompiledQuery::compile("status:open"))
            .expect("accepted");
        assert!(second > first);
        assert!(!coordinator.is_live(first));
        drop(release);

        let update = published.recv_timeout(WAIT).expect("published");
        assert_eq!(update.generation, second);
        assert_eq!(update.filter.matched_count(), Some(200));
        assert!(published.recv_timeout(QUIET).is_err());
    }

    #[test]
    fn cancelled_generation_never_publishes() {
        let (coordinator, published) = recording(single_worker());
        let release = block_worker(&coordinator);

        coordinator
            .compute_filter(&tickets(500), &CompiledQuery::compile("open"))
            .expect("accepted");
        coordinator.cancel();
        drop(release);

        // Runs after every batch queued before it on the single worker.
        coordinator.pool.install(|| ());
        assert!(published.recv_timeout(QUIET).is_err());
    }

    #[test]
    fn empty_query_supersedes_running_generation() {
        let (coordinator, published) = recording(single_worker());
        let release = block_worker(&coordinator);
        let snapshot = tickets(100);

        coordinator
            .compute_filter(&snapshot, &CompiledQuery::compile("open"))
            .expect("accepted");
        let everything = coordinator
            .compute_filter(&snapshot, &CompiledQuery::compile(""))
            .expect("accepted");
        drop(release);
        coordinator.pool.install(|| ());

        let update = published.try_recv().expect("include all");
        assert_eq!(update.generation, everything);
        assert!(update.filter.is_include_all());
        assert!(published.recv_timeout(QUIET).is_err());
    }

    #[test]
    fn requests_after_shutdown_are_dropped() {
        let (coordinator, published) = recording(single_worker());
        coordinator.shutdown();
        assert!(coordinator
            .compute_filter(&tickets(10), &CompiledQuery::compile("open"))
            .is_none());
        assert!(coordinator
            .compute_filter(&tickets(10), &CompiledQuery::compile(""))
            .is_none());
        assert!(published.recv_timeout(QUIET).is_err());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = FilterConfig {
            initial_batch_size: 0,
            ..FilterConfig::default()
        };
        assert!(FilterCoordinator::new(config, |_: FilterUpdate| {}).is_err());
    }
}
