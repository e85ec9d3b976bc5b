//! Delivery of published filters to the caller's context.

use tokio::sync::mpsc;

use crate::cancel::GenerationTracker;

use super::mask::RowFilter;

/// The single result of one filtering generation.
#[derive(Debug, Clone)]
pub struct FilterUpdate {
    pub generation: u64,
    pub filter: RowFilter,
}

/// Receives published filters.
///
/// `publish` runs on a worker thread (or on the requesting thread for the
/// fast paths) while the generation lock is held, so implementations should
/// only hand the update off to the caller's context.
pub trait FilterSink: Send + Sync + 'static {
    fn publish(&self, update: FilterUpdate);
}

impl<F> FilterSink for F
where
    F: Fn(FilterUpdate) + Send + Sync + 'static,
{
    fn publish(&self, update: FilterUpdate) {
        self(update)
    }
}

/// Sink that queues updates on an unbounded tokio channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<FilterUpdate>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::UnboundedSender<FilterUpdate>) -> Self {
        Self { sender }
    }
}

impl FilterSink for ChannelSink {
    fn publish(&self, update: FilterUpdate) {
        if self.sender.send(update).is_err() {
            log::trace!("ticket filter update dropped, receiver closed");
        }
    }
}

/// Caller-side end of a [`ChannelSink`].
///
/// Updates whose generation was superseded after they were queued are
/// dropped here, so the view never applies a stale filter.
#[derive(Debug)]
pub struct FilterUpdates {
    receiver: mpsc::UnboundedReceiver<FilterUpdate>,
    tracker: GenerationTracker,
}

impl FilterUpdates {
    pub(crate) fn new(
        receiver: mpsc::UnboundedReceiver<FilterUpdate>,
        tracker: GenerationTracker,
    ) -> Self {
        Self { receiver, tracker }
    }

    /// Waits for the next update of the live generation.
    ///
    /// Returns `None` once the coordinator is gone.
    pub async fn recv(&mut self) -> Option<FilterUpdate> {
        loop {
            let update = self.receiver.recv().await?;
            if self.is_live(&update) {
                return Some(update);
            }
        }
    }

    /// Blocking variant of [`recv`](Self::recv) for callers outside a runtime.
    pub fn blocking_recv(&mut self) -> Option<FilterUpdate> {
        loop {
            let update = self.receiver.blocking_recv()?;
            if self.is_live(&update) {
                return Some(update);
            }
        }
    }

    /// Drains queued updates without waiting and returns the live one, if any.
    pub fn try_latest(&mut self) -> Option<FilterUpdate> {
        let mut latest = None;
        while let Ok(update) = self.receiver.try_recv() {
            if self.is_live(&update) {
                latest = Some(update);
            }
        }
        latest
    }

    fn is_live(&self, update: &FilterUpdate) -> bool {
        let live = self.tracker.is_live(update.generation);
        if !live {
            log::trace!(
                "ticket filter stale update dropped generation={} live={}",
                update.generation,
                self.tracker.current_version()
            );
        }
        live
    }
}

/// Creates a connected sink/receiver pair sharing `tracker`.
pub(crate) fn update_channel(tracker: GenerationTracker) -> (ChannelSink, FilterUpdates) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelSink::new(sender), FilterUpdates::new(receiver, tracker))
}
