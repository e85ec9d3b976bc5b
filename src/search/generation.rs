//! One filtering request's unit of work.

use std::ops::Range;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use crate::cancel::CancellationToken;

use super::mask::{InclusionMask, RowFilter};
use super::sink::{FilterSink, FilterUpdate};

/// Outstanding-batch value that no completion can count down to zero.
const POISONED: usize = usize::MAX;

#[derive(Debug)]
struct GenerationState {
    outstanding: usize,
    mask: InclusionMask,
}

/// A generation: its cancellation token plus the shared mask and counter.
///
/// The mask and the outstanding counter live under one lock. Cancellation
/// poisons the counter under that lock, so once [`cancel`](Self::cancel)
/// returns no completion of this generation can publish.
#[derive(Debug)]
pub(crate) struct Generation {
    id: u64,
    cancel_token: CancellationToken,
    started_at: Instant,
    state: Mutex<GenerationState>,
}

impl Generation {
    pub(crate) fn new(
        id: u64,
        cancel_token: CancellationToken,
        record_count: usize,
        batch_count: usize,
    ) -> Self {
        Self {
            id,
            cancel_token,
            started_at: Instant::now(),
            state: Mutex::new(GenerationState {
                outstanding: batch_count,
                mask: InclusionMask::new(record_count),
            }),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Permanently suppresses publication for this generation.
    ///
    /// Returns `true` if the generation was still running.
    pub(crate) fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        let was_running = state.outstanding != POISONED;
        state.outstanding = POISONED;
        was_running
    }

    /// Publishes immediately if there are no batches at all.
    pub(crate) fn publish_if_empty(&self, sink: &dyn FilterSink) -> bool {
        let mut state = self.state.lock();
        if state.outstanding != 0 {
            return false;
        }
        self.publish_locked(&mut state, sink);
        true
    }

    /// Merges a finished batch and publishes when it was the last one.
    ///
    /// Returns `true` if this call published the generation's filter.
    pub(crate) fn complete_batch(
        &self,
        batch: Range<usize>,
        batch_mask: &InclusionMask,
        sink: &dyn FilterSink,
    ) -> bool {
        let mut state = self.state.lock();
        if state.outstanding == POISONED {
            return false;
        }
        state.mask.merge_at(batch.start, batch_mask);
        state.outstanding -= 1;
        if state.outstanding != 0 {
            return false;
        }
        self.publish_locked(&mut state, sink);
        true
    }

    fn publish_locked(&self, state: &mut GenerationState, sink: &dyn FilterSink) {
        state.outstanding = POISONED;
        let mask = std::mem::take(&mut state.mask);
        log::debug!(
            "ticket filter published generation={} matched={} records={} elapsed_ms={}",
            self.id,
            mask.count_ones(),
            mask.len(),
            self.started_at.elapsed().as_millis(),
        );
        sink.publish(FilterUpdate {
            generation: self.id,
            filter: RowFilter::Matching(Arc::new(mask)),
        });
    }
}
