//! Generation-based cancellation for filtering work.
//!
//! Every filtering request takes a new version from the [`GenerationTracker`].
//! Tokens handed to worker tasks remember the version they were created for
//! and report cancelled as soon as the tracker moves past it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Tracks the live filtering generation.
///
/// Cloning the tracker shares the same counter, so a receiver on the caller
/// side can tell whether an update still belongs to the live generation.
#[derive(Debug, Clone, Default)]
pub struct GenerationTracker {
    active_version: Arc<AtomicU64>,
}

impl GenerationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the active version and returns the new version number.
    ///
    /// Tokens created for older versions report cancelled from now on.
    pub fn next_version(&self) -> u64 {
        self.active_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Returns the current active version without incrementing.
    pub fn current_version(&self) -> u64 {
        self.active_version.load(Ordering::SeqCst)
    }

    pub fn is_live(&self, version: u64) -> bool {
        self.current_version() == version
    }

    /// Creates a cancellation token bound to `version`.
    pub fn token_for_version(&self, version: u64) -> CancellationToken {
        CancellationToken {
            active_version: Some(self.active_version.clone()),
            version,
        }
    }
}

/// A cooperative cancellation token for one generation's worker tasks.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    /// `None` for tokens that are never cancelled.
    active_version: Option<Arc<AtomicU64>>,
    version: u64,
}

impl CancellationToken {
    /// Creates a cancellation token that is never cancelled.
    #[inline]
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Checks if this token is still active.
    ///
    /// Returns `Some(())` if still active, `None` if cancelled, so callers can
    /// bail out with `?`.
    #[inline]
    pub fn is_cancelled(&self) -> Option<()> {
        match &self.active_version {
            Some(active) if active.load(Ordering::Relaxed) != self.version => None,
            _ => Some(()),
        }
    }
}
