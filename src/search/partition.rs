//! Batch partitioning of a ticket snapshot.

use std::ops::Range;

/// Splits `[0, record_count)` into contiguous batches.
///
/// The first batch holds `initial_batch_size` records and each following batch
/// doubles, capped at `max_batch_size` and by what remains. Small leading
/// batches reach the workers quickly; the larger tail keeps per-task overhead
/// low. Zero records give zero batches.
pub fn partition(
    record_count: usize,
    initial_batch_size: usize,
    max_batch_size: usize,
) -> Vec<Range<usize>> {
    let max_batch_size = max_batch_size.max(1);
    let mut size = initial_batch_size.clamp(1, max_batch_size);
    let mut batches = Vec::new();
    let mut start = 0usize;

    while start < record_count {
        let len = size.min(record_count - start);
        batches.push(start..start + len);
        start += len;
        size = size.saturating_mul(2).min(max_batch_size);
    }

    batches
}
