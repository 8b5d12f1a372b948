//! Recycling of batch storage between blocks.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use waypoint_common::types::Value;

use super::TupleBatch;

/// Snapshot of pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Batches built on fresh storage.
    pub allocated: u64,
    /// Batches built on recycled storage.
    pub reused: u64,
    /// Batches handed back to the pool.
    pub returned: u64,
    /// Buffers currently held for reuse.
    pub idle: usize,
}

/// A shared allocator for [`TupleBatch`]es.
///
/// Blocks request output batches here and give consumed input batches back
/// once every row has been read. Returned cell buffers are kept for reuse up
/// to a fixed capacity; anything beyond that is dropped.
pub struct BatchPool {
    free: Mutex<Vec<Vec<Value>>>,
    capacity: usize,
    allocated: AtomicU64,
    reused: AtomicU64,
    returned: AtomicU64,
}

impl BatchPool {
    /// Default number of idle buffers kept.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Creates a pool that keeps at most `capacity` idle buffers.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::with_capacity(capacity.min(Self::DEFAULT_CAPACITY))),
            capacity,
            allocated: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            returned: AtomicU64::new(0),
        }
    }

    /// Returns a null-filled batch of the given shape.
    pub fn request(&self, rows: usize, registers: usize) -> TupleBatch {
        let storage = self.free.lock().pop();
        match storage {
            Some(storage) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                TupleBatch::from_storage(storage, rows, registers)
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                TupleBatch::from_storage(Vec::with_capacity(rows * registers), rows, registers)
            }
        }
    }

    /// Takes a consumed batch back.
    pub fn give_back(&self, batch: TupleBatch) {
        self.returned.fetch_add(1, Ordering::Relaxed);
        let mut storage = batch.into_storage();
        storage.clear();
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(storage);
        }
    }

    /// Returns the current counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            returned: self.returned.load(Ordering::Relaxed),
            idle: self.free.lock().len(),
        }
    }
}

impl Default for BatchPool {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for BatchPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchPool")
            .field("capacity", &self.capacity)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_reuses_returned_storage() {
        let pool = BatchPool::new(4);
        let mut batch = pool.request(2, 3);
        batch.set_value(0, 0, Value::from(1i64));
        pool.give_back(batch);

        let again = pool.request(5, 1);
        assert_eq!(again.row_count(), 5);
        assert!(again.rows().all(|row| row[0].is_null()));

        let stats = pool.stats();
        assert_eq!(stats.allocated, 1);
        assert_eq!(stats.reused, 1);
        assert_eq!(stats.returned, 1);
        assert_eq!(stats.idle, 0);
    }

    #[test]
    fn test_capacity_bounds_idle_buffers() {
        let pool = BatchPool::new(1);
        pool.give_back(TupleBatch::new(1, 1));
        pool.give_back(TupleBatch::new(1, 1));
        assert_eq!(pool.stats().idle, 1);
        assert_eq!(pool.stats().returned, 2);
    }

    #[test]
    fn test_zero_capacity_never_keeps() {
        let pool = BatchPool::new(0);
        pool.give_back(pool.request(3, 3));
        assert_eq!(pool.stats().idle, 0);
        let _ = pool.request(1, 1);
        assert_eq!(pool.stats().allocated, 2);
    }
}
