//! Buffering of dependency output.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::execution::{BatchPool, TupleBatch};

use super::{BlockError, ExecutionBlock};

/// The input side of a block with one dependency.
///
/// Keeps the batches pulled from the dependency and a cursor into the front
/// one. A new batch is pulled only once the buffer is empty, and a batch is
/// handed back to the pool as soon as its last row has been consumed.
pub struct BlockInput {
    dependency: Option<Box<dyn ExecutionBlock>>,
    buffer: VecDeque<TupleBatch>,
    pos: usize,
    done: bool,
    pool: Arc<BatchPool>,
    batch_size: usize,
}

impl BlockInput {
    /// Creates the input side over `dependency`.
    ///
    /// Without a dependency the input is empty.
    #[must_use]
    pub fn new(dependency: Option<Box<dyn ExecutionBlock>>, pool: Arc<BatchPool>, batch_size: usize) -> Self {
        Self {
            dependency,
            buffer: VecDeque::new(),
            pos: 0,
            done: false,
            pool,
            batch_size: batch_size.max(1),
        }
    }

    /// Returns the register count of the dependency's rows.
    #[must_use]
    pub fn register_count(&self) -> usize {
        self.dependency.as_ref().map_or(0, |dep| dep.register_count())
    }

    /// Returns the batch pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<BatchPool> {
        &self.pool
    }

    /// Sets the number of rows requested per pull.
    pub fn set_batch_size(&mut self, batch_size: usize) {
        self.batch_size = batch_size.max(1);
    }

    /// Returns the number of rows requested per pull.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Forwards a cursor reset to the dependency and drops buffered rows.
    ///
    /// # Errors
    ///
    /// Returns the dependency's error.
    pub fn initialize_cursor(&mut self, items: Option<&TupleBatch>, pos: usize) -> Result<(), BlockError> {
        for batch in self.buffer.drain(..) {
            self.pool.give_back(batch);
        }
        self.pos = 0;
        self.done = false;
        if let Some(dependency) = self.dependency.as_mut() {
            dependency.initialize_cursor(items, pos)?;
        }
        Ok(())
    }

    /// Makes sure a current row is available, pulling from the dependency
    /// when the buffer is empty. Returns false at end of input.
    ///
    /// # Errors
    ///
    /// Returns the dependency's error.
    pub fn ensure_row(&mut self, at_most: usize) -> Result<bool, BlockError> {
        if !self.buffer.is_empty() {
            return Ok(true);
        }
        if self.done {
            return Ok(false);
        }
        let Some(dependency) = self.dependency.as_mut() else {
            self.done = true;
            return Ok(false);
        };
        let fetch = self.batch_size.min(at_most).max(1);
        match dependency.get_some(fetch)? {
            Some(batch) if !batch.is_empty() => {
                tracing::trace!(rows = batch.row_count(), from = dependency.name(), "pulled batch");
                self.pos = 0;
                self.buffer.push_back(batch);
                Ok(true)
            }
            Some(batch) => {
                self.pool.give_back(batch);
                Err(BlockError::Internal(format!(
                    "{} returned an empty batch",
                    dependency.name()
                )))
            }
            None => {
                self.done = true;
                Ok(false)
            }
        }
    }

    /// Returns the current batch and row, if any.
    #[must_use]
    pub fn current(&self) -> Option<(&TupleBatch, usize)> {
        self.buffer.front().map(|batch| (batch, self.pos))
    }

    /// Moves past the current row, releasing the batch once consumed.
    pub fn advance(&mut self) {
        let Some(front) = self.buffer.front() else {
            return;
        };
        self.pos += 1;
        if self.pos >= front.row_count() {
            if let Some(batch) = self.buffer.pop_front() {
                self.pool.give_back(batch);
            }
            self.pos = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::blocks::{SingletonBlock, ValuesBlock};
    use waypoint_common::Value;

    struct CountingBlock {
        inner: ValuesBlock,
        pulls: Arc<parking_lot::Mutex<Vec<usize>>>,
    }

    impl ExecutionBlock for CountingBlock {
        fn initialize_cursor(&mut self, items: Option<&TupleBatch>, pos: usize) -> Result<(), BlockError> {
            self.inner.initialize_cursor(items, pos)
        }

        fn get_some(&mut self, at_most: usize) -> super::super::BlockResult {
            self.pulls.lock().push(at_most);
            self.inner.get_some(at_most)
        }

        fn skip_some(&mut self, at_most: usize) -> Result<usize, BlockError> {
            self.inner.skip_some(at_most)
        }

        fn register_count(&self) -> usize {
            self.inner.register_count()
        }

        fn name(&self) -> &'static str {
            "Counting"
        }
    }

    fn counting_input(rows: i64, batch_size: usize) -> (BlockInput, Arc<parking_lot::Mutex<Vec<usize>>>) {
        let pool = Arc::new(BatchPool::default());
        let data = (0..rows).map(|i| vec![Value::from(i)]).collect();
        let singleton = SingletonBlock::new(Arc::clone(&pool), 0);
        let values = ValuesBlock::new(Box::new(singleton), Arc::clone(&pool), 1, data).unwrap();
        let pulls = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let block = CountingBlock {
            inner: values,
            pulls: Arc::clone(&pulls),
        };
        let input = BlockInput::new(Some(Box::new(block)), Arc::new(BatchPool::default()), batch_size);
        (input, pulls)
    }

    #[test]
    fn test_pulls_lazily() {
        let (mut input, pulls) = counting_input(5, 2);
        input.initialize_cursor(None, 0).unwrap();

        let mut seen = Vec::new();
        while input.ensure_row(100).unwrap() {
            let (batch, row) = input.current().unwrap();
            seen.push(batch.value(row, 0).as_int64().unwrap());
            // Buffer holds exactly one batch at a time
            assert_eq!(input.buffer.len(), 1);
            input.advance();
        }
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert!(input.done && input.buffer.is_empty());
        // Three data pulls plus the one that observed the end
        assert_eq!(*pulls.lock(), vec![2, 2, 2, 2]);
    }

    #[test]
    fn test_fetch_size_follows_at_most() {
        let (mut input, pulls) = counting_input(5, 1000);
        input.initialize_cursor(None, 0).unwrap();
        assert!(input.ensure_row(3).unwrap());
        assert_eq!(*pulls.lock(), vec![3]);
    }

    #[test]
    fn test_batches_return_to_pool() {
        let (mut input, _) = counting_input(4, 2);
        input.initialize_cursor(None, 0).unwrap();
        while input.ensure_row(10).unwrap() {
            input.advance();
        }
        assert_eq!(input.pool().stats().returned, 2);
    }

    #[test]
    fn test_without_dependency() {
        let mut input = BlockInput::new(None, Arc::new(BatchPool::default()), 10);
        assert!(!input.ensure_row(10).unwrap());
        assert!(input.done && input.buffer.is_empty());
        assert_eq!(input.register_count(), 0);
    }
}
