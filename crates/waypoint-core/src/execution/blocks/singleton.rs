//! Singleton block: the root of every pipeline.

use std::sync::Arc;

use waypoint_common::types::Value;

use super::{BlockError, BlockResult, ExecutionBlock};
use crate::execution::{BatchPool, TupleBatch};

/// Produces exactly one row.
///
/// The row is null unless `initialize_cursor` was given a start batch, in
/// which case it carries the registers of the selected start row.
pub struct SingletonBlock {
    pool: Arc<BatchPool>,
    register_count: usize,
    seed: Option<Vec<Value>>,
    done: bool,
}

impl SingletonBlock {
    /// Creates a singleton producing rows of `register_count` registers.
    #[must_use]
    pub fn new(pool: Arc<BatchPool>, register_count: usize) -> Self {
        Self {
            pool,
            register_count,
            seed: None,
            done: false,
        }
    }
}

impl ExecutionBlock for SingletonBlock {
    fn initialize_cursor(&mut self, items: Option<&TupleBatch>, pos: usize) -> Result<(), BlockError> {
        self.seed = match items {
            Some(items) if pos >= items.row_count() => {
                return Err(BlockError::InvalidCursor {
                    pos,
                    rows: items.row_count(),
                });
            }
            Some(items) => {
                let width = self.register_count.min(items.register_count());
                Some(items.row(pos)[..width].to_vec())
            }
            None => None,
        };
        self.done = false;
        Ok(())
    }

    fn get_some(&mut self, at_most: usize) -> BlockResult {
        if at_most == 0 || self.done {
            return Ok(None);
        }
        self.done = true;
        let mut batch = self.pool.request(1, self.register_count);
        if let Some(seed) = &self.seed {
            for (reg, value) in seed.iter().enumerate() {
                batch.set_value(0, reg, value.clone());
            }
        }
        Ok(Some(batch))
    }

    fn skip_some(&mut self, at_most: usize) -> Result<usize, BlockError> {
        if at_most == 0 || self.done {
            return Ok(0);
        }
        self.done = true;
        Ok(1)
    }

    fn register_count(&self) -> usize {
        self.register_count
    }

    fn name(&self) -> &'static str {
        "Singleton"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_row_then_end() {
        let mut block = SingletonBlock::new(Arc::new(BatchPool::default()), 2);
        let batch = block.get_some(10).unwrap().unwrap();
        assert_eq!(batch.row_count(), 1);
        assert_eq!(batch.register_count(), 2);
        assert!(block.get_some(10).unwrap().is_none());
        assert_eq!(block.skip_some(10).unwrap(), 0);
    }

    #[test]
    fn test_seeded_from_start_row() {
        let items = TupleBatch::from_rows(
            1,
            vec![vec![Value::from("a")], vec![Value::from("b")]],
        );
        let mut block = SingletonBlock::new(Arc::new(BatchPool::default()), 3);
        block.initialize_cursor(Some(&items), 1).unwrap();
        block.initialize_cursor(Some(&items), 1).unwrap();
        let batch = block.get_some(1).unwrap().unwrap();
        assert_eq!(batch.value(0, 0).as_str(), Some("b"));
        assert!(batch.value(0, 2).is_null());
    }

    #[test]
    fn test_invalid_cursor() {
        let items = TupleBatch::new(1, 1);
        let mut block = SingletonBlock::new(Arc::new(BatchPool::default()), 1);
        assert_eq!(
            block.initialize_cursor(Some(&items), 1),
            Err(BlockError::InvalidCursor { pos: 1, rows: 1 })
        );
    }

    #[test]
    fn test_skip_then_reinitialize() {
        let mut block = SingletonBlock::new(Arc::new(BatchPool::default()), 0);
        assert_eq!(block.skip_some(0).unwrap(), 0);
        assert_eq!(block.skip_some(5).unwrap(), 1);
        block.initialize_cursor(None, 0).unwrap();
        assert_eq!(block.get_some(5).unwrap().map(|b| b.row_count()), Some(1));
    }
}
