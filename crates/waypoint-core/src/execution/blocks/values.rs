//! Values block: a constant table emitted once per input row.

use std::sync::Arc;

use smallvec::SmallVec;
use waypoint_common::types::{MAX_REGISTERS, RegisterId, Value};

use super::{BlockError, BlockInput, BlockResult, ExecutionBlock};
use crate::execution::{BatchPool, DEFAULT_BATCH_SIZE, TupleBatch};

/// For every input row, emits every row of a fixed table.
///
/// Output rows carry the input row's registers followed by the table's
/// columns. A table row in progress survives across calls, so a single input
/// row may be spread over several output batches.
pub struct ValuesBlock {
    input: BlockInput,
    pool: Arc<BatchPool>,
    rows: Vec<Vec<Value>>,
    input_registers: usize,
    register_count: usize,
    clear_registers: SmallVec<[RegisterId; 4]>,
    /// Next table row to emit for the current input row.
    data_pos: usize,
}

impl ValuesBlock {
    /// Creates a values block with `width` columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a row is wider than `width` or the output would
    /// exceed the register limit.
    pub fn new(
        dependency: Box<dyn ExecutionBlock>,
        pool: Arc<BatchPool>,
        width: usize,
        rows: Vec<Vec<Value>>,
    ) -> Result<Self, BlockError> {
        let input_registers = dependency.register_count();
        let register_count = input_registers + width;
        if register_count > MAX_REGISTERS {
            return Err(BlockError::InvalidPlan(format!(
                "values block needs {register_count} registers, limit is {MAX_REGISTERS}"
            )));
        }
        if let Some(row) = rows.iter().find(|row| row.len() > width) {
            return Err(BlockError::InvalidPlan(format!(
                "values row has {} columns, expected at most {width}",
                row.len()
            )));
        }
        Ok(Self {
            input: BlockInput::new(Some(dependency), Arc::clone(&pool), DEFAULT_BATCH_SIZE),
            pool,
            rows,
            input_registers,
            register_count,
            clear_registers: SmallVec::new(),
            data_pos: 0,
        })
    }

    /// Sets the pull size and per-call output ceiling.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.input.set_batch_size(batch_size);
        self
    }

    /// Resets the given registers to null in every produced batch.
    ///
    /// # Errors
    ///
    /// Returns an error if a register is out of range.
    pub fn with_clear_registers(
        mut self,
        registers: impl IntoIterator<Item = RegisterId>,
    ) -> Result<Self, BlockError> {
        for reg in registers {
            if reg >= self.register_count {
                return Err(BlockError::InvalidPlan(format!(
                    "cannot clear register {reg} of {}",
                    self.register_count
                )));
            }
            self.clear_registers.push(reg);
        }
        Ok(self)
    }

    fn finish_row(&mut self, n: usize) {
        self.data_pos += n;
        if self.data_pos == self.rows.len() {
            self.data_pos = 0;
            self.input.advance();
        }
    }
}

impl ExecutionBlock for ValuesBlock {
    fn initialize_cursor(&mut self, items: Option<&TupleBatch>, pos: usize) -> Result<(), BlockError> {
        self.data_pos = 0;
        self.input.initialize_cursor(items, pos)
    }

    fn get_some(&mut self, at_most: usize) -> BlockResult {
        if at_most == 0 || self.rows.is_empty() {
            return Ok(None);
        }
        let limit = at_most.min(self.input.batch_size());
        let mut out: Option<TupleBatch> = None;
        let mut produced = 0;

        while produced < limit {
            if !self.input.ensure_row(limit - produced)? {
                break;
            }
            let n = (limit - produced).min(self.rows.len() - self.data_pos);
            {
                let Some((batch, row)) = self.input.current() else {
                    return Err(BlockError::Internal("values input lost its row".into()));
                };
                let out = out.get_or_insert_with(|| self.pool.request(limit, self.register_count));
                out.copy_row_from(produced, batch, row, self.input_registers);
                for k in 0..n {
                    let dst = produced + k;
                    out.copy_values_from_row(produced, dst, self.input_registers);
                    for (col, value) in self.rows[self.data_pos + k].iter().enumerate() {
                        out.set_value(dst, self.input_registers + col, value.clone());
                    }
                }
            }
            produced += n;
            self.finish_row(n);
        }

        Ok(out.map(|mut out| {
            out.shrink(produced);
            for &reg in &self.clear_registers {
                out.clear_register(reg);
            }
            out
        }))
    }

    fn skip_some(&mut self, at_most: usize) -> Result<usize, BlockError> {
        if at_most == 0 || self.rows.is_empty() {
            return Ok(0);
        }
        let mut skipped = 0;
        while skipped < at_most {
            if !self.input.ensure_row(at_most - skipped)? {
                break;
            }
            let n = (at_most - skipped).min(self.rows.len() - self.data_pos);
            skipped += n;
            self.finish_row(n);
        }
        Ok(skipped)
    }

    fn register_count(&self) -> usize {
        self.register_count
    }

    fn name(&self) -> &'static str {
        "Values"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::blocks::SingletonBlock;
    use crate::execution::blocks::testing::drain;

    fn column(n: i64) -> Vec<Vec<Value>> {
        (0..n).map(|i| vec![Value::from(i)]).collect()
    }

    /// Singleton -> Values(2 rows) -> Values(100 rows): 200 rows of 2 registers.
    fn chain(pool: &Arc<BatchPool>) -> ValuesBlock {
        let singleton = SingletonBlock::new(Arc::clone(pool), 0);
        let outer = ValuesBlock::new(Box::new(singleton), Arc::clone(pool), 1, column(2)).unwrap();
        ValuesBlock::new(Box::new(outer), Arc::clone(pool), 1, column(100)).unwrap()
    }

    #[test]
    fn test_chain_get_some() {
        let pool = Arc::new(BatchPool::default());
        let mut block = chain(&pool);
        block.initialize_cursor(None, 0).unwrap();

        let first = block.get_some(10).unwrap().unwrap();
        assert_eq!(first.row_count(), 10);
        assert_eq!(first.register_count(), 2);
        assert_eq!(first.row(9), &[Value::Int64(0), Value::Int64(9)]);

        let rest = block.get_some(1000).unwrap().unwrap();
        assert_eq!(rest.row_count(), 190);
        assert_eq!(rest.row(90), &[Value::Int64(1), Value::Int64(0)]);
        assert_eq!(rest.row(189), &[Value::Int64(1), Value::Int64(99)]);

        assert!(block.get_some(1000).unwrap().is_none());
    }

    #[test]
    fn test_chain_skip_some() {
        let pool = Arc::new(BatchPool::default());
        let mut block = chain(&pool);
        block.initialize_cursor(None, 0).unwrap();
        assert_eq!(block.skip_some(10).unwrap(), 10);
        let rest = block.get_some(1000).unwrap().unwrap();
        assert_eq!(rest.row_count(), 190);
        assert_eq!(rest.row(0), &[Value::Int64(0), Value::Int64(10)]);
        assert_eq!(block.skip_some(10).unwrap(), 0);

        block.initialize_cursor(None, 0).unwrap();
        assert_eq!(block.skip_some(1000).unwrap(), 200);
        assert!(block.get_some(1).unwrap().is_none());
    }

    #[test]
    fn test_batch_size_caps_output() {
        let pool = Arc::new(BatchPool::default());
        let mut block = chain(&pool).with_batch_size(64);
        let sizes: Vec<usize> = std::iter::from_fn(|| block.get_some(1000).unwrap().map(|b| b.row_count())).collect();
        assert_eq!(sizes, vec![64, 64, 64, 8]);
    }

    #[test]
    fn test_reinitialize_repeats_rows() {
        let pool = Arc::new(BatchPool::default());
        let mut block = chain(&pool);
        block.initialize_cursor(None, 0).unwrap();
        let once = drain(&mut block, 7);
        block.initialize_cursor(None, 0).unwrap();
        block.initialize_cursor(None, 0).unwrap();
        assert_eq!(drain(&mut block, 33), once);
        assert_eq!(once.len(), 200);
    }

    #[test]
    fn test_clear_registers() {
        let pool = Arc::new(BatchPool::default());
        let mut block = chain(&pool).with_clear_registers([0]).unwrap();
        let batch = block.get_some(5).unwrap().unwrap();
        assert!(batch.rows().all(|row| row[0].is_null() && !row[1].is_null()));
        assert!(chain(&pool).with_clear_registers([2]).is_err());
    }

    #[test]
    fn test_rejects_wide_rows() {
        let pool = Arc::new(BatchPool::default());
        let singleton = SingletonBlock::new(Arc::clone(&pool), 0);
        let rows = vec![vec![Value::Null, Value::Null]];
        assert!(matches!(
            ValuesBlock::new(Box::new(singleton), pool, 1, rows),
            Err(BlockError::InvalidPlan(_))
        ));
    }
}
