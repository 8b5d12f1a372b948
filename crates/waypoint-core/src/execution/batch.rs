//! TupleBatch for batched row exchange.

use waypoint_common::types::{RegisterId, Value};

/// A fixed-shape table of rows x registers.
///
/// Both dimensions are fixed at construction. Cells start out null and are
/// written at most once by the block that owns the batch; downstream blocks
/// copy values out rather than mutating them.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleBatch {
    /// Number of rows.
    rows: usize,
    /// Number of registers per row.
    registers: usize,
    /// Row-major cell storage, `rows * registers` long.
    values: Vec<Value>,
}

impl TupleBatch {
    /// Creates a batch of null cells.
    #[must_use]
    pub fn new(rows: usize, registers: usize) -> Self {
        Self::from_storage(Vec::new(), rows, registers)
    }

    /// Creates a batch from row vectors, padding short rows with nulls.
    #[must_use]
    pub fn from_rows(registers: usize, rows: Vec<Vec<Value>>) -> Self {
        let mut batch = Self::new(rows.len(), registers);
        for (r, row) in rows.into_iter().enumerate() {
            for (reg, value) in row.into_iter().take(registers).enumerate() {
                batch.set_value(r, reg, value);
            }
        }
        batch
    }

    /// Reuses `storage` as the cell buffer of a new batch.
    pub(crate) fn from_storage(mut storage: Vec<Value>, rows: usize, registers: usize) -> Self {
        storage.clear();
        storage.resize(rows * registers, Value::Null);
        Self {
            rows,
            registers,
            values: storage,
        }
    }

    /// Releases the cell buffer so it can be recycled.
    pub(crate) fn into_storage(self) -> Vec<Value> {
        self.values
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Returns the number of registers per row.
    #[must_use]
    pub fn register_count(&self) -> usize {
        self.registers
    }

    /// Returns true if the batch holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Returns the value at `(row, reg)`, or `None` if out of range.
    #[must_use]
    pub fn get(&self, row: usize, reg: RegisterId) -> Option<&Value> {
        if row < self.rows && reg < self.registers {
            self.values.get(row * self.registers + reg)
        } else {
            None
        }
    }

    /// Returns the value at `(row, reg)`.
    ///
    /// # Panics
    ///
    /// Panics if the cell is out of range.
    #[must_use]
    pub fn value(&self, row: usize, reg: RegisterId) -> &Value {
        &self.values[self.index(row, reg)]
    }

    /// Writes a cell.
    ///
    /// # Panics
    ///
    /// Panics if the cell is out of range.
    pub fn set_value(&mut self, row: usize, reg: RegisterId, value: Value) {
        let idx = self.index(row, reg);
        debug_assert!(
            self.values[idx].is_null(),
            "register {reg} of row {row} written twice"
        );
        self.values[idx] = value;
    }

    /// Returns all registers of a row.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Value] {
        assert!(row < self.rows, "row {row} out of range ({} rows)", self.rows);
        &self.values[row * self.registers..(row + 1) * self.registers]
    }

    /// Iterates over rows.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Copies the first `registers` values of `src[src_row]` into `self[dst_row]`.
    ///
    /// Used to inherit the registers of the input row that produced an
    /// output row.
    pub fn copy_row_from(&mut self, dst_row: usize, src: &TupleBatch, src_row: usize, registers: usize) {
        let registers = registers.min(src.registers).min(self.registers);
        let dst = dst_row * self.registers;
        let from = src_row * src.registers;
        self.values[dst..dst + registers].clone_from_slice(&src.values[from..from + registers]);
    }

    /// Copies the first `registers` values of `src_row` into the later row `dst_row`.
    ///
    /// Rows produced from the same input row share their inherited prefix,
    /// so only the first of them is copied from upstream.
    pub fn copy_values_from_row(&mut self, src_row: usize, dst_row: usize, registers: usize) {
        if src_row >= dst_row {
            return;
        }
        let registers = registers.min(self.registers);
        let from = src_row * self.registers;
        let dst = dst_row * self.registers;
        let (head, tail) = self.values.split_at_mut(dst);
        tail[..registers].clone_from_slice(&head[from..from + registers]);
    }

    /// Resets a register to null in every row.
    pub fn clear_register(&mut self, reg: RegisterId) {
        if reg >= self.registers {
            return;
        }
        for row in 0..self.rows {
            self.values[row * self.registers + reg] = Value::Null;
        }
    }

    /// Drops trailing rows, keeping the first `rows`.
    pub fn shrink(&mut self, rows: usize) {
        if rows < self.rows {
            self.rows = rows;
            self.values.truncate(rows * self.registers);
        }
    }

    fn index(&self, row: usize, reg: RegisterId) -> usize {
        assert!(
            row < self.rows && reg < self.registers,
            "cell ({row}, {reg}) out of range for {}x{} batch",
            self.rows,
            self.registers
        );
        row * self.registers + reg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_batch_is_null() {
        let batch = TupleBatch::new(3, 2);
        assert_eq!(batch.row_count(), 3);
        assert_eq!(batch.register_count(), 2);
        assert!(batch.rows().all(|row| row.iter().all(Value::is_null)));
        assert!(batch.get(3, 0).is_none());
        assert!(batch.get(0, 2).is_none());
    }

    #[test]
    fn test_from_rows() {
        let batch = TupleBatch::from_rows(
            2,
            vec![vec![Value::from(1i64)], vec![Value::from(2i64), Value::from("b")]],
        );
        assert_eq!(batch.value(0, 0), &Value::Int64(1));
        assert!(batch.value(0, 1).is_null());
        assert_eq!(batch.value(1, 1).as_str(), Some("b"));
    }

    #[test]
    fn test_copy_row_from() {
        let src = TupleBatch::from_rows(2, vec![vec![Value::from("a"), Value::from("b")]]);
        let mut dst = TupleBatch::new(2, 4);
        dst.copy_row_from(0, &src, 0, 2);
        dst.copy_values_from_row(0, 1, 2);
        assert_eq!(dst.row(0)[..2], dst.row(1)[..2]);
        assert_eq!(dst.value(1, 1).as_str(), Some("b"));
        assert!(dst.value(1, 2).is_null());
    }

    #[test]
    fn test_clear_register_and_shrink() {
        let mut batch = TupleBatch::from_rows(
            2,
            vec![
                vec![Value::from(1i64), Value::from(10i64)],
                vec![Value::from(2i64), Value::from(20i64)],
                vec![Value::from(3i64), Value::from(30i64)],
            ],
        );
        batch.clear_register(1);
        assert!(batch.rows().all(|row| row[1].is_null()));
        batch.shrink(1);
        assert_eq!(batch.row_count(), 1);
        assert_eq!(batch.value(0, 0), &Value::Int64(1));
    }

    #[test]
    fn test_zero_registers() {
        let batch = TupleBatch::new(2, 0);
        assert_eq!(batch.rows().count(), 2);
        assert!(batch.row(1).is_empty());
    }
}
