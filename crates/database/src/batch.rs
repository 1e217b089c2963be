//! Atomic write batches.

use store::BatchOp;

/// An ordered list of put/delete operations submitted as one indivisible
/// unit via [`Database::write`](crate::Database::write).
///
/// The batch performs no validation of key or value content; it only
/// guarantees ordering and hands the list to the store's atomic apply.
#[derive(Debug, Default, Clone)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a put. A later op on the same key within the batch wins.
    pub fn put(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> &mut Self {
        self.ops.push(BatchOp::Put {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    /// Queues a delete.
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) -> &mut Self {
        self.ops.push(BatchOp::Delete { key: key.into() });
        self
    }

    /// Empties the batch for reuse, keeping its allocation.
    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// The queued operations, in submission order.
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }
}
