//! # Store - ordered key-value store contract
//!
//! The narrow primitive contract this workspace consumes from an external
//! ordered store, plus an in-memory reference backend.
//!
//! Everything above this crate (range iteration, write batches, the typed
//! storage pipeline) talks to the store exclusively through two traits:
//!
//! | Trait         | Purpose                                                |
//! |---------------|--------------------------------------------------------|
//! | [`Store`]     | open/destroy/repair, point reads/writes, atomic batch  |
//! |               | apply, snapshot creation, raw cursor creation          |
//! | [`RawCursor`] | single-direction positional walk over the full keyspace|
//!
//! The contract deliberately excludes engine internals (memtables, SSTables,
//! WAL, compaction); a backend brings its own. [`MemStore`] is the in-tree
//! backend: a comparator-aware, snapshot-capable ordered map used by tests
//! and benches, and a reference for what the contract requires.
//!
//! ## Ordering
//!
//! A store is opened with a [`Comparator`] (default: bytewise). The same
//! comparator instance is reported back through [`Store::comparator`] so the
//! iteration layer's bound checks always agree with the physical key order.
//! A backend that cannot honor `Options::comparator` must fail `open` rather
//! than silently sort differently.

mod comparator;
mod error;
mod memory;
mod options;


pub use comparator::{BytewiseComparator, Comparator};
pub use error::StoreError;
pub use memory::{MemCursor, MemSnapshot, MemStore};
pub use options::{Compression, Options, ReadOptions, WriteOptions};

use std::path::Path;
use std::sync::Arc;

/// Contract version reported by this crate, analogous to the major/minor
/// version a native engine exposes.
pub const MAJOR_VERSION: u32 = 0;
pub const MINOR_VERSION: u32 = 1;

/// One operation inside an atomically applied batch.
///
/// Order within a batch is preserved: a later op on the same key wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Raw iterator handle over the full keyspace of a store.
///
/// A cursor starts *unpositioned*. Every seek/step returns the
/// post-operation validity; [`RawCursor::key`] and [`RawCursor::value`] are
/// `Some` exactly while the cursor is positioned on an entry.
///
/// [`RawCursor::error`] surfaces a terminal I/O error raised by the backend
/// (e.g. a corrupted block). Once it returns `Some`, the cursor must be
/// treated as permanently invalid.
pub trait RawCursor {
    /// Position at the first key. Returns `false` if the store is empty.
    fn seek_to_first(&mut self) -> bool;

    /// Position at the last key. Returns `false` if the store is empty.
    fn seek_to_last(&mut self) -> bool;

    /// Position at the first key `>=` `key` under the store's comparator.
    /// Returns `false` if no such key exists.
    fn seek(&mut self, key: &[u8]) -> bool;

    /// Step forward. Stepping an invalid cursor stays invalid.
    fn next(&mut self) -> bool;

    /// Step backward. Stepping backward off the first key invalidates.
    fn prev(&mut self) -> bool;

    /// Whether the cursor is positioned on an entry.
    fn valid(&self) -> bool;

    /// Key at the current position, `None` when invalid.
    fn key(&self) -> Option<&[u8]>;

    /// Value at the current position, `None` when invalid.
    fn value(&self) -> Option<&[u8]>;

    /// Terminal I/O error, if the backend raised one.
    fn error(&self) -> Option<StoreError>;
}

/// The external ordered store consumed by the layers above.
///
/// A cursor borrows the store it was created from (`Cursor<'a>`), so a
/// cursor outliving its store is unrepresentable. Snapshots are cheap
/// handles (`Clone`) referencing a frozen point-in-time view; releasing a
/// snapshot is dropping the last handle.
pub trait Store: Sized {
    type Cursor<'a>: RawCursor
    where
        Self: 'a;
    type Snapshot: Clone;

    /// Opens (or creates, per [`Options::create_if_missing`]) the store at
    /// `path`.
    fn open(path: &Path, options: &Options) -> Result<Self, StoreError>;

    /// Destroys the store at `path`, removing all persisted state.
    fn destroy(path: &Path, options: &Options) -> Result<(), StoreError>;

    /// Repairs the store at `path` after corruption, salvaging what it can.
    fn repair(path: &Path, options: &Options) -> Result<(), StoreError>;

    /// Point read. A missing key is `Ok(None)`, never an error.
    fn get(
        &self,
        key: &[u8],
        options: &ReadOptions<Self::Snapshot>,
    ) -> Result<Option<Vec<u8>>, StoreError>;

    /// Point write.
    fn put(&self, key: &[u8], value: &[u8], options: &WriteOptions) -> Result<(), StoreError>;

    /// Point delete. Deleting an absent key succeeds.
    fn delete(&self, key: &[u8], options: &WriteOptions) -> Result<(), StoreError>;

    /// Applies `ops` as one indivisible unit: all become visible together
    /// or none do, with no partial interleaving observable by readers.
    fn write(&self, ops: &[BatchOp], options: &WriteOptions) -> Result<(), StoreError>;

    /// Creates a fresh raw cursor. Honors `options.snapshot` if set.
    fn cursor(
        &self,
        options: &ReadOptions<Self::Snapshot>,
    ) -> Result<Self::Cursor<'_>, StoreError>;

    /// Captures a point-in-time read view.
    fn snapshot(&self) -> Self::Snapshot;

    /// The comparator this store was opened with. The iteration layer uses
    /// it for bound checks, so it must match the physical sort order.
    fn comparator(&self) -> Arc<dyn Comparator>;
}
