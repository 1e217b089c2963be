//! # Database - ordered-range iteration layer
//!
//! Wraps any [`store::Store`] backend with bidirectional, boundary-aware
//! range iteration and atomic write batches.
//!
//! ## Architecture
//!
//! ```text
//! Caller
//!   |
//!   v
//! ┌──────────────────────────────────────────────────┐
//! │                   DATABASE                       │
//! │                                                  │
//! │ keys()/values() → RangeQuery → new raw cursor    │
//! │        |                                         │
//! │        v                                         │
//! │   Cursor (error-latching wrapper)                │
//! │        |                                         │
//! │        v                                         │
//! │   Keys / KeyValues: position, then lazily        │
//! │   { capture → comparator bound check → advance } │
//! │                                                  │
//! │ write(WriteBatch) → store.write() (atomic)       │
//! │ get/put/delete    → store point ops              │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                              |
//! |--------------|------------------------------------------------------|
//! | [`lib.rs`]   | `Database` struct, lifecycle, point ops, `KvAccess`  |
//! | [`cursor`]   | validity-tracked, error-latching cursor wrapper      |
//! | [`range`]    | `RangeQuery` + `Keys`/`KeyValues` lazy iterators     |
//! | [`batch`]    | ordered put/delete list applied atomically           |
//!
//! ## Ordering discipline
//!
//! The comparator used for range bound checks is taken from the store
//! itself ([`store::Store::comparator`]), i.e. the one it was opened with.
//! Bound checking therefore cannot disagree with the physical key order.
//!
//! ## Concurrency
//!
//! A `Keys`/`KeyValues` iterator holds mutable cursor state and is not
//! reentrant. Independent iterators over the same database may coexist;
//! this layer adds no locking of its own. An iterator bound to a snapshot
//! observes a frozen view; one without a snapshot gets whatever consistency
//! the backend provides for racing readers.

mod batch;
mod cursor;
mod range;

#[cfg(test)]
mod tests;

pub use batch::WriteBatch;
pub use cursor::Cursor;
pub use range::{KeyValues, Keys, RangeQuery};

// The store contract types are part of this crate's API surface.
pub use store::{
    BatchOp, BytewiseComparator, Comparator, Compression, MemStore, Options, RawCursor,
    ReadOptions, Store, StoreError, WriteOptions,
};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A database instance over one store backend.
///
/// There should be exactly one instance per store directory. The database
/// exclusively owns the backend handle and must outlive every cursor and
/// range iterator derived from it; the borrow checker enforces this.
pub struct Database<S: Store> {
    store: S,
    comparator: Arc<dyn Comparator>,
    path: PathBuf,
}

impl<S: Store> Database<S> {
    /// Opens the store at `path` and wraps it.
    pub fn open<P: AsRef<Path>>(path: P, options: &Options) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let store = S::open(&path, options)?;
        let comparator = store.comparator();
        debug!(
            path = %path.display(),
            comparator = comparator.name(),
            "database opened"
        );
        Ok(Self {
            store,
            comparator,
            path,
        })
    }

    /// Destroys the persisted state of the store at `path`.
    pub fn destroy<P: AsRef<Path>>(path: P, options: &Options) -> Result<(), StoreError> {
        debug!(path = %path.as_ref().display(), "destroying database");
        S::destroy(path.as_ref(), options)
    }

    /// Attempts to repair a corrupted store at `path`.
    pub fn repair<P: AsRef<Path>>(path: P, options: &Options) -> Result<(), StoreError> {
        debug!(path = %path.as_ref().display(), "repairing database");
        S::repair(path.as_ref(), options)
    }

    /// Point read. A missing key is `Ok(None)`, never an error.
    pub fn get(
        &self,
        key: &[u8],
        options: &ReadOptions<S::Snapshot>,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        self.store.get(key, options)
    }

    /// Point write.
    pub fn put(
        &self,
        key: &[u8],
        value: &[u8],
        options: &WriteOptions,
    ) -> Result<(), StoreError> {
        self.store.put(key, value, options)
    }

    /// Point delete. Deleting an absent key succeeds.
    pub fn delete(&self, key: &[u8], options: &WriteOptions) -> Result<(), StoreError> {
        self.store.delete(key, options)
    }

    /// Applies a batch atomically: all of its operations become visible
    /// together, or none do.
    pub fn write(&self, batch: &WriteBatch, options: &WriteOptions) -> Result<(), StoreError> {
        debug!(ops = batch.len(), "committing write batch");
        self.store.write(batch.ops(), options)
    }

    /// Captures a point-in-time read view. Pass it via
    /// [`ReadOptions::snapshot`] to pin reads and iterators to it.
    pub fn snapshot(&self) -> S::Snapshot {
        self.store.snapshot()
    }

    /// Lazy, bounded, directional sequence of keys.
    ///
    /// Each call creates a brand-new cursor; the returned iterator can be
    /// consumed exactly once, fully or partially. Dropping it early
    /// releases the cursor immediately.
    pub fn keys(&self, query: RangeQuery<S::Snapshot>) -> Result<Keys<'_, S>, StoreError> {
        Keys::position(self, query)
    }

    /// Lazy, bounded, directional sequence of `(key, value)` pairs.
    ///
    /// Same single-use contract as [`Database::keys`].
    pub fn values(
        &self,
        query: RangeQuery<S::Snapshot>,
    ) -> Result<KeyValues<'_, S>, StoreError> {
        KeyValues::position(self, query)
    }

    /// The comparator the backend was opened with; also used for range
    /// bound checks.
    pub fn comparator(&self) -> &Arc<dyn Comparator> {
        &self.comparator
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<S: Store> std::fmt::Debug for Database<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("comparator", &self.comparator.name())
            .finish()
    }
}

/// The narrow get/put/delete surface the typed storage facade consumes,
/// with default read/write options. Mockable in tests.
pub trait KvAccess {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
}

impl<S: Store> KvAccess for Database<S> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Database::get(self, key, &ReadOptions::default())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        Database::put(self, key, value, &WriteOptions::default())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        Database::delete(self, key, &WriteOptions::default())
    }
}
