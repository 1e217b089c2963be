//! In-memory reference backend.
//!
//! `MemStore` keeps the whole keyspace in one sorted vector behind an
//! `Arc`. Writers clone-on-write under a `RwLock`; cursors and snapshots
//! clone the `Arc` and therefore observe a stable view for their whole
//! lifetime at no copy cost. Batch apply happens under a single write-lock
//! acquisition, so a batch is visible all-or-nothing.
//!
//! There is no persisted state: `open` always starts empty, `destroy` and
//! `repair` are trivially successful, and `create_if_missing` /
//! `error_if_exists` are inert because there is never existing state to
//! find. The `path` is kept for diagnostics only.

use crate::{
    BatchOp, BytewiseComparator, Comparator, Options, RawCursor, ReadOptions, Store, StoreError,
    WriteOptions,
};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

type View = Arc<Vec<(Vec<u8>, Vec<u8>)>>;

/// Comparator-aware in-memory ordered store with snapshots and atomic
/// batches.
pub struct MemStore {
    current: RwLock<View>,
    comparator: Arc<dyn Comparator>,
    path: PathBuf,
}

/// Frozen point-in-time view of a [`MemStore`]. Cheap to clone; the view
/// is released when the last handle is dropped.
#[derive(Clone)]
pub struct MemSnapshot {
    view: View,
}

impl MemStore {
    fn view(&self) -> View {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.view().len()
    }

    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    fn apply(entries: &mut Vec<(Vec<u8>, Vec<u8>)>, cmp: &dyn Comparator, op: &BatchOp) {
        match op {
            BatchOp::Put { key, value } => {
                match entries.binary_search_by(|(k, _)| cmp.compare(k, key)) {
                    Ok(i) => entries[i].1 = value.clone(),
                    Err(i) => entries.insert(i, (key.clone(), value.clone())),
                }
            }
            BatchOp::Delete { key } => {
                if let Ok(i) = entries.binary_search_by(|(k, _)| cmp.compare(k, key)) {
                    entries.remove(i);
                }
            }
        }
    }

    fn mutate(&self, ops: &[BatchOp]) {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let entries = Arc::make_mut(&mut *guard);
        for op in ops {
            Self::apply(entries, self.comparator.as_ref(), op);
        }
    }
}

impl Store for MemStore {
    type Cursor<'a> = MemCursor<'a>;
    type Snapshot = MemSnapshot;

    fn open(path: &Path, options: &Options) -> Result<Self, StoreError> {
        let comparator = options
            .comparator
            .clone()
            .unwrap_or_else(|| Arc::new(BytewiseComparator));
        debug!(
            path = %path.display(),
            comparator = comparator.name(),
            "opening in-memory store"
        );
        Ok(Self {
            current: RwLock::new(Arc::new(Vec::new())),
            comparator,
            path: path.to_path_buf(),
        })
    }

    fn destroy(path: &Path, _options: &Options) -> Result<(), StoreError> {
        debug!(path = %path.display(), "destroying in-memory store (no persisted state)");
        Ok(())
    }

    fn repair(path: &Path, _options: &Options) -> Result<(), StoreError> {
        debug!(path = %path.display(), "repairing in-memory store (no persisted state)");
        Ok(())
    }

    fn get(
        &self,
        key: &[u8],
        options: &ReadOptions<MemSnapshot>,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let view = match &options.snapshot {
            Some(snapshot) => Arc::clone(&snapshot.view),
            None => self.view(),
        };
        let cmp = self.comparator.as_ref();
        Ok(view
            .binary_search_by(|(k, _)| cmp.compare(k, key))
            .ok()
            .map(|i| view[i].1.clone()))
    }

    fn put(&self, key: &[u8], value: &[u8], _options: &WriteOptions) -> Result<(), StoreError> {
        self.mutate(&[BatchOp::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        }]);
        Ok(())
    }

    fn delete(&self, key: &[u8], _options: &WriteOptions) -> Result<(), StoreError> {
        self.mutate(&[BatchOp::Delete { key: key.to_vec() }]);
        Ok(())
    }

    fn write(&self, ops: &[BatchOp], _options: &WriteOptions) -> Result<(), StoreError> {
        self.mutate(ops);
        Ok(())
    }

    fn cursor(
        &self,
        options: &ReadOptions<MemSnapshot>,
    ) -> Result<MemCursor<'_>, StoreError> {
        let view = match &options.snapshot {
            Some(snapshot) => Arc::clone(&snapshot.view),
            None => self.view(),
        };
        Ok(MemCursor {
            view,
            comparator: Arc::clone(&self.comparator),
            pos: None,
            _store: PhantomData,
        })
    }

    fn snapshot(&self) -> MemSnapshot {
        MemSnapshot { view: self.view() }
    }

    fn comparator(&self) -> Arc<dyn Comparator> {
        Arc::clone(&self.comparator)
    }
}

impl std::fmt::Debug for MemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemStore")
            .field("path", &self.path)
            .field("comparator", &self.comparator.name())
            .field("entries", &self.len())
            .finish()
    }
}

/// Raw cursor over a frozen `MemStore` view.
///
/// The view is pinned at creation time, so a cursor created without a
/// snapshot still never observes writes racing with iteration. That is
/// stronger than the contract requires and nothing above relies on it.
pub struct MemCursor<'a> {
    view: View,
    comparator: Arc<dyn Comparator>,
    /// `None` when unpositioned or stepped off either end.
    pos: Option<usize>,
    _store: PhantomData<&'a MemStore>,
}

impl RawCursor for MemCursor<'_> {
    fn seek_to_first(&mut self) -> bool {
        self.pos = if self.view.is_empty() { None } else { Some(0) };
        self.valid()
    }

    fn seek_to_last(&mut self) -> bool {
        self.pos = self.view.len().checked_sub(1);
        self.valid()
    }

    fn seek(&mut self, key: &[u8]) -> bool {
        let cmp = self.comparator.as_ref();
        let i = self
            .view
            .partition_point(|(k, _)| cmp.compare(k, key) == Ordering::Less);
        self.pos = if i < self.view.len() { Some(i) } else { None };
        self.valid()
    }

    fn next(&mut self) -> bool {
        self.pos = match self.pos {
            Some(i) if i + 1 < self.view.len() => Some(i + 1),
            _ => None,
        };
        self.valid()
    }

    fn prev(&mut self) -> bool {
        self.pos = match self.pos {
            Some(i) => i.checked_sub(1),
            None => None,
        };
        self.valid()
    }

    fn valid(&self) -> bool {
        self.pos.is_some()
    }

    fn key(&self) -> Option<&[u8]> {
        self.pos.map(|i| self.view[i].0.as_slice())
    }

    fn value(&self) -> Option<&[u8]> {
        self.pos.map(|i| self.view[i].1.as_slice())
    }

    fn error(&self) -> Option<StoreError> {
        // Purely in-memory: no I/O to fail.
        None
    }
}
