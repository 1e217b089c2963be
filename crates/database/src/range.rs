//! Bounded, directional, lazy range iteration.
//!
//! [`Keys`] and [`KeyValues`] walk the keyspace between an optional
//! inclusive `from` key and an optional inclusive `to` key, ascending or
//! descending, producing one entry per pull. Positioning happens eagerly
//! when the iterator is created; production is lazy.
//!
//! The production step is: if the cursor is invalid the sequence ends;
//! otherwise capture the current entry, terminate without yielding if it
//! lies past the `to` bound under the database's comparator, advance the
//! cursor in the iteration direction, and yield the captured entry.
//!
//! A seek positions the cursor at the first key `>=` the target. When
//! descending from an explicit start key that overshoots (comparator says
//! the landed key is strictly greater than the start), one backward step
//! corrects the position to at-or-before the start key.

use crate::{Cursor, Database};
use std::cmp::Ordering;
use std::sync::Arc;
use store::{Comparator, ReadOptions, Store, StoreError};

/// Immutable range descriptor consumed by [`Database::keys`] and
/// [`Database::values`].
///
/// Both bounds are inclusive; `to` is interpreted in the iteration
/// direction (an upper bound ascending, a lower bound descending). The
/// default is the whole keyspace, ascending, with default read options.
#[derive(Debug, Clone)]
pub struct RangeQuery<Snap> {
    pub(crate) from: Option<Vec<u8>>,
    pub(crate) to: Option<Vec<u8>>,
    pub(crate) descending: bool,
    pub(crate) read: ReadOptions<Snap>,
}

impl<Snap> Default for RangeQuery<Snap> {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            descending: false,
            read: ReadOptions::default(),
        }
    }
}

impl<Snap> RangeQuery<Snap> {
    /// The whole keyspace, ascending.
    pub fn all() -> Self {
        Self::default()
    }

    /// Inclusive start key.
    pub fn from_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.from = Some(key.into());
        self
    }

    /// Inclusive end key (direction-dependent).
    pub fn to_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.to = Some(key.into());
        self
    }

    pub fn descending(mut self, yes: bool) -> Self {
        self.descending = yes;
        self
    }

    /// Read configuration for the cursor, including an optional snapshot.
    pub fn read_options(mut self, read: ReadOptions<Snap>) -> Self {
        self.read = read;
        self
    }
}

/// Shared positioning + production machinery for both sequence kinds.
///
/// `S: 'db` is required explicitly: the cursor GAT carries a `Self: 'a`
/// bound that outlives inference does not see through.
struct RangeCursor<'db, S: Store + 'db> {
    cursor: Cursor<S::Cursor<'db>>,
    comparator: Arc<dyn Comparator>,
    to: Option<Vec<u8>>,
    descending: bool,
}

impl<'db, S: Store + 'db> RangeCursor<'db, S> {
    fn position(
        db: &'db Database<S>,
        query: RangeQuery<S::Snapshot>,
    ) -> Result<Self, StoreError> {
        let RangeQuery {
            from,
            to,
            descending,
            read,
        } = query;
        let comparator = Arc::clone(db.comparator());
        let mut cursor = Cursor::new(db.store().cursor(&read)?);

        if let Some(start) = from {
            cursor.seek(&start);
            if descending {
                // The seek landed at the first key >= start, which
                // overshoots when iterating downward; step back to land
                // at-or-before the start key.
                let overshot = cursor
                    .key()
                    .is_some_and(|current| comparator.compare(&start, current) == Ordering::Less);
                if overshot {
                    cursor.prev();
                }
            }
        } else if descending {
            cursor.seek_to_last();
        } else {
            cursor.seek_to_first();
        }

        Ok(Self {
            cursor,
            comparator,
            to,
            descending,
        })
    }

    /// One production step: capture, bound-check, advance.
    fn pull<T>(&mut self, capture: impl FnOnce(&[u8], &[u8]) -> T) -> Option<T> {
        if !self.cursor.valid() {
            return None;
        }
        let captured = {
            let key = self.cursor.key()?;
            if let Some(end) = &self.to {
                let ord = self.comparator.compare(key, end);
                let past_bound = if self.descending {
                    ord == Ordering::Less
                } else {
                    ord == Ordering::Greater
                };
                if past_bound {
                    return None;
                }
            }
            let value = self.cursor.value().unwrap_or(&[]);
            capture(key, value)
        };
        if self.descending {
            self.cursor.prev();
        } else {
            self.cursor.next();
        }
        Some(captured)
    }

    fn status(&self) -> Result<(), StoreError> {
        match self.cursor.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Lazy sequence of keys within a range. Created by [`Database::keys`];
/// single-use. Dropping it releases the underlying cursor.
pub struct Keys<'db, S: Store> {
    inner: RangeCursor<'db, S>,
}

impl<'db, S: Store> Keys<'db, S> {
    pub(crate) fn position(
        db: &'db Database<S>,
        query: RangeQuery<S::Snapshot>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            inner: RangeCursor::position(db, query)?,
        })
    }

    /// Distinguishes "ended because the bound was reached" from "ended
    /// because of an I/O failure". Check after the iterator is exhausted.
    pub fn status(&self) -> Result<(), StoreError> {
        self.inner.status()
    }
}

impl<S: Store> Iterator for Keys<'_, S> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        self.inner.pull(|key, _| key.to_vec())
    }
}

/// Lazy sequence of `(key, value)` pairs within a range. Created by
/// [`Database::values`]; single-use.
pub struct KeyValues<'db, S: Store> {
    inner: RangeCursor<'db, S>,
}

impl<'db, S: Store> KeyValues<'db, S> {
    pub(crate) fn position(
        db: &'db Database<S>,
        query: RangeQuery<S::Snapshot>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            inner: RangeCursor::position(db, query)?,
        })
    }

    /// See [`Keys::status`].
    pub fn status(&self) -> Result<(), StoreError> {
        self.inner.status()
    }
}

impl<S: Store> Iterator for KeyValues<'_, S> {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<(Vec<u8>, Vec<u8>)> {
        self.inner.pull(|key, value| (key.to_vec(), value.to_vec()))
    }
}
