//! Error-latching cursor wrapper.

use store::{RawCursor, StoreError};

/// Positional handle over the full keyspace, wrapping one raw backend
/// cursor.
///
/// States: unpositioned, positioned-valid, exhausted, errored. The wrapper
/// adds one guarantee on top of [`RawCursor`]: once the backend reports a
/// terminal error, the cursor latches it and refuses all further stepping:
/// every operation returns `false` and the accessors return `None`.
pub struct Cursor<R: RawCursor> {
    raw: R,
    errored: bool,
}

impl<R: RawCursor> Cursor<R> {
    pub fn new(raw: R) -> Self {
        Self {
            raw,
            errored: false,
        }
    }

    /// Runs one raw operation unless the error latch is set, then checks
    /// whether the backend raised an error during it.
    fn step(&mut self, op: impl FnOnce(&mut R) -> bool) -> bool {
        if self.errored {
            return false;
        }
        let valid = op(&mut self.raw);
        if self.raw.error().is_some() {
            self.errored = true;
            return false;
        }
        valid
    }

    pub fn seek_to_first(&mut self) -> bool {
        self.step(R::seek_to_first)
    }

    pub fn seek_to_last(&mut self) -> bool {
        self.step(R::seek_to_last)
    }

    pub fn seek(&mut self, key: &[u8]) -> bool {
        self.step(|raw| raw.seek(key))
    }

    pub fn next(&mut self) -> bool {
        self.step(R::next)
    }

    pub fn prev(&mut self) -> bool {
        self.step(R::prev)
    }

    pub fn valid(&self) -> bool {
        !self.errored && self.raw.valid()
    }

    /// Key at the current position. `None` when the cursor is not
    /// positioned on an entry; calling this in that state is a caller bug,
    /// signalled by the absent value rather than stale data.
    pub fn key(&self) -> Option<&[u8]> {
        if self.errored {
            return None;
        }
        self.raw.key()
    }

    /// Value at the current position, `None` when invalid.
    pub fn value(&self) -> Option<&[u8]> {
        if self.errored {
            return None;
        }
        self.raw.value()
    }

    /// The terminal I/O error, if one was raised.
    pub fn error(&self) -> Option<StoreError> {
        self.raw.error()
    }
}
