//! Store-level error taxonomy.
//!
//! Each variant carries the backend's diagnostic message. Failures are
//! propagated to the immediate caller; nothing at this layer retries.

use thiserror::Error;

/// Typed failure raised by a [`Store`](crate::Store) backend.
///
/// A `get` for a nonexistent key is *not* an error; it yields `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Opening the store failed (missing directory, incompatible
    /// comparator, `error_if_exists` violated, ...).
    #[error("open failed: {0}")]
    Open(String),

    /// Destroying the store's persisted state failed.
    #[error("destroy failed: {0}")]
    Destroy(String),

    /// Repairing a corrupted store failed.
    #[error("repair failed: {0}")]
    Repair(String),

    /// A point read or cursor step hit an I/O failure.
    #[error("read failed: {0}")]
    Read(String),

    /// A point write, delete, or batch apply failed.
    #[error("write failed: {0}")]
    Write(String),

    /// The backend failed without supplying a diagnostic message.
    #[error("store failed without a diagnostic")]
    Undefined,
}
