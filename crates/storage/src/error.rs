//! Pipeline error type.
//!
//! Store failures pass through unchanged. Serialize/deserialize and
//! encode/decode failures are their own variants: malformed bytes are a
//! programming or corruption error and must never be mistaken for an
//! absent key.

use store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Turning a value into bytes failed.
    #[error("serialize failed: {0}")]
    Serialize(String),

    /// The stored bytes do not describe a valid entry (or entry array).
    #[error("deserialize failed: {0}")]
    Deserialize(String),

    /// The byte-level transform rejected the stored bytes.
    #[error("decode failed: {0}")]
    Decode(String),
}
