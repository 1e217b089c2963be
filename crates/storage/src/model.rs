//! Capability traits models implement to participate in the pipeline.
//!
//! Two orthogonal axes:
//! - structured ([`ToEntry`]/[`FromEntry`]): the model has named fields and
//!   goes through the serializer stage;
//! - raw ([`ToBytes`]/[`FromBytes`]): the model owns its own byte layout
//!   and only the encoder stage applies.

use crate::{Entry, StorageError};

/// A model that can describe itself as a field map.
pub trait ToEntry {
    fn to_entry(&self) -> Entry;
}

/// A model reconstructible from a field map. Missing or mistyped fields
/// are a deserialize failure, not an absent value.
pub trait FromEntry: Sized {
    fn from_entry(entry: &Entry) -> Result<Self, StorageError>;
}

/// A model that owns its raw byte representation.
pub trait ToBytes {
    fn to_bytes(&self) -> Vec<u8>;
}

/// A model reconstructible from its raw byte representation.
pub trait FromBytes: Sized {
    fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError>;
}
