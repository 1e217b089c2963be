//! # Storage - typed values over an opaque byte store
//!
//! A composable encode/decode pipeline that persists typed values through
//! any [`database::KvAccess`] backend without the store ever learning
//! about types.
//!
//! ## Pipeline
//!
//! ```text
//! put:  model --ToEntry--> Entry --Serializer--> bytes --Encoder--> store
//! get:  store --Decoder--> bytes --Deserializer--> Entry --FromEntry--> model
//!
//! raw axis (models owning their byte layout):
//! put:  model --ToBytes--> bytes --Encoder--> store
//! get:  store --Decoder--> bytes --FromBytes--> model
//! ```
//!
//! Every stage is the exact inverse of its counterpart; round-trip
//! identity is a hard invariant, not best-effort. Homogeneous arrays are a
//! first-class wire shape on both axes, not N concatenated records.
//!
//! ## Result discipline
//!
//! `Result<Option<T>, StorageError>` everywhere: `Ok(Some)` found,
//! `Ok(None)` key absent, `Err` store failure or malformed bytes. A decode
//! failure is never reported as absence.

mod codec;
mod entry;
mod error;
mod model;

#[cfg(test)]
mod tests;

pub use codec::{
    frame_array, unframe_array, Checksum, Decoder, Deserializer, Encoder, EntryCodec,
    Passthrough, Serializer, BLOB_MAGIC, ENTRY_MAGIC,
};
pub use entry::{Entry, Field};
pub use error::StorageError;
pub use model::{FromBytes, FromEntry, ToBytes, ToEntry};

use database::KvAccess;

/// The four pipeline stages bundled together. Built once, shared by every
/// operation on a [`Storage`]; never mutated after construction.
pub struct StorageConfiguration {
    serializer: Box<dyn Serializer>,
    deserializer: Box<dyn Deserializer>,
    encoder: Box<dyn Encoder>,
    decoder: Box<dyn Decoder>,
}

impl StorageConfiguration {
    pub fn new(
        serializer: Box<dyn Serializer>,
        deserializer: Box<dyn Deserializer>,
        encoder: Box<dyn Encoder>,
        decoder: Box<dyn Decoder>,
    ) -> Self {
        Self {
            serializer,
            deserializer,
            encoder,
            decoder,
        }
    }

    /// Replaces the byte stage, keeping the record stage.
    pub fn with_byte_codec(mut self, encoder: Box<dyn Encoder>, decoder: Box<dyn Decoder>) -> Self {
        self.encoder = encoder;
        self.decoder = decoder;
        self
    }
}

impl Default for StorageConfiguration {
    /// [`EntryCodec`] for records, [`Passthrough`] for bytes.
    fn default() -> Self {
        Self::new(
            Box::new(EntryCodec),
            Box::new(EntryCodec),
            Box::new(Passthrough),
            Box::new(Passthrough),
        )
    }
}

/// Typed facade over an opaque byte store.
pub struct Storage<D: KvAccess> {
    database: D,
    configuration: StorageConfiguration,
}

impl<D: KvAccess> Storage<D> {
    pub fn new(database: D, configuration: StorageConfiguration) -> Self {
        Self {
            database,
            configuration,
        }
    }

    pub fn database(&self) -> &D {
        &self.database
    }

    // --------------------- Raw bytes ---------------------

    /// Reads and decodes the bytes under `key`.
    pub fn get_raw(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        match self.database.get(key)? {
            None => Ok(None),
            Some(stored) => Ok(Some(self.configuration.decoder.decode(&stored)?)),
        }
    }

    /// Encodes and writes `bytes` under `key`.
    pub fn put_raw(&self, key: &[u8], bytes: &[u8]) -> Result<(), StorageError> {
        let encoded = self.configuration.encoder.encode(bytes)?;
        self.database.put(key, &encoded)?;
        Ok(())
    }

    pub fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.database.delete(key)?;
        Ok(())
    }

    // --------------------- Structured axis ---------------------

    /// Reads one record.
    pub fn get<T: FromEntry>(&self, key: &[u8]) -> Result<Option<T>, StorageError> {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(bytes) => {
                let entry = self.configuration.deserializer.deserialize(&bytes)?;
                Ok(Some(T::from_entry(&entry)?))
            }
        }
    }

    /// Reads a homogeneous record array.
    pub fn get_vec<T: FromEntry>(&self, key: &[u8]) -> Result<Option<Vec<T>>, StorageError> {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(bytes) => {
                let entries = self.configuration.deserializer.deserialize_array(&bytes)?;
                entries
                    .iter()
                    .map(T::from_entry)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Some)
            }
        }
    }

    /// Writes one record.
    pub fn put<T: ToEntry>(&self, key: &[u8], value: &T) -> Result<(), StorageError> {
        let bytes = self.configuration.serializer.serialize(&value.to_entry())?;
        self.put_raw(key, &bytes)
    }

    /// Writes a homogeneous record array under one key.
    pub fn put_slice<T: ToEntry>(&self, key: &[u8], values: &[T]) -> Result<(), StorageError> {
        let entries: Vec<Entry> = values.iter().map(ToEntry::to_entry).collect();
        let bytes = self.configuration.serializer.serialize_array(&entries)?;
        self.put_raw(key, &bytes)
    }

    // --------------------- Raw axis ---------------------

    /// Reads one raw-layout model.
    pub fn get_blob<T: FromBytes>(&self, key: &[u8]) -> Result<Option<T>, StorageError> {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(bytes) => Ok(Some(T::from_bytes(&bytes)?)),
        }
    }

    /// Reads a framed array of raw-layout models.
    pub fn get_blobs<T: FromBytes>(&self, key: &[u8]) -> Result<Option<Vec<T>>, StorageError> {
        match self.get_raw(key)? {
            None => Ok(None),
            Some(bytes) => {
                let parts = unframe_array(&bytes)?;
                parts
                    .iter()
                    .map(|part| T::from_bytes(part))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Some)
            }
        }
    }

    /// Writes one raw-layout model.
    pub fn put_blob<T: ToBytes>(&self, key: &[u8], value: &T) -> Result<(), StorageError> {
        self.put_raw(key, &value.to_bytes())
    }

    /// Writes a framed array of raw-layout models under one key.
    pub fn put_blobs<T: ToBytes>(&self, key: &[u8], values: &[T]) -> Result<(), StorageError> {
        let parts: Vec<Vec<u8>> = values.iter().map(ToBytes::to_bytes).collect();
        self.put_raw(key, &frame_array(&parts)?)
    }
}
