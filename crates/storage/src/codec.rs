//! Pipeline stage traits and the default codecs.
//!
//! ## Entry wire format - magic `ENT1` (`0x454E_5431`), little-endian
//!
//! ```text
//! record:  [magic: u32][shape: u8 = 0x01][entry]
//! array:   [magic: u32][shape: u8 = 0x02][count: u32][entry]*
//!
//! entry:   [field_count: u32] field*
//! field:   [name_len: u16][name][tag: u8][payload]
//! payload: bool  -> [u8]            (tag 0x01)
//!          int   -> [i64 LE]        (tag 0x02)
//!          float -> [f64 LE]        (tag 0x03)
//!          text  -> [len: u32][utf8] (tag 0x04)
//!          bytes -> [len: u32][raw]  (tag 0x05)
//! ```
//!
//! The array shape is first-class: a record payload and a one-element
//! array payload are distinct byte sequences, and decoding one as the
//! other fails loudly.
//!
//! ## Blob array framing - magic `BLB1` (`0x424C_4231`)
//!
//! ```text
//! [magic: u32][count: u32]([len: u32][raw])*
//! ```
//!
//! ## Checksum byte codec
//!
//! ```text
//! [payload_len: u32][crc32(payload): u32][payload]
//! ```

use crate::{Entry, Field, StorageError};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Magic identifying an entry payload (ASCII "ENT1").
pub const ENTRY_MAGIC: u32 = 0x454E_5431;

/// Magic identifying a framed blob array (ASCII "BLB1").
pub const BLOB_MAGIC: u32 = 0x424C_4231;

const SHAPE_RECORD: u8 = 0x01;
const SHAPE_ARRAY: u8 = 0x02;

const TAG_BOOL: u8 = 0x01;
const TAG_INT: u8 = 0x02;
const TAG_FLOAT: u8 = 0x03;
const TAG_TEXT: u8 = 0x04;
const TAG_BYTES: u8 = 0x05;

/// Structured-record stage: turns entries into bytes.
pub trait Serializer: Send + Sync {
    fn serialize(&self, entry: &Entry) -> Result<Vec<u8>, StorageError>;
    fn serialize_array(&self, entries: &[Entry]) -> Result<Vec<u8>, StorageError>;
}

/// Inverse of [`Serializer`]. Malformed input fails loudly.
pub trait Deserializer: Send + Sync {
    fn deserialize(&self, bytes: &[u8]) -> Result<Entry, StorageError>;
    fn deserialize_array(&self, bytes: &[u8]) -> Result<Vec<Entry>, StorageError>;
}

/// Raw-byte stage applied after serialization (encryption, archival,
/// integrity framing, ...).
pub trait Encoder: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, StorageError>;
}

/// Inverse of [`Encoder`]. `decode(encode(x)) == x` is a hard invariant.
pub trait Decoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, StorageError>;
}

fn write_failed(err: std::io::Error) -> StorageError {
    StorageError::Serialize(err.to_string())
}

fn truncated(what: &str) -> StorageError {
    StorageError::Deserialize(format!("truncated input reading {what}"))
}

// --------------------- EntryCodec ---------------------

/// Default [`Serializer`] + [`Deserializer`] over the `ENT1` wire format.
#[derive(Debug, Default, Clone, Copy)]
pub struct EntryCodec;

impl EntryCodec {
    fn write_entry(buf: &mut Vec<u8>, entry: &Entry) -> Result<(), StorageError> {
        buf.write_u32::<LittleEndian>(entry.len() as u32)
            .map_err(write_failed)?;
        for (name, field) in entry.iter() {
            // Lengths are checked before narrowing: a silently truncated
            // length prefix would produce an undecodable payload.
            let name_len = u16::try_from(name.len()).map_err(|_| {
                StorageError::Serialize(format!(
                    "field name is {} bytes, limit {}",
                    name.len(),
                    u16::MAX
                ))
            })?;
            buf.write_u16::<LittleEndian>(name_len).map_err(write_failed)?;
            buf.extend_from_slice(name.as_bytes());
            match field {
                Field::Bool(b) => {
                    buf.push(TAG_BOOL);
                    buf.push(u8::from(*b));
                }
                Field::Int(i) => {
                    buf.push(TAG_INT);
                    buf.write_i64::<LittleEndian>(*i).map_err(write_failed)?;
                }
                Field::Float(f) => {
                    buf.push(TAG_FLOAT);
                    buf.write_f64::<LittleEndian>(*f).map_err(write_failed)?;
                }
                Field::Text(s) => {
                    buf.push(TAG_TEXT);
                    buf.write_u32::<LittleEndian>(Self::payload_len(name, s.len())?)
                        .map_err(write_failed)?;
                    buf.extend_from_slice(s.as_bytes());
                }
                Field::Bytes(b) => {
                    buf.push(TAG_BYTES);
                    buf.write_u32::<LittleEndian>(Self::payload_len(name, b.len())?)
                        .map_err(write_failed)?;
                    buf.extend_from_slice(b);
                }
            }
        }
        Ok(())
    }

    fn payload_len(name: &str, len: usize) -> Result<u32, StorageError> {
        u32::try_from(len).map_err(|_| {
            StorageError::Serialize(format!(
                "field {name:?} payload is {len} bytes, limit {}",
                u32::MAX
            ))
        })
    }

    fn read_exact_vec(r: &mut &[u8], len: usize, what: &str) -> Result<Vec<u8>, StorageError> {
        if r.len() < len {
            return Err(truncated(what));
        }
        let (head, tail) = r.split_at(len);
        *r = tail;
        Ok(head.to_vec())
    }

    fn read_entry(r: &mut &[u8]) -> Result<Entry, StorageError> {
        let field_count = r
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated("field count"))?;
        let mut entry = Entry::new();
        for _ in 0..field_count {
            let name_len = r
                .read_u16::<LittleEndian>()
                .map_err(|_| truncated("field name length"))?;
            let name_bytes = Self::read_exact_vec(r, name_len as usize, "field name")?;
            let name = String::from_utf8(name_bytes)
                .map_err(|_| StorageError::Deserialize("field name is not utf8".into()))?;
            let tag = r.read_u8().map_err(|_| truncated("field tag"))?;
            let field = match tag {
                TAG_BOOL => {
                    let raw = r.read_u8().map_err(|_| truncated("bool payload"))?;
                    Field::Bool(raw != 0)
                }
                TAG_INT => Field::Int(
                    r.read_i64::<LittleEndian>()
                        .map_err(|_| truncated("int payload"))?,
                ),
                TAG_FLOAT => Field::Float(
                    r.read_f64::<LittleEndian>()
                        .map_err(|_| truncated("float payload"))?,
                ),
                TAG_TEXT => {
                    let len = r
                        .read_u32::<LittleEndian>()
                        .map_err(|_| truncated("text length"))?;
                    let raw = Self::read_exact_vec(r, len as usize, "text payload")?;
                    Field::Text(String::from_utf8(raw).map_err(|_| {
                        StorageError::Deserialize(format!("text field {name:?} is not utf8"))
                    })?)
                }
                TAG_BYTES => {
                    let len = r
                        .read_u32::<LittleEndian>()
                        .map_err(|_| truncated("bytes length"))?;
                    Field::Bytes(Self::read_exact_vec(r, len as usize, "bytes payload")?)
                }
                other => {
                    return Err(StorageError::Deserialize(format!(
                        "unknown field tag {other:#04x}"
                    )))
                }
            };
            entry.set(name, field);
        }
        Ok(entry)
    }

    fn read_header(mut r: &[u8], expected_shape: u8) -> Result<&[u8], StorageError> {
        let magic = r
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated("magic"))?;
        if magic != ENTRY_MAGIC {
            return Err(StorageError::Deserialize(format!(
                "bad magic {magic:#010x}, expected entry payload"
            )));
        }
        let shape = r.read_u8().map_err(|_| truncated("shape tag"))?;
        if shape != expected_shape {
            return Err(StorageError::Deserialize(format!(
                "payload shape {shape:#04x} does not match requested shape {expected_shape:#04x}"
            )));
        }
        Ok(r)
    }
}

impl Serializer for EntryCodec {
    fn serialize(&self, entry: &Entry) -> Result<Vec<u8>, StorageError> {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(ENTRY_MAGIC)
            .map_err(write_failed)?;
        buf.push(SHAPE_RECORD);
        Self::write_entry(&mut buf, entry)?;
        Ok(buf)
    }

    fn serialize_array(&self, entries: &[Entry]) -> Result<Vec<u8>, StorageError> {
        let mut buf = Vec::new();
        buf.write_u32::<LittleEndian>(ENTRY_MAGIC)
            .map_err(write_failed)?;
        buf.push(SHAPE_ARRAY);
        buf.write_u32::<LittleEndian>(entries.len() as u32)
            .map_err(write_failed)?;
        for entry in entries {
            Self::write_entry(&mut buf, entry)?;
        }
        Ok(buf)
    }
}

impl Deserializer for EntryCodec {
    fn deserialize(&self, bytes: &[u8]) -> Result<Entry, StorageError> {
        let mut r = Self::read_header(bytes, SHAPE_RECORD)?;
        let entry = Self::read_entry(&mut r)?;
        if !r.is_empty() {
            return Err(StorageError::Deserialize(format!(
                "{} trailing bytes after record",
                r.len()
            )));
        }
        Ok(entry)
    }

    fn deserialize_array(&self, bytes: &[u8]) -> Result<Vec<Entry>, StorageError> {
        let mut r = Self::read_header(bytes, SHAPE_ARRAY)?;
        let count = r
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated("array count"))?;
        // The count came from stored bytes; cap the pre-allocation by what
        // the input could possibly hold so a corrupt prefix cannot force a
        // huge allocation before the decode fails.
        let mut entries = Vec::with_capacity((count as usize).min(r.len()));
        for _ in 0..count {
            entries.push(Self::read_entry(&mut r)?);
        }
        if !r.is_empty() {
            return Err(StorageError::Deserialize(format!(
                "{} trailing bytes after array",
                r.len()
            )));
        }
        Ok(entries)
    }
}

// --------------------- Byte codecs ---------------------

/// Identity [`Encoder`] + [`Decoder`]; the default byte stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Encoder for Passthrough {
    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, StorageError> {
        Ok(bytes.to_vec())
    }
}

impl Decoder for Passthrough {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, StorageError> {
        Ok(bytes.to_vec())
    }
}

/// Integrity-framing byte stage: prepends length and crc32, verifies on
/// decode. A symmetric cipher would slot into the same seam.
#[derive(Debug, Default, Clone, Copy)]
pub struct Checksum;

impl Encoder for Checksum {
    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut out = Vec::with_capacity(bytes.len() + 8);
        out.write_u32::<LittleEndian>(bytes.len() as u32)
            .map_err(write_failed)?;
        out.write_u32::<LittleEndian>(crc32fast::hash(bytes))
            .map_err(write_failed)?;
        out.extend_from_slice(bytes);
        Ok(out)
    }
}

impl Decoder for Checksum {
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, StorageError> {
        let mut r = bytes;
        let len = r
            .read_u32::<LittleEndian>()
            .map_err(|_| StorageError::Decode("truncated checksum frame".into()))?;
        let expected = r
            .read_u32::<LittleEndian>()
            .map_err(|_| StorageError::Decode("truncated checksum frame".into()))?;
        if r.len() != len as usize {
            return Err(StorageError::Decode(format!(
                "frame declares {len} payload bytes but {} are present",
                r.len()
            )));
        }
        let actual = crc32fast::hash(r);
        if actual != expected {
            return Err(StorageError::Decode(format!(
                "checksum mismatch: stored {expected:#010x}, computed {actual:#010x}"
            )));
        }
        Ok(r.to_vec())
    }
}

// --------------------- Blob array framing ---------------------

/// Frames raw byte payloads as one first-class array payload.
pub fn frame_array(parts: &[Vec<u8>]) -> Result<Vec<u8>, StorageError> {
    let mut buf = Vec::new();
    buf.write_u32::<LittleEndian>(BLOB_MAGIC)
        .map_err(write_failed)?;
    buf.write_u32::<LittleEndian>(parts.len() as u32)
        .map_err(write_failed)?;
    for part in parts {
        buf.write_u32::<LittleEndian>(part.len() as u32)
            .map_err(write_failed)?;
        buf.extend_from_slice(part);
    }
    Ok(buf)
}

/// Inverse of [`frame_array`].
pub fn unframe_array(bytes: &[u8]) -> Result<Vec<Vec<u8>>, StorageError> {
    let mut r = bytes;
    let magic = r
        .read_u32::<LittleEndian>()
        .map_err(|_| truncated("blob array magic"))?;
    if magic != BLOB_MAGIC {
        return Err(StorageError::Deserialize(format!(
            "bad magic {magic:#010x}, expected blob array"
        )));
    }
    let count = r
        .read_u32::<LittleEndian>()
        .map_err(|_| truncated("blob array count"))?;
    // Untrusted count; cap the pre-allocation by the remaining input.
    let mut parts = Vec::with_capacity((count as usize).min(r.len()));
    for _ in 0..count {
        let len = r
            .read_u32::<LittleEndian>()
            .map_err(|_| truncated("blob length"))?;
        parts.push(EntryCodec::read_exact_vec(&mut r, len as usize, "blob payload")?);
    }
    if !r.is_empty() {
        return Err(StorageError::Deserialize(format!(
            "{} trailing bytes after blob array",
            r.len()
        )));
    }
    Ok(parts)
}
