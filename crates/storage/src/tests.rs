use crate::*;
use anyhow::Result;
use database::{Database, KvAccess, MemStore, Options};
use std::cell::RefCell;
use store::StoreError;

// --------------------- Test models ---------------------

#[derive(Debug, Clone, PartialEq)]
struct User {
    name: String,
    age: i64,
    active: bool,
}

impl ToEntry for User {
    fn to_entry(&self) -> Entry {
        Entry::new()
            .with("name", Field::Text(self.name.clone()))
            .with("age", Field::Int(self.age))
            .with("active", Field::Bool(self.active))
    }
}

impl FromEntry for User {
    fn from_entry(entry: &Entry) -> Result<Self, StorageError> {
        let field = |name: &str| {
            StorageError::Deserialize(format!("user entry is missing field {name:?}"))
        };
        Ok(Self {
            name: entry.get_text("name").ok_or_else(|| field("name"))?.to_string(),
            age: entry.get_int("age").ok_or_else(|| field("age"))?,
            active: entry.get_bool("active").ok_or_else(|| field("active"))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Tag(String);

impl ToBytes for Tag {
    fn to_bytes(&self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}

impl FromBytes for Tag {
    fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        String::from_utf8(bytes.to_vec())
            .map(Tag)
            .map_err(|_| StorageError::Deserialize("tag is not utf8".into()))
    }
}

fn sample_user() -> User {
    User {
        name: "ada".into(),
        age: 36,
        active: true,
    }
}

fn open_storage() -> Result<Storage<Database<MemStore>>> {
    let db = Database::open("storage-test", &Options::default().create_if_missing(true))?;
    Ok(Storage::new(db, StorageConfiguration::default()))
}

// --------------------- Entry ---------------------

#[test]
fn entry_typed_accessors() {
    let entry = sample_user().to_entry();
    assert_eq!(entry.get_text("name"), Some("ada"));
    assert_eq!(entry.get_int("age"), Some(36));
    assert_eq!(entry.get_bool("active"), Some(true));
    // Wrong kind or missing name is None.
    assert_eq!(entry.get_int("name"), None);
    assert_eq!(entry.get_bool("missing"), None);
}

#[test]
fn entry_set_replaces_previous_value() {
    let mut entry = Entry::new();
    entry.set("n", Field::Int(1));
    entry.set("n", Field::Int(2));
    assert_eq!(entry.len(), 1);
    assert_eq!(entry.get_int("n"), Some(2));
}

// --------------------- EntryCodec ---------------------

#[test]
fn entry_codec_roundtrips_every_field_kind() -> Result<()> {
    let entry = Entry::new()
        .with("b", Field::Bool(false))
        .with("i", Field::Int(-42))
        .with("f", Field::Float(1.5))
        .with("t", Field::Text("héllo".into()))
        .with("raw", Field::Bytes(vec![0, 255, 7]));

    let bytes = EntryCodec.serialize(&entry)?;
    assert_eq!(EntryCodec.deserialize(&bytes)?, entry);
    Ok(())
}

#[test]
fn entry_codec_roundtrips_empty_entry() -> Result<()> {
    let entry = Entry::new();
    let bytes = EntryCodec.serialize(&entry)?;
    assert_eq!(EntryCodec.deserialize(&bytes)?, entry);
    Ok(())
}

#[test]
fn entry_codec_roundtrips_arrays() -> Result<()> {
    let entries = vec![
        sample_user().to_entry(),
        Entry::new().with("only", Field::Int(1)),
        Entry::new(),
    ];
    let bytes = EntryCodec.serialize_array(&entries)?;
    assert_eq!(EntryCodec.deserialize_array(&bytes)?, entries);
    Ok(())
}

#[test]
fn array_shape_is_distinct_from_record_shape() -> Result<()> {
    let entry = sample_user().to_entry();
    let single = EntryCodec.serialize(&entry)?;
    let array = EntryCodec.serialize_array(std::slice::from_ref(&entry))?;
    assert_ne!(single, array);

    // Decoding one shape as the other fails loudly.
    assert!(matches!(
        EntryCodec.deserialize(&array),
        Err(StorageError::Deserialize(_))
    ));
    assert!(matches!(
        EntryCodec.deserialize_array(&single),
        Err(StorageError::Deserialize(_))
    ));
    Ok(())
}

#[test]
fn entry_codec_rejects_foreign_bytes() {
    assert!(matches!(
        EntryCodec.deserialize(b"not an entry payload"),
        Err(StorageError::Deserialize(_))
    ));
    assert!(matches!(
        EntryCodec.deserialize(b""),
        Err(StorageError::Deserialize(_))
    ));
}

#[test]
fn entry_codec_rejects_oversized_field_name() {
    // A name longer than the u16 length prefix can express must fail at
    // serialize time, never truncate into an undecodable payload.
    let entry = Entry::new().with("n".repeat(u16::MAX as usize + 1), Field::Int(1));
    assert!(matches!(
        EntryCodec.serialize(&entry),
        Err(StorageError::Serialize(_))
    ));

    // At exactly the limit it still round-trips.
    let entry = Entry::new().with("n".repeat(u16::MAX as usize), Field::Int(1));
    let bytes = EntryCodec.serialize(&entry).unwrap();
    assert_eq!(EntryCodec.deserialize(&bytes).unwrap(), entry);
}

#[test]
fn corrupt_array_count_fails_instead_of_allocating() -> Result<()> {
    use byteorder::{LittleEndian, WriteBytesExt};

    // An entry-array header claiming u32::MAX entries with no bodies.
    let mut bytes = EntryCodec.serialize_array(&[])?;
    bytes.truncate(5); // keep magic + shape tag
    bytes.write_u32::<LittleEndian>(u32::MAX)?;
    assert!(matches!(
        EntryCodec.deserialize_array(&bytes),
        Err(StorageError::Deserialize(_))
    ));

    // Same for the blob-array framing.
    let mut bytes = frame_array(&[])?;
    bytes.truncate(4); // keep magic
    bytes.write_u32::<LittleEndian>(u32::MAX)?;
    assert!(matches!(
        unframe_array(&bytes),
        Err(StorageError::Deserialize(_))
    ));
    Ok(())
}

#[test]
fn entry_codec_rejects_trailing_bytes() -> Result<()> {
    let mut bytes = EntryCodec.serialize(&Entry::new())?;
    bytes.push(0xAB);
    assert!(matches!(
        EntryCodec.deserialize(&bytes),
        Err(StorageError::Deserialize(_))
    ));
    Ok(())
}

// --------------------- Byte codecs ---------------------

#[test]
fn checksum_codec_roundtrips() -> Result<()> {
    let payload = b"some payload bytes";
    let encoded = Checksum.encode(payload)?;
    assert_eq!(Checksum.decode(&encoded)?, payload);
    Ok(())
}

#[test]
fn checksum_codec_detects_corruption() -> Result<()> {
    let mut encoded = Checksum.encode(b"payload")?;
    let last = encoded.len() - 1;
    encoded[last] ^= 0xFF;
    assert!(matches!(
        Checksum.decode(&encoded),
        Err(StorageError::Decode(_))
    ));
    Ok(())
}

#[test]
fn checksum_codec_rejects_truncated_frames() {
    assert!(matches!(
        Checksum.decode(&[1, 2, 3]),
        Err(StorageError::Decode(_))
    ));
}

#[test]
fn blob_array_framing_roundtrips() -> Result<()> {
    let parts = vec![b"one".to_vec(), Vec::new(), b"three".to_vec()];
    assert_eq!(unframe_array(&frame_array(&parts)?)?, parts);

    let empty: Vec<Vec<u8>> = Vec::new();
    assert_eq!(unframe_array(&frame_array(&empty)?)?, empty);
    Ok(())
}

// --------------------- Facade over a live database ---------------------

#[test]
fn typed_record_roundtrip() -> Result<()> {
    let storage = open_storage()?;
    let user = sample_user();

    storage.put(b"user:ada", &user)?;
    assert_eq!(storage.get::<User>(b"user:ada")?, Some(user));
    Ok(())
}

#[test]
fn typed_record_array_roundtrip() -> Result<()> {
    let storage = open_storage()?;
    let users = vec![
        sample_user(),
        User {
            name: "grace".into(),
            age: 45,
            active: false,
        },
    ];

    storage.put_slice(b"users", &users)?;
    assert_eq!(storage.get_vec::<User>(b"users")?, Some(users));
    Ok(())
}

#[test]
fn raw_axis_roundtrip() -> Result<()> {
    let storage = open_storage()?;

    storage.put_blob(b"tag", &Tag("release".into()))?;
    assert_eq!(storage.get_blob::<Tag>(b"tag")?, Some(Tag("release".into())));

    let tags = vec![Tag("a".into()), Tag("b".into())];
    storage.put_blobs(b"tags", &tags)?;
    assert_eq!(storage.get_blobs::<Tag>(b"tags")?, Some(tags));
    Ok(())
}

#[test]
fn absent_key_is_ok_none_for_every_accessor() -> Result<()> {
    let storage = open_storage()?;
    assert_eq!(storage.get_raw(b"nope")?, None);
    assert_eq!(storage.get::<User>(b"nope")?, None);
    assert_eq!(storage.get_vec::<User>(b"nope")?, None);
    assert_eq!(storage.get_blob::<Tag>(b"nope")?, None);
    assert_eq!(storage.get_blobs::<Tag>(b"nope")?, None);
    Ok(())
}

#[test]
fn malformed_bytes_fail_loudly_instead_of_reading_as_absent() -> Result<()> {
    let storage = open_storage()?;
    // Bypass the pipeline and plant garbage under the key.
    KvAccess::put(storage.database(), b"user:bad", b"garbage")?;

    assert!(matches!(
        storage.get::<User>(b"user:bad"),
        Err(StorageError::Deserialize(_))
    ));
    Ok(())
}

#[test]
fn delete_makes_key_absent() -> Result<()> {
    let storage = open_storage()?;
    storage.put(b"user:ada", &sample_user())?;
    storage.delete(b"user:ada")?;
    assert_eq!(storage.get::<User>(b"user:ada")?, None);
    Ok(())
}

#[test]
fn checksum_configured_storage_roundtrips_and_detects_tampering() -> Result<()> {
    let db: Database<MemStore> =
        Database::open("storage-test", &Options::default().create_if_missing(true))?;
    let storage = Storage::new(
        db,
        StorageConfiguration::default()
            .with_byte_codec(Box::new(Checksum), Box::new(Checksum)),
    );

    let user = sample_user();
    storage.put(b"user", &user)?;
    assert_eq!(storage.get::<User>(b"user")?, Some(user));

    // Flip a stored byte underneath the pipeline.
    let mut stored = KvAccess::get(storage.database(), b"user")?.expect("just written");
    let last = stored.len() - 1;
    stored[last] ^= 0xFF;
    KvAccess::put(storage.database(), b"user", &stored)?;

    assert!(matches!(
        storage.get::<User>(b"user"),
        Err(StorageError::Decode(_))
    ));
    Ok(())
}

// --------------------- Call-recording mock ---------------------

/// Records calls and serves canned bytes, like a hand-rolled test double
/// for any `KvAccess` backend.
struct MockKv {
    canned: Option<Vec<u8>>,
    gets: RefCell<Vec<Vec<u8>>>,
    puts: RefCell<Vec<(Vec<u8>, Vec<u8>)>>,
    deletes: RefCell<Vec<Vec<u8>>>,
}

impl MockKv {
    fn serving(canned: Option<Vec<u8>>) -> Self {
        Self {
            canned,
            gets: RefCell::new(Vec::new()),
            puts: RefCell::new(Vec::new()),
            deletes: RefCell::new(Vec::new()),
        }
    }
}

impl KvAccess for MockKv {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.gets.borrow_mut().push(key.to_vec());
        Ok(self.canned.clone())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.puts.borrow_mut().push((key.to_vec(), value.to_vec()));
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.deletes.borrow_mut().push(key.to_vec());
        Ok(())
    }
}

#[test]
fn put_drives_serializer_then_encoder_then_store() -> Result<()> {
    let storage = Storage::new(
        MockKv::serving(None),
        StorageConfiguration::default()
            .with_byte_codec(Box::new(Checksum), Box::new(Checksum)),
    );

    storage.put(b"k", &sample_user())?;

    let puts = storage.database().puts.borrow();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, b"k");
    // What reached the store is the checksum-framed serializer output.
    let framed = puts[0].1.clone();
    let unframed = Checksum.decode(&framed)?;
    let entry = EntryCodec.deserialize(&unframed)?;
    assert_eq!(User::from_entry(&entry)?, sample_user());
    Ok(())
}

#[test]
fn get_drives_decoder_then_deserializer() -> Result<()> {
    let canned = EntryCodec.serialize(&sample_user().to_entry())?;
    let storage = Storage::new(MockKv::serving(Some(canned)), StorageConfiguration::default());

    let user: Option<User> = storage.get(b"whatever")?;
    assert_eq!(user, Some(sample_user()));
    assert_eq!(storage.database().gets.borrow().len(), 1);
    Ok(())
}

#[test]
fn delete_reaches_the_store_untouched() -> Result<()> {
    let storage = Storage::new(MockKv::serving(None), StorageConfiguration::default());
    storage.delete(b"k")?;
    assert_eq!(
        storage.database().deletes.borrow().as_slice(),
        &[b"k".to_vec()]
    );
    Ok(())
}
