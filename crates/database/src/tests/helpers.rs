use crate::{Database, MemStore, Options, WriteOptions};
use anyhow::Result;

pub fn open_db() -> Result<Database<MemStore>> {
    Ok(Database::open(
        "test-db",
        &Options::default().create_if_missing(true),
    )?)
}

/// Inserts `("test1","test1")`, `("test2","test2")`, `("test3","test3")`.
pub fn seed_test_keys(db: &Database<MemStore>) -> Result<()> {
    for name in ["test1", "test2", "test3"] {
        db.put(name.as_bytes(), name.as_bytes(), &WriteOptions::default())?;
    }
    Ok(())
}

pub fn as_strings(keys: Vec<Vec<u8>>) -> Vec<String> {
    keys.into_iter()
        .map(|k| String::from_utf8(k).expect("test keys are utf8"))
        .collect()
}
