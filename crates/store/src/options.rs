//! Option bundles for open, read, and write paths.
//!
//! Defaults mirror LevelDB's: 4 MiB write buffer, 1000 open files, 4 KiB
//! blocks, restart interval 16, Snappy compression, cache-filling
//! non-verifying reads, async writes.

use crate::Comparator;
use std::sync::Arc;

/// Block compression applied by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    None,
    #[default]
    Snappy,
}

/// Open-time configuration for a store.
#[derive(Clone)]
pub struct Options {
    pub create_if_missing: bool,
    pub error_if_exists: bool,
    pub paranoid_checks: bool,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    pub max_open_files: usize,
    /// Block size in bytes.
    pub block_size: usize,
    pub block_restart_interval: usize,
    pub compression: Compression,
    /// Ordering override. `None` means the backend's bytewise default.
    /// Must match whatever the store was originally created with.
    pub comparator: Option<Arc<dyn Comparator>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            create_if_missing: false,
            error_if_exists: false,
            paranoid_checks: false,
            write_buffer_size: 4 * 1024 * 1024,
            max_open_files: 1000,
            block_size: 4 * 1024,
            block_restart_interval: 16,
            compression: Compression::default(),
            comparator: None,
        }
    }
}

impl Options {
    pub fn create_if_missing(mut self, yes: bool) -> Self {
        self.create_if_missing = yes;
        self
    }

    pub fn error_if_exists(mut self, yes: bool) -> Self {
        self.error_if_exists = yes;
        self
    }

    pub fn comparator(mut self, comparator: Arc<dyn Comparator>) -> Self {
        self.comparator = Some(comparator);
        self
    }

    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("create_if_missing", &self.create_if_missing)
            .field("error_if_exists", &self.error_if_exists)
            .field("paranoid_checks", &self.paranoid_checks)
            .field("write_buffer_size", &self.write_buffer_size)
            .field("max_open_files", &self.max_open_files)
            .field("block_size", &self.block_size)
            .field("block_restart_interval", &self.block_restart_interval)
            .field("compression", &self.compression)
            .field("comparator", &self.comparator.as_ref().map(|c| c.name()))
            .finish()
    }
}

/// Per-read configuration. `Snap` is the backend's snapshot handle type.
#[derive(Debug, Clone)]
pub struct ReadOptions<Snap> {
    pub verify_checksums: bool,
    pub fill_cache: bool,
    /// Read from this frozen view instead of the live store.
    pub snapshot: Option<Snap>,
}

impl<Snap> Default for ReadOptions<Snap> {
    fn default() -> Self {
        Self {
            verify_checksums: false,
            fill_cache: true,
            snapshot: None,
        }
    }
}

impl<Snap> ReadOptions<Snap> {
    pub fn verify_checksums(mut self, yes: bool) -> Self {
        self.verify_checksums = yes;
        self
    }

    pub fn fill_cache(mut self, yes: bool) -> Self {
        self.fill_cache = yes;
        self
    }

    pub fn snapshot(mut self, snapshot: Snap) -> Self {
        self.snapshot = Some(snapshot);
        self
    }
}

/// Per-write configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// If `true`, the backend syncs to durable media before returning.
    pub sync: bool,
}

impl WriteOptions {
    pub fn sync(mut self, yes: bool) -> Self {
        self.sync = yes;
        self
    }
}
