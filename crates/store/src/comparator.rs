//! Key ordering.

use std::cmp::Ordering;

/// Total order over opaque byte keys, plus a stable name used to check
/// compatibility with the ordering a store was created with.
///
/// Implementations must be consistent and transitive. Supplying a
/// comparator whose order disagrees with the one the underlying store was
/// opened with makes iteration behavior undefined; this layer cannot
/// verify the match beyond the name.
pub trait Comparator: Send + Sync {
    fn name(&self) -> &str;
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;
}

/// The default bytewise comparator: lexicographic over the shared prefix,
/// shorter key first when the shared prefix is equal.
///
/// The name matches LevelDB's built-in comparator so a store created with
/// default options is compatible.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn name(&self) -> &str {
        "leveldb.BytewiseComparator"
    }

    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        let shared = a.len().min(b.len());
        match a[..shared].cmp(&b[..shared]) {
            Ordering::Equal => a.len().cmp(&b.len()),
            ord => ord,
        }
    }
}
