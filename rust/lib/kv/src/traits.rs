use crate::error::KVError;

/// KVStore is the document-store backend: byte values under string keys.
///
/// Keys follow a namespaced convention: `{collection}:{scope}:{id}`, e.g.
/// `beams:f1a2…:9c3e…` or `machines:f1a2…:machine_4`. A prefix scan over
/// `{collection}:{scope}:` returns one tenant's documents of one kind.
///
/// Single-key writes are atomic. `batch_set` commits all of its keys in one
/// transaction or none of them.
pub trait KVStore: Send + Sync {
    /// Get the value for a key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError>;

    /// Set a key-value pair, replacing any previous value.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError>;

    /// Delete a key. Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<(), KVError>;

    /// Set many key-value pairs atomically.
    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError>;

    /// Scan all keys matching a prefix. Returns (key, value) pairs sorted by key.
    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError>;
}
