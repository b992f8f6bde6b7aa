use takabook_core::ServiceError;
use takabook_kv::KVStore;
use tracing::debug;

use crate::collection::{kv_err, prepare_create, prepare_update, Document};

/// Stages document writes and commits them in one store transaction.
///
/// Hooks and timestamps run when a record is staged, so the returned
/// record is exactly what will be written.
#[derive(Default)]
pub struct WriteBatch {
    entries: Vec<(String, Vec<u8>)>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a new record (id assigned if missing, creation time stamped).
    pub fn insert<T: Document>(&mut self, record: T) -> Result<T, ServiceError> {
        let (key, bytes, record) = prepare_create(record)?;
        self.entries.push((key, bytes));
        Ok(record)
    }

    /// Stage a full replacement of an existing record.
    pub fn save<T: Document>(&mut self, record: T) -> Result<T, ServiceError> {
        let (key, bytes, record) = prepare_update(record)?;
        self.entries.push((key, bytes));
        Ok(record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write every staged record, all or nothing. Returns the number written.
    pub fn commit(self, kv: &dyn KVStore) -> Result<usize, ServiceError> {
        if self.entries.is_empty() {
            return Ok(0);
        }
        let refs: Vec<(&str, &[u8])> = self
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
            .collect();
        kv.batch_set(&refs).map_err(kv_err)?;
        debug!(writes = refs.len(), "batch committed");
        Ok(refs.len())
    }
}
