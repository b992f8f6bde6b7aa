use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, Table, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::KVStore;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// RedbStore is a KVStore implementation backed by redb, a pure-Rust embedded
/// key-value database with serializable write transactions.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(KVError::storage)?;
            }
        }
        let db = Database::create(path).map_err(KVError::storage)?;

        // Ensure the table exists by doing a write transaction.
        let store = Self { db: Arc::new(db) };
        store.write(|_table| Ok(()))?;
        debug!("opened document store at {}", path.display());
        Ok(store)
    }

    /// Run `f` inside one write transaction. Nothing is committed if `f` fails.
    fn write<F>(&self, f: F) -> Result<(), KVError>
    where
        F: FnOnce(&mut Table<'_, &'static str, &'static [u8]>) -> Result<(), KVError>,
    {
        let write_txn = self.db.begin_write().map_err(KVError::storage)?;
        {
            let mut table = write_txn.open_table(TABLE).map_err(KVError::storage)?;
            f(&mut table)?;
        }
        write_txn.commit().map_err(KVError::storage)?;
        Ok(())
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let read_txn = self.db.begin_read().map_err(KVError::storage)?;
        let table = read_txn.open_table(TABLE).map_err(KVError::storage)?;

        match table.get(key) {
            Ok(Some(val)) => Ok(Some(val.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(KVError::storage(e)),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        self.write(|table| {
            table.insert(key, value).map_err(KVError::storage)?;
            Ok(())
        })
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        self.write(|table| {
            table.remove(key).map_err(KVError::storage)?;
            Ok(())
        })
    }

    fn batch_set(&self, entries: &[(&str, &[u8])]) -> Result<(), KVError> {
        self.write(|table| {
            for (key, value) in entries {
                table.insert(*key, *value).map_err(KVError::storage)?;
            }
            Ok(())
        })
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let read_txn = self.db.begin_read().map_err(KVError::storage)?;
        let table = read_txn.open_table(TABLE).map_err(KVError::storage)?;

        let mut results = Vec::new();
        let iter = table.range(prefix..).map_err(KVError::storage)?;

        for entry in iter {
            let (key, value) = entry.map_err(KVError::storage)?;
            let key = key.value().to_string();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key, value.value().to_vec()));
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn set_get_delete() {
        let (store, _dir) = open_store();

        store.set("beams:f1:b1", b"{}").unwrap();
        assert_eq!(store.get("beams:f1:b1").unwrap(), Some(b"{}".to_vec()));

        store.delete("beams:f1:b1").unwrap();
        assert!(store.get("beams:f1:b1").unwrap().is_none());

        // Deleting again is fine.
        store.delete("beams:f1:b1").unwrap();
    }

    #[test]
    fn scan_stops_at_prefix_boundary() {
        let (store, _dir) = open_store();

        store.set("beams:f1:a", b"1").unwrap();
        store.set("beams:f1:b", b"2").unwrap();
        store.set("beams:f2:a", b"3").unwrap();
        store.set("workers:f1:a", b"4").unwrap();

        let hits = store.scan("beams:f1:").unwrap();
        let keys: Vec<&str> = hits.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["beams:f1:a", "beams:f1:b"]);
    }

    #[test]
    fn batch_set_commits_every_key() {
        let (store, _dir) = open_store();

        store
            .batch_set(&[("machines:f1:machine_1", b"1"), ("machines:f1:machine_2", b"2")])
            .unwrap();
        assert_eq!(store.scan("machines:f1:").unwrap().len(), 2);
    }

    #[test]
    fn reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("persist.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("workers:f1:w1", b"ravi").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("workers:f1:w1").unwrap(), Some(b"ravi".to_vec()));
    }
}
