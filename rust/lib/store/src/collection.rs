//! Document trait + Collection CRUD operations.
//!
//! The model impls `Document` to declare its collection, scope, key and
//! hooks. `Collection<T>` provides the actual get/find/insert/save/delete
//! using a KVStore backend.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use takabook_core::{new_id, ServiceError};
use takabook_kv::{KVError, KVStore};
use tracing::debug;

use crate::timestamp::{stamp_create, stamp_update};

/// Trait implemented by models to declare document storage behavior.
///
/// Documents live under `{COLLECTION}:{scope}:{key}`. The scope is the
/// tenant partition: every read is confined to one scope, so one factory
/// never sees another factory's records.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name. Part of the storage wire contract; never rename.
    const COLLECTION: &'static str;

    /// JSON field holding the creation time, stamped on insert when empty.
    const CREATED_FIELD: Option<&'static str> = Some("createdAt");

    /// Tenant partition this record belongs to.
    fn scope(&self) -> String;

    /// The record id.
    fn key_value(&self) -> String;

    /// Assign an id to a record that has none.
    fn set_key(&mut self, id: String);

    /// Called before inserting a new record.
    fn before_create(&mut self) {}

    /// Called before writing an update.
    fn before_update(&mut self) {}
}

pub(crate) fn kv_err(e: KVError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

pub(crate) fn make_key<T: Document>(scope: &str, id: &str) -> String {
    format!("{}:{}:{}", T::COLLECTION, scope, id)
}

fn scope_prefix<T: Document>(scope: &str) -> String {
    format!("{}:{}:", T::COLLECTION, scope)
}

fn decode<T: Document>(bytes: &[u8]) -> Result<T, ServiceError> {
    serde_json::from_slice(bytes)
        .map_err(|e| ServiceError::Internal(format!("deserialize {}: {}", T::COLLECTION, e)))
}

/// Run hooks and stamps for a new record. Returns (key, bytes, stamped record).
pub(crate) fn prepare_create<T: Document>(
    mut record: T,
) -> Result<(String, Vec<u8>, T), ServiceError> {
    record.before_create();
    if record.key_value().is_empty() {
        record.set_key(new_id());
    }
    let mut value = serde_json::to_value(&record)
        .map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))?;
    stamp_create(&mut value, T::CREATED_FIELD);
    encode(value)
}

/// Run hooks and stamps for an update of an existing record.
pub(crate) fn prepare_update<T: Document>(
    mut record: T,
) -> Result<(String, Vec<u8>, T), ServiceError> {
    record.before_update();
    if record.key_value().is_empty() {
        return Err(ServiceError::Internal(format!(
            "cannot save {} without an id",
            T::COLLECTION
        )));
    }
    let mut value = serde_json::to_value(&record)
        .map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))?;
    stamp_update(&mut value);
    encode(value)
}

fn encode<T: Document>(value: serde_json::Value) -> Result<(String, Vec<u8>, T), ServiceError> {
    let bytes = serde_json::to_vec(&value)
        .map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))?;
    let record: T = serde_json::from_value(value)
        .map_err(|e| ServiceError::Internal(format!("deserialize {}: {}", T::COLLECTION, e)))?;
    let key = make_key::<T>(&record.scope(), &record.key_value());
    Ok((key, bytes, record))
}

/// CRUD operations for one document collection.
pub struct Collection<T: Document> {
    kv: Arc<dyn KVStore>,
    _phantom: PhantomData<T>,
}

impl<T: Document> Collection<T> {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            kv,
            _phantom: PhantomData,
        }
    }

    /// Get a record by id. Returns None if not found.
    pub fn get(&self, scope: &str, id: &str) -> Result<Option<T>, ServiceError> {
        match self.kv.get(&make_key::<T>(scope, id)).map_err(kv_err)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Get a record or return NotFound error.
    pub fn get_or_err(&self, scope: &str, id: &str) -> Result<T, ServiceError> {
        self.get(scope, id)?.ok_or_else(|| {
            ServiceError::NotFound(format!("{} '{}' not found", T::COLLECTION, id))
        })
    }

    /// List every record in a scope, in key order.
    pub fn list(&self, scope: &str) -> Result<Vec<T>, ServiceError> {
        self.find(scope, |_| true)
    }

    /// List the records in a scope that satisfy `pred`.
    ///
    /// The scope prefix scan is unavoidable for a KV store; the predicate
    /// only decides what is returned to the caller.
    pub fn find<F>(&self, scope: &str, pred: F) -> Result<Vec<T>, ServiceError>
    where
        F: Fn(&T) -> bool,
    {
        let entries = self.kv.scan(&scope_prefix::<T>(scope)).map_err(kv_err)?;
        let scanned = entries.len();
        let mut records = Vec::new();
        for (_key, bytes) in entries {
            let record: T = decode(&bytes)?;
            if pred(&record) {
                records.push(record);
            }
        }
        debug!(
            collection = T::COLLECTION,
            scanned,
            matched = records.len(),
            "query"
        );
        Ok(records)
    }

    /// Count all records in a scope.
    pub fn count(&self, scope: &str) -> Result<usize, ServiceError> {
        let entries = self.kv.scan(&scope_prefix::<T>(scope)).map_err(kv_err)?;
        Ok(entries.len())
    }

    /// Create a new record. Calls before_create, assigns an id if missing,
    /// stamps the creation time and checks for duplicates.
    pub fn insert(&self, record: T) -> Result<T, ServiceError> {
        let (key, bytes, record) = prepare_create(record)?;

        if self.kv.get(&key).map_err(kv_err)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "{} '{}' already exists",
                T::COLLECTION,
                record.key_value()
            )));
        }

        self.kv.set(&key, &bytes).map_err(kv_err)?;
        Ok(record)
    }

    /// Write an existing record (full replacement). Calls before_update.
    pub fn save(&self, record: T) -> Result<T, ServiceError> {
        let (key, bytes, record) = prepare_update(record)?;
        self.kv.set(&key, &bytes).map_err(kv_err)?;
        Ok(record)
    }

    /// Remove a record by id.
    pub fn delete(&self, scope: &str, id: &str) -> Result<(), ServiceError> {
        self.get_or_err(scope, id)?;
        self.kv.delete(&make_key::<T>(scope, id)).map_err(kv_err)?;
        Ok(())
    }
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.kv))
    }
}
