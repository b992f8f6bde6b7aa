//! Centralized timestamp management for store operations.
//!
//! `stamp_create` and `stamp_update` inject the creation and `updatedAt`
//! fields into serialized JSON objects. Used by both `Collection` and
//! `WriteBatch` so the logic lives in one place.

use serde_json::Value;

/// Stamp the creation field (if empty) and `updatedAt` on a JSON object.
///
/// `created_field` is the model's own name for its creation time
/// (`createdAt`, `recordedAt`, `performedAt`, ...). `None` skips it.
pub(crate) fn stamp_create(val: &mut Value, created_field: Option<&str>) {
    if let Some(obj) = val.as_object_mut() {
        let now = Value::String(chrono::Utc::now().to_rfc3339());
        if let Some(field) = created_field {
            let empty = match obj.get(field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.is_empty(),
                Some(_) => false,
            };
            if empty {
                obj.insert(field.to_string(), now.clone());
            }
        }
        if obj.contains_key("updatedAt") {
            obj.insert("updatedAt".into(), now);
        }
    }
}

/// Stamp a fresh `updatedAt` on a JSON object that carries one.
pub(crate) fn stamp_update(val: &mut Value) {
    if let Some(obj) = val.as_object_mut() {
        if obj.contains_key("updatedAt") {
            obj.insert(
                "updatedAt".into(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
        }
    }
}
