//! Conversion between typed collections and the remote JSON tree.
//!
//! A collection is stored as an object keyed by record id. Reading also
//! accepts arrays (the database returns those for integer-like keys) and
//! `null` for a collection that was never written.

use serde_json::{Map, Value};

use super::StorageError;
use crate::cache::schema::decode_records;
use crate::models::Record;

pub fn records_to_tree<R: Record>(records: &[R]) -> Result<Value, StorageError> {
    let mut tree = Map::new();
    for record in records {
        let value = serde_json::to_value(record)
            .map_err(|e| StorageError::InvalidResponse(format!("Failed to encode record: {}", e)))?;
        tree.insert(record.id().to_string(), value);
    }
    Ok(Value::Object(tree))
}

pub fn tree_to_records<R: Record>(tree: Value) -> Result<Vec<R>, StorageError> {
    let raw: Vec<Value> = match tree {
        Value::Null => Vec::new(),
        Value::Object(map) => map
            .into_iter()
            .map(|(key, mut value)| {
                // Older writers kept the id only as the key
                if let Value::Object(ref mut fields) = value {
                    fields.entry("id").or_insert(Value::String(key));
                }
                value
            })
            .collect(),
        Value::Array(items) => items.into_iter().filter(|v| !v.is_null()).collect(),
        other => {
            return Err(StorageError::InvalidResponse(format!(
                "Expected {} collection, got {}",
                R::COLLECTION,
                other
            )))
        }
    };

    decode_records(raw).map_err(|e| {
        StorageError::InvalidResponse(format!("Failed to decode {}: {}", R::COLLECTION, e))
    })
}
