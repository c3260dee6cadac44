//! Conversions between typed records and schemaless store documents.

use super::{LedgerError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A stored document: a JSON object keyed by field name.
pub type Document = Map<String, Value>;

/// Field holding the store-assigned key of every document.
pub const KEY_FIELD: &str = "key";

pub fn to_document<T: Serialize>(record: &T) -> Result<Document> {
    match serde_json::to_value(record)? {
        Value::Object(map) => Ok(map),
        other => Err(LedgerError::Serialization(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

pub fn from_document<T: DeserializeOwned>(document: Document) -> Result<T> {
    Ok(serde_json::from_value(Value::Object(document))?)
}

/// Returns the store key of a document, if it carries one.
pub fn document_key(document: &Document) -> Option<&str> {
    document.get(KEY_FIELD).and_then(Value::as_str)
}
