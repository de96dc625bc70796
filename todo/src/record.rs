//! Stored document layout of a to-do item.
//!
//! Field names follow the existing collection: `userId`, `text`,
//! `completed`, `datetime`. The document id is not part of the body.

use crate::collection::{Document, Fields, RemoteAccessError};
use crate::types::{CreatedAt, ItemId, TodoItem, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Owner field, used for per-user queries
pub const OWNER_FIELD: &str = "userId";

/// Completion field, the only field ever updated
pub const COMPLETED_FIELD: &str = "completed";

/// Creation timestamp field, used for ordering
pub const CREATED_AT_FIELD: &str = "datetime";

#[derive(Debug, Serialize, Deserialize)]
struct TodoRecord {
    #[serde(rename = "userId")]
    owner_id: UserId,
    text: String,
    #[serde(default)]
    completed: bool,
    #[serde(rename = "datetime")]
    created_at: CreatedAt,
}

/// Body of a newly created item
///
/// # Errors
///
/// Returns [`RemoteAccessError::Malformed`] if the record does not serialize
/// to a JSON object.
pub fn new_item_fields(
    owner_id: &UserId,
    text: &str,
    created_at: &CreatedAt,
) -> Result<Fields, RemoteAccessError> {
    let record = TodoRecord {
        owner_id: owner_id.clone(),
        text: text.to_string(),
        completed: false,
        created_at: created_at.clone(),
    };

    match serde_json::to_value(record) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(RemoteAccessError::Malformed(format!(
            "expected an object, serialized {other}"
        ))),
        Err(error) => Err(RemoteAccessError::Malformed(error.to_string())),
    }
}

/// Partial body setting the completion flag
#[must_use]
pub fn completed_patch(completed: bool) -> Fields {
    let mut fields = Fields::new();
    fields.insert(COMPLETED_FIELD.to_string(), Value::Bool(completed));
    fields
}

/// Decode a stored document into an item
///
/// # Errors
///
/// Returns [`RemoteAccessError::Malformed`] naming the document if its body
/// lacks a required field or has one of the wrong type.
pub fn decode(document: Document) -> Result<TodoItem, RemoteAccessError> {
    let Document { id, fields } = document;
    let record: TodoRecord = serde_json::from_value(Value::Object(fields))
        .map_err(|error| RemoteAccessError::Malformed(format!("document {id}: {error}")))?;

    Ok(TodoItem {
        id: ItemId::new(id),
        owner_id: record.owner_id,
        text: record.text,
        completed: record.completed,
        created_at: record.created_at,
    })
}
