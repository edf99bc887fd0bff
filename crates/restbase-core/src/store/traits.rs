//! Document store trait and types.

use crate::error::{RestbaseError, Result};
use crate::object_id::ObjectId;
use crate::resources::DocumentBody;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Field holding a document's identifier in its JSON representation.
pub const ID_FIELD: &str = "_id";

/// A stored document: its id plus the JSON object it was saved with.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: ObjectId,
    pub body: DocumentBody,
}

impl Document {
    /// JSON representation with `_id` as the first field.
    pub fn to_json(&self) -> Value {
        let mut object = Map::with_capacity(self.body.len() + 1);
        object.insert(ID_FIELD.to_string(), self.id.to_extended_json());
        for (key, value) in &self.body {
            if key != ID_FIELD {
                object.insert(key.clone(), value.clone());
            }
        }
        Value::Object(object)
    }

    /// Convenience accessor for a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.get(field)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Result of replacing a document by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// An existing document was replaced.
    Updated,
    /// No document had the id, so one was inserted under it.
    Inserted(ObjectId),
}

impl UpsertOutcome {
    /// Response text reported to clients.
    pub fn message(&self) -> String {
        match self {
            UpsertOutcome::Updated => "updated document".to_string(),
            UpsertOutcome::Inserted(id) => id.to_string(),
        }
    }
}

/// Turn an incoming JSON value into a storable body.
///
/// The body must be an object. Any `_id` it carries is dropped, since ids
/// are assigned by the store and never rewritten.
pub fn into_body(data: Value) -> Result<DocumentBody> {
    match data {
        Value::Object(mut body) => {
            body.shift_remove(ID_FIELD);
            Ok(body)
        }
        other => Err(RestbaseError::Validation {
            field: "body".into(),
            message: format!("expected a JSON object, got {}", json_type_name(&other)),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Collection-oriented JSON document storage.
///
/// All operations are synchronous to match rusqlite's API. Collections come
/// into existence on first insert and disappear when their last document is
/// removed.
pub trait DocumentStore: Send + Sync {
    /// One page of a collection in insertion order.
    ///
    /// Skips `page * ITEMS_PER_PAGE` documents. Unknown collections yield an
    /// empty page.
    fn query_collection(&self, collection: &str, page: u64) -> Result<Vec<Document>>;

    /// Fetch a single document by its hex id.
    fn query_document_by_id(&self, collection: &str, id: &str) -> Result<Document>;

    /// Insert a new document under a freshly generated id.
    fn insert_document(&self, collection: &str, data: Value) -> Result<ObjectId>;

    /// Replace the document with the given id, inserting it if absent.
    fn upsert_document_by_id(&self, collection: &str, data: Value, id: &str)
        -> Result<UpsertOutcome>;

    /// Delete the document with the given id.
    fn delete_document_by_id(&self, collection: &str, id: &str) -> Result<()>;

    /// Remove every document in a collection. Returns how many were removed.
    fn drop_collection(&self, collection: &str) -> Result<usize>;

    /// Remove every document in every collection.
    fn drop_all(&self) -> Result<usize>;

    /// Names of all non-empty collections, sorted.
    fn collections(&self) -> Result<Vec<String>>;

    /// Number of documents in a collection.
    fn count(&self, collection: &str) -> Result<u64>;
}
