//! Document storage.
//!
//! Every declared resource is backed by one collection. Documents are JSON
//! objects addressed by an [`ObjectId`](crate::ObjectId).

mod sqlite;
mod traits;

pub use sqlite::SqliteDocumentStore;
pub use traits::{into_body, Document, DocumentStore, UpsertOutcome, ID_FIELD};
