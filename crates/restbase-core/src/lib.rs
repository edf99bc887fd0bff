//! restbase core - resource manifest and JSON document storage.
//!
//! This crate holds everything the HTTP layer needs apart from HTTP itself:
//! the resource manifest, object ids, the SQLite document store and the
//! whole-database maintenance operations.
//!
//! # Example
//!
//! ```rust,no_run
//! use restbase_core::{DocumentStore, ResourceRegistry, SqliteDocumentStore};
//! use serde_json::json;
//!
//! fn main() -> restbase_core::Result<()> {
//!     let registry = ResourceRegistry::load("/config/resources.json")?;
//!     let store = SqliteDocumentStore::open("data/mongoDatabase.sqlite3")?;
//!
//!     restbase_core::reset(&store, &registry)?;
//!     let id = store.insert_document("entities", json!({"name": "alpha"}))?;
//!     let doc = store.query_document_by_id("entities", &id.to_hex())?;
//!     println!("{}", doc.to_json());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod maintenance;
pub mod object_id;
pub mod resources;
pub mod store;

pub use config::{LogConfig, ServerConfig, StoreConfig};
pub use error::{RestbaseError, Result};
pub use maintenance::{reset, self_test};
pub use object_id::ObjectId;
pub use resources::{DocumentBody, ResourceDefinition, ResourceRegistry};
pub use store::{Document, DocumentStore, SqliteDocumentStore, UpsertOutcome};
