//! SQLite-based document store.

use super::traits::{into_body, Document, DocumentStore, UpsertOutcome};
use crate::config::StoreConfig;
use crate::error::{RestbaseError, Result};
use crate::object_id::ObjectId;
use crate::resources::DocumentBody;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// SQLite-backed document store.
///
/// All collections share one `documents` table; `seq` preserves insertion
/// order for paging. Thread-safe via an internal mutex on the connection.
pub struct SqliteDocumentStore {
    conn: Arc<Mutex<Connection>>,
    page_size: u64,
}

impl SqliteDocumentStore {
    /// Open (or create) a store at the given database path.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| RestbaseError::Io {
                message: format!("Failed to create database directory: {}", e),
                path: Some(parent.to_path_buf()),
                source: Some(e),
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| RestbaseError::Database {
            message: format!("Failed to open document database: {}", e),
            source: Some(e),
        })?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(|e| RestbaseError::Database {
                message: format!("Failed to set pragmas: {}", e),
                source: Some(e),
            })?;

        info!("Opened document store at {}", db_path.display());
        Self::from_connection(conn)
    }

    /// Create a store that lives only as long as the process.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| RestbaseError::Database {
            message: format!("Failed to open in-memory database: {}", e),
            source: Some(e),
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            page_size: StoreConfig::ITEMS_PER_PAGE,
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Override the number of documents returned per page.
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(RestbaseError::lock_poisoned)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body TEXT NOT NULL,
                UNIQUE (collection, id)
            );

            -- Paging walks a collection in insertion order
            CREATE INDEX IF NOT EXISTS idx_documents_collection
                ON documents(collection, seq);
            "#,
        )
        .map_err(|e| RestbaseError::Database {
            message: format!("Failed to initialize document schema: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }

    fn decode_row(id: &str, body: &str) -> Result<Document> {
        let id = ObjectId::parse_str(id).map_err(|_| RestbaseError::Database {
            message: format!("Corrupt document id in database: {}", id),
            source: None,
        })?;
        let body: DocumentBody = serde_json::from_str(body)?;
        Ok(Document { id, body })
    }

    fn insert_row(conn: &Connection, collection: &str, id: &ObjectId, body: &DocumentBody) -> Result<()> {
        let body = serde_json::to_string(body)?;

        conn.execute(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES (?1, ?2, ?3)
            "#,
            params![collection, id.to_hex(), body],
        )
        .map_err(|e| RestbaseError::Database {
            message: format!("Failed to insert document: {}", e),
            source: Some(e),
        })?;

        Ok(())
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn query_collection(&self, collection: &str, page: u64) -> Result<Vec<Document>> {
        let conn = self.lock()?;

        let offset = page
            .checked_mul(self.page_size)
            .and_then(|o| i64::try_from(o).ok())
            .unwrap_or(i64::MAX);
        let limit = i64::try_from(self.page_size).unwrap_or(i64::MAX);

        let mut stmt = conn
            .prepare(
                r#"
                SELECT id, body FROM documents
                WHERE collection = ?1
                ORDER BY seq ASC
                LIMIT ?2 OFFSET ?3
                "#,
            )
            .map_err(|e| RestbaseError::Database {
                message: format!("Failed to prepare collection query: {}", e),
                source: Some(e),
            })?;

        let rows: Vec<(String, String)> = stmt
            .query_map(params![collection, limit, offset], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<std::result::Result<_, _>>()?;

        debug!(
            "Collection '{}' page {} returned {} documents",
            collection,
            page,
            rows.len()
        );

        rows.iter()
            .map(|(id, body)| Self::decode_row(id, body))
            .collect()
    }

    fn query_document_by_id(&self, collection: &str, id: &str) -> Result<Document> {
        let object_id = ObjectId::parse_str(id)?;
        let conn = self.lock()?;

        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, object_id.to_hex()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RestbaseError::Database {
                message: format!("Failed to query document: {}", e),
                source: Some(e),
            })?;

        match body {
            Some(body) => Ok(Document {
                id: object_id,
                body: serde_json::from_str(&body)?,
            }),
            None => Err(RestbaseError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    fn insert_document(&self, collection: &str, data: Value) -> Result<ObjectId> {
        let body = into_body(data)?;
        let id = ObjectId::new();

        let conn = self.lock()?;
        Self::insert_row(&conn, collection, &id, &body)?;

        debug!("Inserted document {} into '{}'", id, collection);
        Ok(id)
    }

    fn upsert_document_by_id(
        &self,
        collection: &str,
        data: Value,
        id: &str,
    ) -> Result<UpsertOutcome> {
        let object_id = ObjectId::parse_str(id)?;
        let body = into_body(data)?;
        let serialized = serde_json::to_string(&body)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let updated = tx
            .execute(
                r#"
                UPDATE documents SET body = ?1
                WHERE collection = ?2 AND id = ?3
                "#,
                params![serialized, collection, object_id.to_hex()],
            )
            .map_err(|e| RestbaseError::Database {
                message: format!("Failed to replace document: {}", e),
                source: Some(e),
            })?;

        let outcome = if updated > 0 {
            UpsertOutcome::Updated
        } else {
            Self::insert_row(&tx, collection, &object_id, &body)?;
            UpsertOutcome::Inserted(object_id)
        };

        tx.commit()?;

        debug!("Upserted document {} in '{}': {:?}", object_id, collection, outcome);
        Ok(outcome)
    }

    fn delete_document_by_id(&self, collection: &str, id: &str) -> Result<()> {
        let object_id = ObjectId::parse_str(id)?;
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, object_id.to_hex()],
            )
            .map_err(|e| RestbaseError::Database {
                message: format!("Failed to delete document: {}", e),
                source: Some(e),
            })?;

        if deleted == 0 {
            return Err(RestbaseError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            });
        }

        debug!("Deleted document {} from '{}'", object_id, collection);
        Ok(())
    }

    fn drop_collection(&self, collection: &str) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1",
                params![collection],
            )
            .map_err(|e| RestbaseError::Database {
                message: format!("Failed to drop collection: {}", e),
                source: Some(e),
            })?;

        debug!("Dropped {} documents from '{}'", deleted, collection);
        Ok(deleted)
    }

    fn drop_all(&self) -> Result<usize> {
        let conn = self.lock()?;

        let deleted = conn
            .execute("DELETE FROM documents", [])
            .map_err(|e| RestbaseError::Database {
                message: format!("Failed to drop database: {}", e),
                source: Some(e),
            })?;

        debug!("Dropped {} documents across all collections", deleted);
        Ok(deleted)
    }

    fn collections(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT DISTINCT collection FROM documents ORDER BY collection",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(names)
    }

    fn count(&self, collection: &str) -> Result<u64> {
        let conn = self.lock()?;

        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let store = store();
        let id = store
            .insert_document("entities", json!({"name": "alpha", "value": 1}))
            .unwrap();

        let doc = store
            .query_document_by_id("entities", &id.to_string())
            .unwrap();
        assert_eq!(doc.id, id);
        assert_eq!(doc.get("name"), Some(&json!("alpha")));
    }

    #[test]
    fn test_insert_ignores_client_id() {
        let store = store();
        let id = store
            .insert_document("entities", json!({"_id": "64b7f0c2a1b2c3d4e5f60718", "n": 1}))
            .unwrap();

        assert_ne!(id.to_string(), "64b7f0c2a1b2c3d4e5f60718");
        let doc = store.query_document_by_id("entities", &id.to_hex()).unwrap();
        assert!(doc.get("_id").is_none());
    }

    #[test]
    fn test_get_missing_and_invalid() {
        let store = store();

        let err = store
            .query_document_by_id("entities", "64b7f0c2a1b2c3d4e5f60718")
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(
            err.to_string(),
            "id 64b7f0c2a1b2c3d4e5f60718 not found in entities"
        );

        let err = store.query_document_by_id("entities", "nope").unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_collections_are_isolated() {
        let store = store();
        let id = store.insert_document("a", json!({"x": 1})).unwrap();

        assert!(store.query_document_by_id("b", &id.to_hex()).is_err());
        assert_eq!(store.count("a").unwrap(), 1);
        assert_eq!(store.count("b").unwrap(), 0);
    }

    #[test]
    fn test_paging_in_insertion_order() {
        let store = store();
        for i in 0..25 {
            store.insert_document("items", json!({ "i": i })).unwrap();
        }

        let page = |n| -> Vec<i64> {
            store
                .query_collection("items", n)
                .unwrap()
                .iter()
                .map(|d| d.get("i").and_then(Value::as_i64).unwrap())
                .collect()
        };

        assert_eq!(page(0), (0..10).collect::<Vec<_>>());
        assert_eq!(page(1), (10..20).collect::<Vec<_>>());
        assert_eq!(page(2), (20..25).collect::<Vec<_>>());
        assert!(page(3).is_empty());
        assert!(page(u64::MAX).is_empty());
        assert!(store.query_collection("unknown", 0).unwrap().is_empty());
    }

    #[test]
    fn test_custom_page_size() {
        let store = store().with_page_size(3);
        for i in 0..5 {
            store.insert_document("items", json!({ "i": i })).unwrap();
        }
        assert_eq!(store.query_collection("items", 1).unwrap().len(), 2);
    }

    #[test]
    fn test_upsert_replaces_then_inserts() {
        let store = store();
        let id = store
            .insert_document("entities", json!({"name": "a", "extra": true}))
            .unwrap();

        let outcome = store
            .upsert_document_by_id("entities", json!({"name": "b"}), &id.to_hex())
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let doc = store.query_document_by_id("entities", &id.to_hex()).unwrap();
        assert_eq!(doc.get("name"), Some(&json!("b")));
        assert!(doc.get("extra").is_none(), "replace must not merge fields");

        let fresh = "64b7f0c2a1b2c3d4e5f60718";
        let outcome = store
            .upsert_document_by_id("entities", json!({"name": "c"}), fresh)
            .unwrap();
        assert_eq!(
            outcome,
            UpsertOutcome::Inserted(ObjectId::parse_str(fresh).unwrap())
        );
        assert_eq!(store.count("entities").unwrap(), 2);
    }

    #[test]
    fn test_upsert_keeps_position() {
        let store = store();
        let first = store.insert_document("items", json!({"i": 0})).unwrap();
        store.insert_document("items", json!({"i": 1})).unwrap();

        store
            .upsert_document_by_id("items", json!({"i": 99}), &first.to_hex())
            .unwrap();

        let docs = store.query_collection("items", 0).unwrap();
        assert_eq!(docs[0].id, first);
        assert_eq!(docs[0].get("i"), Some(&json!(99)));
    }

    #[test]
    fn test_upsert_rejects_bad_input() {
        let store = store();
        let err = store
            .upsert_document_by_id("entities", json!({"a": 1}), "xyz")
            .unwrap_err();
        assert!(matches!(err, RestbaseError::InvalidObjectId { .. }));

        let err = store
            .upsert_document_by_id("entities", json!([1, 2]), "64b7f0c2a1b2c3d4e5f60718")
            .unwrap_err();
        assert!(matches!(err, RestbaseError::Validation { .. }));
    }

    #[test]
    fn test_delete() {
        let store = store();
        let id = store.insert_document("entities", json!({"a": 1})).unwrap();

        store.delete_document_by_id("entities", &id.to_hex()).unwrap();
        let err = store
            .delete_document_by_id("entities", &id.to_hex())
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(
            store
                .delete_document_by_id("entities", "bad")
                .unwrap_err()
                .status_code(),
            422
        );
    }

    #[test]
    fn test_drop_collection_and_all() {
        let store = store();
        store.insert_document("a", json!({"x": 1})).unwrap();
        store.insert_document("a", json!({"x": 2})).unwrap();
        store.insert_document("b", json!({"x": 3})).unwrap();

        assert_eq!(store.collections().unwrap(), vec!["a", "b"]);
        assert_eq!(store.drop_collection("a").unwrap(), 2);
        assert_eq!(store.collections().unwrap(), vec!["b"]);
        assert_eq!(store.drop_all().unwrap(), 1);
        assert!(store.collections().unwrap().is_empty());
    }

    #[test]
    fn test_schema_stores_only_document_data() {
        let store = store();
        let conn = store.lock().unwrap();
        let mut stmt = conn.prepare("PRAGMA table_info(documents)").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(1))
            .unwrap()
            .collect::<std::result::Result<_, _>>()
            .unwrap();
        assert_eq!(columns, vec!["seq", "collection", "id", "body"]);
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("docs.sqlite3");

        let id = {
            let store = SqliteDocumentStore::open(&path).unwrap();
            store.insert_document("entities", json!({"k": "v"})).unwrap()
        };

        let store = SqliteDocumentStore::open(&path).unwrap();
        let doc = store.query_document_by_id("entities", &id.to_hex()).unwrap();
        assert_eq!(doc.get("k"), Some(&json!("v")));
    }
}
