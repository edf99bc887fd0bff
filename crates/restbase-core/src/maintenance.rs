//! Whole-database operations: reseeding from the manifest and a smoke test
//! of the store's CRUD path.

use crate::config::StoreConfig;
use crate::error::{RestbaseError, Result};
use crate::object_id::ObjectId;
use crate::resources::ResourceRegistry;
use crate::store::{DocumentStore, UpsertOutcome};
use serde_json::{json, Value};
use tracing::{info, warn};

/// Drop every collection and reseed it with the manifest's samples.
///
/// Returns a status line naming the last inserted id.
pub fn reset(store: &dyn DocumentStore, registry: &ResourceRegistry) -> Result<String> {
    let dropped = store.drop_all()?;
    warn!("Reset dropped {} documents", dropped);

    let mut last: Option<ObjectId> = None;
    for resource in registry.iter() {
        for sample in &resource.samples {
            last = Some(store.insert_document(&resource.name, Value::Object(sample.clone()))?);
        }
        info!(
            "Seeded '{}' with {} documents",
            resource.name,
            resource.samples.len()
        );
    }

    Ok(match last {
        Some(id) => format!("db reset - test resource id = {}", id),
        None => "db reset - no test resources".to_string(),
    })
}

/// Exercise insert, page query, get, replace and delete against a scratch
/// collection.
///
/// Returns `"DB test passed"` or a message naming the first failing step.
/// Storage errors that are not part of the expected flow are propagated.
pub fn self_test(store: &dyn DocumentStore) -> Result<String> {
    let collection = StoreConfig::SELF_TEST_COLLECTION;

    let outcome = run_steps(store, collection);
    // Leave no scratch data behind, whatever happened.
    store.drop_collection(collection)?;

    match outcome {
        Ok(()) => {
            info!("Store self-test passed");
            Ok("DB test passed".to_string())
        }
        Err(RestbaseError::SelfTest { message }) => {
            warn!("Store self-test failed: {}", message);
            Ok(message)
        }
        Err(e) => Err(e),
    }
}

fn run_steps(store: &dyn DocumentStore, collection: &str) -> Result<()> {
    let id = store
        .insert_document(collection, json!({"name": "test", "value": 42}))
        .map_err(|e| failed(format!("upsert failed: {}", e)))?
        .to_hex();

    let page = store
        .query_collection(collection, 0)
        .map_err(|e| failed(format!("query collection failed: {}", e)))?;
    let first = page
        .first()
        .ok_or_else(|| failed("query collection failed: no results"))?;
    if first.get("value") != Some(&json!(42)) {
        return Err(failed(format!(
            "query collection failed: wrong data\n{}",
            first.to_json()
        )));
    }

    expect_value(store, collection, &id, 42, "query document")?;

    match store.upsert_document_by_id(collection, json!({"name": "test", "value": 43}), &id) {
        Ok(UpsertOutcome::Updated) => {}
        Ok(UpsertOutcome::Inserted(_)) => {
            return Err(failed("update failed: document was inserted instead of replaced"))
        }
        Err(e) => return Err(failed(format!("update failed: {}", e))),
    }
    expect_value(store, collection, &id, 43, "query document after update")?;

    store
        .delete_document_by_id(collection, &id)
        .map_err(|e| failed(format!("delete failed: {}", e)))?;
    match store.query_document_by_id(collection, &id) {
        Err(RestbaseError::DocumentNotFound { .. }) => Ok(()),
        Ok(doc) => Err(failed(format!(
            "query document after delete failed: {}",
            doc.to_json()
        ))),
        Err(e) => Err(failed(format!("query document after delete failed: {}", e))),
    }
}

fn expect_value(
    store: &dyn DocumentStore,
    collection: &str,
    id: &str,
    expected: i64,
    step: &str,
) -> Result<()> {
    let doc = store
        .query_document_by_id(collection, id)
        .map_err(|e| failed(format!("{} failed: {}", step, e)))?;
    if doc.get("value") != Some(&json!(expected)) {
        return Err(failed(format!("{} failed: wrong data\n{}", step, doc.to_json())));
    }
    Ok(())
}

fn failed(message: impl Into<String>) -> RestbaseError {
    RestbaseError::SelfTest {
        message: message.into(),
    }
}
