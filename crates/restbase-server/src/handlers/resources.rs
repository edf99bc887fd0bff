//! CRUD handlers for manifest-declared resources.
//!
//! `/{resource}` lists and creates, `/{resource}/{id}` reads, replaces and
//! deletes. Only resources declared in the manifest are routed to the store.

use super::{with_store, ApiError, ApiResult};
use crate::server::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use restbase_core::{RestbaseError, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// First value of the `page` query parameter; later repeats are ignored.
fn first_page_param(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, _)| key == "page")
        .map(|(_, value)| value.as_str())
}

/// Parse the `page` query parameter.
///
/// Missing or non-integer values fall back to page 0. Negative pages are
/// rejected. Pages too large for `u64` saturate, which yields an empty page.
fn parse_page(raw: Option<&str>) -> Result<u64> {
    let Some(raw) = raw.map(str::trim) else {
        return Ok(0);
    };
    let is_integer = |digits: &str| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());

    if let Some(digits) = raw.strip_prefix('-') {
        if !is_integer(digits) {
            return Ok(0);
        }
        if digits.bytes().all(|b| b == b'0') {
            return Ok(0);
        }
        return Err(RestbaseError::Validation {
            field: "page".into(),
            message: format!("page must be zero or greater, got {}", raw),
        });
    }

    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if !is_integer(digits) {
        return Ok(0);
    }
    Ok(digits.parse::<u64>().unwrap_or(u64::MAX))
}

fn require_resource(state: &AppState, resource: &str) -> ApiResult<()> {
    state.registry.require(resource).map(|_| ()).map_err(ApiError)
}

/// `GET /{resource}?page=N`
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<Value>>> {
    require_resource(&state, &resource)?;
    let page = parse_page(first_page_param(&params))?;
    debug!("Listing '{}' page {}", resource, page);

    let docs = with_store(&state, move |store| store.query_collection(&resource, page)).await?;
    Ok(Json(docs.iter().map(|d| d.to_json()).collect()))
}

/// `PUT /{resource}`
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Path(resource): Path<String>,
    Json(data): Json<Value>,
) -> ApiResult<String> {
    require_resource(&state, &resource)?;

    let id = with_store(&state, move |store| store.insert_document(&resource, data)).await?;
    Ok(id.to_string())
}

/// `GET /{resource}/{id}`
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    require_resource(&state, &resource)?;

    let doc = with_store(&state, move |store| store.query_document_by_id(&resource, &id)).await?;
    Ok(Json(doc.to_json()))
}

/// `PUT /{resource}/{id}`
pub async fn put_document(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
    Json(data): Json<Value>,
) -> ApiResult<String> {
    require_resource(&state, &resource)?;

    let outcome = with_store(&state, move |store| {
        store.upsert_document_by_id(&resource, data, &id)
    })
    .await?;
    Ok(outcome.message())
}

/// `DELETE /{resource}/{id}`
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((resource, id)): Path<(String, String)>,
) -> ApiResult<String> {
    require_resource(&state, &resource)?;

    let message = format!("deleted document with id {}", id);
    with_store(&state, move |store| store.delete_document_by_id(&resource, &id)).await?;
    Ok(message)
}
