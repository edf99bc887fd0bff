//! HTTP request handlers.

mod resources;

pub use resources::{create_document, delete_document, get_document, list_documents, put_document};

use crate::server::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use restbase_core::{DocumentStore, RestbaseError, ServerConfig};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

// ============================================================================
// Error responses
// ============================================================================

/// Library error rendered as a plain-text HTTP response.
#[derive(Debug)]
pub struct ApiError(pub RestbaseError);

impl From<RestbaseError> for ApiError {
    fn from(err: RestbaseError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.0.is_client_error() {
            warn!("Request rejected: {}", self.0);
        } else {
            error!("Request failed: {}", self.0);
        }

        (status, self.0.to_string()).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Run a store operation on the blocking pool.
///
/// rusqlite is synchronous, so store calls stay off the async workers.
pub(crate) async fn with_store<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn DocumentStore) -> restbase_core::Result<T> + Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|e| ApiError(RestbaseError::Other(format!("store task failed: {}", e))))?
        .map_err(ApiError)
}

// ============================================================================
// Built-in routes
// ============================================================================

/// Landing page.
pub async fn landing_page() -> &'static str {
    ServerConfig::LANDING_MESSAGE
}

/// Echo the JSON request body back to the caller.
pub async fn echo(Json(data): Json<Value>) -> Json<Value> {
    Json(data)
}

/// Run the store self-test.
pub async fn test_db(State(state): State<Arc<AppState>>) -> ApiResult<String> {
    with_store(&state, restbase_core::self_test).await
}

/// Wipe every collection and reseed from the manifest.
pub async fn reset_db(State(state): State<Arc<AppState>>) -> ApiResult<String> {
    warn!("resetting DB");
    let registry = Arc::clone(&state.registry);
    with_store(&state, move |store| restbase_core::reset(store, &registry)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::build_router;
    use axum::body::Body;
    use axum::http::Request;
    use restbase_core::{ResourceRegistry, SqliteDocumentStore};
    use tower::ServiceExt;

    fn app() -> axum::Router {
        let store = Arc::new(SqliteDocumentStore::in_memory().unwrap());
        let registry =
            ResourceRegistry::from_json_str(r#"{"entities": [{"name": "seed"}]}"#).unwrap();
        build_router(Arc::new(AppState::new(store, registry)))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_landing_page() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "Server is up and running!");
    }

    #[tokio::test]
    async fn test_echo_round_trips_body() {
        let request = Request::put("/echo")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"a":[1,2],"b":null}"#))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"a":[1,2],"b":null}"#);
    }

    #[tokio::test]
    async fn test_echo_rejects_malformed_json() {
        let request = Request::put("/echo")
            .header("content-type", "application/json")
            .body(Body::from("{oops"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_db_route() {
        let response = app()
            .oneshot(Request::get("/testDB").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "DB test passed");
    }

    #[tokio::test]
    async fn test_reset_route() {
        let response = app()
            .oneshot(Request::get("/resetDB").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response)
            .await
            .starts_with("db reset - test resource id = "));
    }

    #[test]
    fn test_api_error_status() {
        let response = ApiError(RestbaseError::InvalidObjectId { id: "x".into() }).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = ApiError(RestbaseError::Other("boom".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let err = RestbaseError::DocumentNotFound {
            collection: "entities".into(),
            id: "64b7f0c2a1b2c3d4e5f60718".into(),
        };
        assert!(err.is_client_error());
        let response = ApiError(err).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
