//! HTTP server implementation using Axum.

use crate::handlers::{
    create_document, delete_document, echo, get_document, landing_page, list_documents,
    put_document, reset_db, test_db,
};
use axum::{
    routing::{get, put},
    Router,
};
use restbase_core::{DocumentStore, ResourceRegistry};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Application state shared across handlers.
pub struct AppState {
    /// Backing document store
    pub store: Arc<dyn DocumentStore>,
    /// Resources declared in the manifest
    pub registry: Arc<ResourceRegistry>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, registry: ResourceRegistry) -> Self {
        Self {
            store,
            registry: Arc::new(registry),
        }
    }
}

/// Build the router with every route, CORS and request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Any origin may call the API
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(landing_page))
        .route("/echo", put(echo))
        .route("/testDB", get(test_db))
        .route("/resetDB", get(reset_db))
        .route("/:resource", get(list_documents).put(create_document))
        .route(
            "/:resource/:id",
            get(get_document).put(put_document).delete(delete_document),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind the listener for `host:port`.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<TcpListener> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Start the HTTP server in the background.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(
    state: Arc<AppState>,
    host: &str,
    port: u16,
) -> anyhow::Result<SocketAddr> {
    let listener = bind(host, port).await?;
    let actual_addr = listener.local_addr()?;
    let app = build_router(state);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve_until<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use restbase_core::SqliteDocumentStore;

    fn test_state() -> Arc<AppState> {
        let store = Arc::new(SqliteDocumentStore::in_memory().unwrap());
        let registry = ResourceRegistry::from_json_str(r#"{"entities": []}"#).unwrap();
        Arc::new(AppState::new(store, registry))
    }

    #[tokio::test]
    async fn test_server_starts() {
        let addr = start_server(test_state(), "127.0.0.1", 0).await.unwrap();
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_bind_rejects_bad_host() {
        assert!(bind("not a host", 0).await.is_err());
    }

    #[tokio::test]
    async fn test_serve_until_stops_on_signal() {
        let listener = bind("127.0.0.1", 0).await.unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(serve_until(listener, test_state(), async move {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
