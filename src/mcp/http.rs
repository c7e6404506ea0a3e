//! Stateless HTTP transport.
//!
//! One endpoint, `POST /mcp`, carrying a single JSON-RPC message per
//! request. No sessions are kept between requests; every MCP client call
//! is self-contained.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::server::McpServer;

pub fn build_app(server: McpServer) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Serve the MCP endpoint until the shutdown future resolves.
pub async fn serve(
    server: McpServer,
    addr: &str,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %addr, "MCP HTTP transport listening");
    axum::serve(listener, build_app(server))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn handle_mcp(State(server): State<McpServer>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        // Notification: nothing to say back.
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
