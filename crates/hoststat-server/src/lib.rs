//! HTTP front end for hoststat.
//!
//! `GET /stats` runs one snapshot cycle and returns the retained window as
//! parallel JSON arrays. `GET /` serves a small dashboard that polls it.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};
use serde::Serialize;

use hoststat_core::SnapshotService;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    samples: usize,
    capacity: usize,
    backend: &'static str,
}

fn internal_error(context: &str, err: impl std::fmt::Display) -> Response {
    log::error!("{context}: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("{context}: {err}"),
    )
        .into_response()
}

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_stats(State(service): State<Arc<SnapshotService>>) -> Response {
    // The CPU read sleeps for its window; keep it off the async workers.
    match tokio::task::spawn_blocking(move || service.handle_request()).await {
        Ok(Ok(snapshot)) => Json(snapshot).into_response(),
        Ok(Err(e)) => internal_error("history store unavailable", e),
        Err(e) => internal_error("collection task failed", e),
    }
}

async fn handle_health(State(service): State<Arc<SnapshotService>>) -> Response {
    match tokio::task::spawn_blocking(move || service.status()).await {
        Ok(Ok(status)) => Json(HealthResponse {
            status: "ok",
            samples: status.samples,
            capacity: status.capacity,
            backend: status.backend,
        })
        .into_response(),
        Ok(Err(e)) => internal_error("history store unavailable", e),
        Err(e) => internal_error("status task failed", e),
    }
}

/// Build the axum router.
pub fn build_router(service: Arc<SnapshotService>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/stats", get(handle_stats))
        .route("/health", get(handle_health))
        .with_state(service)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}

/// Bind `host:port` and serve until Ctrl-C.
pub async fn run_server(service: SnapshotService, host: &str, port: u16) -> std::io::Result<()> {
    let app = build_router(Arc::new(service));
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}
