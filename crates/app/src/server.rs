//! Health, readiness and metrics endpoints.
//!
//! - `GET /healthz` - liveness, always `200 ok`
//! - `GET /readyz` - `503` while the API circuit breaker is open
//! - `GET /metrics` - Prometheus text format

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::context::AppContext;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Routes for health, readiness and metrics.
pub fn router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(ctx)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(ctx): State<Arc<AppContext>>) -> Response {
    if ctx.is_ready() {
        (StatusCode::OK, "ok").into_response()
    } else {
        let state = ctx.breaker_state();
        warn!(breaker = %ctx.client.breaker().name(), %state, "readiness probe failed");
        (StatusCode::SERVICE_UNAVAILABLE, format!("circuit breaker {state}")).into_response()
    }
}

async fn metrics(State(ctx): State<Arc<AppContext>>) -> Response {
    match ctx.render_metrics() {
        Ok(body) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render metrics").into_response()
        }
    }
}

/// Serve until Ctrl-C, then drain in-flight requests.
pub async fn serve(ctx: Arc<AppContext>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "health server starting");

    axum::serve(listener, router(ctx)).with_graceful_shutdown(shutdown_signal()).await?;

    info!("health server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
