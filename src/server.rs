use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, error, info, warn};

use crate::pipeline::IngestPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
}

pub fn create_router(state: AppState, allowed_origin: Option<&str>) -> Router {
    let cors = match allowed_origin {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(origin) => CorsLayer::new().allow_origin(origin),
            Err(_) => {
                warn!("⚠️  ALLOWED_ORIGIN {:?} is not a valid header value, allowing any origin", origin);
                CorsLayer::new().allow_origin(Any)
            }
        },
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods([Method::GET, Method::POST])
    .allow_headers(Any);

    Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/alerts.json", get(alerts_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: AppState,
    allowed_origin: Option<&str>,
) -> anyhow::Result<()> {
    let app = create_router(state, allowed_origin);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub async fn bind(port: u16) -> anyhow::Result<tokio::net::TcpListener> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🚀 Whale alert server running on port {}", port);
    Ok(listener)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

async fn health_handler() -> &'static str {
    "OK"
}

/// Always `200 OK` once the body parses. The batch runs on its own task so a
/// caller that hangs up mid-request does not cut processing short.
async fn webhook_handler(State(state): State<AppState>, body: Bytes) -> (StatusCode, &'static str) {
    let pipeline = state.pipeline.clone();
    let work = tokio::spawn(async move { pipeline.handle_body(&body).await });

    match work.await {
        Ok(Ok(ack)) => {
            debug!(
                "Webhook processed: {} transfers, {} alerts saved, {} notified, {} failed",
                ack.transfers, ack.alerts_saved, ack.notifications_sent, ack.failures
            );
            (StatusCode::OK, "OK")
        }
        Ok(Err(e)) => {
            error!("Webhook error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error")
        }
        Err(e) => {
            error!("Webhook task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error")
        }
    }
}

async fn alerts_handler(State(state): State<AppState>) -> Response {
    match state.pipeline.store().load().await {
        Ok(alerts) => Json(alerts).into_response(),
        Err(e) => {
            error!("Failed to read alert history: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Error").into_response()
        }
    }
}
