//! Passthrough proxy for browser builds.
//!
//! Browsers cannot POST to a local model server on another origin, so this
//! little forwarder sits on a fixed port the web build knows about and
//! relays `/api/chat` to the real backend verbatim. It holds no state and
//! applies no policy; a permissive CORS layer is its whole reason to exist.

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::utils::url::endpoint_url;

#[derive(Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    upstream: String,
}

impl ProxyState {
    pub fn new(client: reqwest::Client, upstream: impl Into<String>) -> Self {
        Self {
            client,
            upstream: upstream.into(),
        }
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/api/chat", post(forward_chat))
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve until the token is cancelled.
pub async fn run(
    addr: SocketAddr,
    upstream: String,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = ProxyState::new(reqwest::Client::new(), upstream.clone());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Proxy listening on http://{} (upstream {})", listener.local_addr()?, upstream);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}

/// Forward the request body untouched and relay the upstream JSON. Any
/// failure on the way, unreachable upstream included, collapses into a 500
/// with an `error`/`details` body, which is what the web client expects.
async fn forward_chat(
    State(state): State<ProxyState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let url = endpoint_url(&state.upstream, "api/chat");
    info!(%url, "forwarding chat request");

    match relay(&state.client, &url, &body).await {
        Ok(payload) => (StatusCode::OK, Json(payload)),
        Err(err) => {
            error!(error = %err, "upstream chat call failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Failed to reach the upstream chat endpoint.",
                    "details": err.to_string(),
                })),
            )
        }
    }
}

async fn relay(client: &reqwest::Client, url: &str, body: &Value) -> Result<Value, reqwest::Error> {
    let response = client.post(url).json(body).send().await?.error_for_status()?;
    response.json().await
}

async fn health(State(state): State<ProxyState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "endpoint": state.upstream,
    }))
}
