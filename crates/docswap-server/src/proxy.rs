//! HTTP surface: reverse proxy plus the build-status diagnostic.
//!
//! Every request snapshots the router state under its lock and then
//! forwards outside the lock, so slow backends never serialize the request
//! path. Before any backend has reached readiness, requests get a 500 with
//! a plain-text explanation; a backend that is unreachable mid-flight
//! yields a 502 to that client only and triggers nothing.

use anyhow::{Context, Result};
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use docswap_core::RouterHandle;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Largest request body the proxy will buffer before forwarding.
const MAX_FORWARD_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    router: RouterHandle,
    client: reqwest::Client,
}

impl AppState {
    /// Creates handler state over the given router handle.
    pub fn new(router: RouterHandle) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("building forwarding client")?;
        Ok(Self { router, client })
    }
}

/// Builds the axum application: status route plus catch-all proxying.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/_buildstatus", get(buildstatus))
        .fallback(proxy)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `listen` and serves the application until the process exits.
pub async fn run_server(listen: &str, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("binding {listen}"))?;
    info!(listen, "proxy listening");
    axum::serve(listener, create_router(state))
        .await
        .context("serving HTTP")?;
    Ok(())
}

async fn buildstatus(State(state): State<AppState>) -> String {
    state.router.status_text()
}

async fn proxy(State(state): State<AppState>, req: Request) -> Response {
    let Some(active) = state.router.active() else {
        let body = state
            .router
            .last_error()
            .unwrap_or_else(|| "docs are generating".to_string());
        return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
    };

    match forward(&state, &active.endpoint, req).await {
        Ok(response) => response,
        Err(e) => {
            warn!(endpoint = %active.endpoint, error = %e, "forwarding failed");
            (
                StatusCode::BAD_GATEWAY,
                format!("backend unreachable: {e}"),
            )
                .into_response()
        },
    }
}

async fn forward(state: &AppState, endpoint: &str, req: Request) -> Result<Response> {
    let (parts, body) = req.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map_or("/", |pq| pq.as_str());
    let url = format!("http://{endpoint}{path_and_query}");

    let body = to_bytes(body, MAX_FORWARD_BODY_BYTES)
        .await
        .context("buffering request body")?;
    let mut headers = parts.headers;
    headers.remove(header::HOST);

    let backend = state
        .client
        .request(parts.method, url)
        .headers(headers)
        .body(body)
        .send()
        .await
        .context("request to backend")?;

    let mut builder = Response::builder().status(backend.status());
    if let Some(response_headers) = builder.headers_mut() {
        for (name, value) in backend.headers() {
            // hyper re-frames the streamed body itself
            if name == header::TRANSFER_ENCODING || name == header::CONNECTION {
                continue;
            }
            response_headers.insert(name.clone(), value.clone());
        }
    }
    builder
        .body(Body::from_stream(backend.bytes_stream()))
        .context("assembling response")
}
