//! Request logging, CORS and bearer-token checks

use crate::server::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{HeaderValue, AUTHORIZATION};
use axum::http::{Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::time::Instant;
use tracing::{info, warn};

pub(crate) async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        latency_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    response
}

fn allow_cors(response: &mut Response) {
    let headers = response.headers_mut();
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    headers.insert(
        "access-control-allow-methods",
        HeaderValue::from_static("GET,POST,PUT,DELETE,OPTIONS"),
    );
    headers.insert(
        "access-control-allow-headers",
        HeaderValue::from_static("authorization,content-type,apikey,x-client-info"),
    );
}

/// Any origin may call the service; preflights are answered here
pub(crate) async fn cors(request: Request<Body>, next: Next) -> Response {
    let mut response = if request.method() == Method::OPTIONS {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };
    allow_cors(&mut response);
    response
}

fn bearer_matches(request: &Request<Body>, token: &str) -> bool {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|presented| presented.trim() == token)
}

/// When the service holds a token, every route but `/healthz` requires it
pub(crate) async fn require_token(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = state.token.as_deref() {
        if request.uri().path() != "/healthz" && !bearer_matches(&request, token) {
            warn!(path = %request.uri().path(), "rejected request without valid bearer token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"success": false, "error": "Unauthorized"})),
            )
                .into_response();
        }
    }
    next.run(request).await
}
