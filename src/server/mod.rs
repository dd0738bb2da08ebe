//! The record service: the HTTP side of the remote backend
//!
//! Every kind gets the same four routes (`GET`/`POST /<kind>`,
//! `PUT`/`DELETE /<kind>/:id`), backed by one KV entry per kind.

mod handlers;
pub mod kv;
mod middleware;

use crate::domain::RecordKind;
use crate::infrastructure::AuthProvider;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::info;

pub use kv::KvTable;

type JsonBody<T> = Result<Json<T>, JsonRejection>;

#[derive(Clone)]
pub struct AppState {
    pub(crate) kv: Arc<KvTable>,
    /// Serializes read-modify-write cycles on the KV table
    pub(crate) write_lock: Arc<Mutex<()>>,
    pub(crate) auth: Option<Arc<dyn AuthProvider>>,
    pub(crate) token: Option<String>,
}

impl AppState {
    pub fn new(kv: KvTable) -> Self {
        AppState {
            kv: Arc::new(kv),
            write_lock: Arc::new(Mutex::new(())),
            auth: None,
            token: None,
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Require `Authorization: Bearer <token>` on every record route
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

fn kind_routes(router: Router<AppState>, kind: RecordKind) -> Router<AppState> {
    router
        .route(
            &format!("/{}", kind.route()),
            get(move |State(state): State<AppState>| handlers::list_records(state, kind)).post(
                move |State(state): State<AppState>, body: JsonBody<Value>| {
                    handlers::create_record(state, kind, body)
                },
            ),
        )
        .route(
            &format!("/{}/:id", kind.route()),
            put(
                move |State(state): State<AppState>, Path(id): Path<String>, body: JsonBody<Value>| {
                    handlers::update_record(state, kind, id, body)
                },
            )
            .delete(
                move |State(state): State<AppState>, Path(id): Path<String>| {
                    handlers::delete_record(state, kind, id)
                },
            ),
        )
}

pub fn build_router(state: AppState) -> Router {
    let router = RecordKind::all()
        .into_iter()
        .fold(Router::new(), kind_routes)
        .route("/healthz", get(handlers::healthz))
        .route(
            "/signup",
            post(|State(state): State<AppState>, body: JsonBody<handlers::SignupRequest>| {
                handlers::signup(state, body)
            }),
        );

    router
        .layer(from_fn_with_state(state.clone(), middleware::require_token))
        .layer(from_fn(middleware::cors))
        .layer(from_fn(middleware::log_requests))
        .with_state(state)
}

/// Serve on an already-bound listener until the task is dropped
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), kv = %state.kv.describe(), "record service listening");
    axum::serve(listener, build_router(state)).await
}

/// Serve until Ctrl-C
pub async fn serve_until_shutdown(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    info!(addr = ?listener.local_addr().ok(), kv = %state.kv.describe(), "record service listening");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await
}
