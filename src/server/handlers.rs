//! Route handlers of the record service

use crate::domain::{collection, ApiResponse, RecordKind};
use crate::error::CbciError;
use crate::server::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

fn reply(status: StatusCode, body: ApiResponse<Value>) -> Response {
    (status, Json(body)).into_response()
}

fn ok(data: Value) -> Response {
    reply(StatusCode::OK, ApiResponse::ok(data))
}

/// Map a failure to its status and the message clients see
pub(crate) fn failure(err: CbciError) -> Response {
    let (status, message) = match err {
        CbciError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
        CbciError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        CbciError::Auth(msg) => (StatusCode::BAD_REQUEST, msg),
        other => {
            error!(error = %other, "request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    };
    reply(status, ApiResponse::fail(message))
}

fn body_or_fail(body: Result<Json<Value>, JsonRejection>) -> Result<Value, CbciError> {
    body.map(|Json(v)| v)
        .map_err(|e| CbciError::Validation(format!("invalid request body: {}", e.body_text())))
}

pub(crate) async fn list_records(state: AppState, kind: RecordKind) -> Response {
    match state.kv.get_list(kind.remote_key()).await {
        Ok(items) => ok(Value::Array(items)),
        Err(e) => failure(e),
    }
}

pub(crate) async fn create_record(
    state: AppState,
    kind: RecordKind,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let document = match body_or_fail(body) {
        Ok(document) => document,
        Err(e) => return failure(e),
    };
    if let Err(e) = kind.check_document(&document) {
        return failure(e);
    }

    let _guard = state.write_lock.lock().await;
    let result = async {
        let mut items = state.kv.get_list(kind.remote_key()).await?;
        collection::check_new_id(&items, &document)?;
        collection::insert_newest_first(&mut items, document.clone());
        state.kv.set_list(kind.remote_key(), items).await
    }
    .await;

    match result {
        Ok(()) => ok(document),
        Err(e) => failure(e),
    }
}

pub(crate) async fn update_record(
    state: AppState,
    kind: RecordKind,
    id: String,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let patch = match body_or_fail(body) {
        Ok(Value::Object(patch)) => patch,
        Ok(_) => {
            return failure(CbciError::Validation(
                "update must be a JSON object".to_string(),
            ))
        }
        Err(e) => return failure(e),
    };

    let _guard = state.write_lock.lock().await;
    let result = async {
        let mut items = state.kv.get_list(kind.remote_key()).await?;
        let merged = collection::preview_merge(&items, &id, &patch)
            .ok_or_else(|| CbciError::NotFound(kind.not_found_message()))?;
        kind.check_document(&merged)?;
        collection::replace_by_id(&mut items, merged.clone());
        state.kv.set_list(kind.remote_key(), items).await?;
        Ok::<_, CbciError>(merged)
    }
    .await;

    match result {
        Ok(merged) => ok(merged),
        Err(e) => failure(e),
    }
}

pub(crate) async fn delete_record(state: AppState, kind: RecordKind, id: String) -> Response {
    let _guard = state.write_lock.lock().await;
    let result = async {
        let mut items = state.kv.get_list(kind.remote_key()).await?;
        if collection::remove_by_id(&mut items, &id) > 0 {
            state.kv.set_list(kind.remote_key(), items).await?;
        }
        Ok::<_, CbciError>(())
    }
    .await;

    match result {
        Ok(()) => reply(StatusCode::OK, ApiResponse::ok_empty()),
        Err(e) => failure(e),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignupRequest {
    email: String,
    password: String,
    #[serde(default)]
    name: String,
}

pub(crate) async fn signup(
    state: AppState,
    body: Result<Json<SignupRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(e) => {
            return failure(CbciError::Validation(format!(
                "invalid request body: {}",
                e.body_text()
            )))
        }
    };
    let Some(auth) = state.auth.as_ref() else {
        return failure(CbciError::Config("auth provider is not configured".to_string()));
    };

    match auth
        .create_user(&request.email, &request.password, &request.name)
        .await
    {
        Ok(user) => {
            info!(email = %request.email, "user signed up");
            ok(json!({ "user": user }))
        }
        Err(e) => failure(e),
    }
}

pub(crate) async fn healthz() -> Response {
    reply(StatusCode::OK, ApiResponse::ok_empty())
}
