//! Request handlers
//!
//! Bodies are taken as raw bytes and decoded with `decode_json` so that
//! malformed input gets the same `{"error": ...}` envelope as every other
//! failure.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use ledger_core::domain::{decode_json, CreateAccountRequest, LoginRequest, TransferRequest};
use ledger_core::Error;
use serde_json::json;
use tracing::info;

use crate::deadline::RequestDeadline;
use crate::error::ApiError;
use crate::guard::TOKEN_HEADER;
use crate::state::AppState;

/// Parse an account id path segment
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::from(Error::decode(format!("invalid id '{}'", raw))))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_accounts(State(state): State<AppState>) -> Result<Response, ApiError> {
    let accounts = state.blocking(|accounts| accounts.get_accounts()).await?;
    Ok(Json(accounts).into_response())
}

/// POST /account - the first token goes back in the `jwt-token` header
pub async fn create_account(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: CreateAccountRequest = decode_json(&body)?;
    let created = state
        .blocking(move |accounts| accounts.create_account(&request))
        .await?;

    Ok((
        StatusCode::CREATED,
        [(TOKEN_HEADER, created.token)],
        Json(created.account),
    )
        .into_response())
}

pub async fn get_account(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    let account = state.blocking(move |accounts| accounts.get_account(id)).await?;
    Ok(Json(account).into_response())
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&raw_id)?;
    state.blocking(move |accounts| accounts.delete_account(id)).await?;
    Ok(Json(json!({ "deleted": id })).into_response())
}

/// PUT /account, PUT|POST /transfer - decodes and echoes the request
///
/// Balances are not touched here; see [`transfer_from_account`].
pub async fn echo_transfer(body: Bytes) -> Result<Response, ApiError> {
    let request: TransferRequest = decode_json(&body)?;
    info!(to = request.to, amount = request.amount, "transfer request received");
    Ok(Json(request).into_response())
}

/// POST /account/:id/transfer - atomic move from the path account
///
/// The request deadline travels with the storage call, so a transfer the
/// client has already seen time out is rolled back instead of committed.
pub async fn transfer_from_account(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    deadline: Option<Extension<RequestDeadline>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let from = parse_id(&raw_id)?;
    let request: TransferRequest = decode_json(&body)?;
    let deadline = deadline.map(|Extension(RequestDeadline(at))| at);
    let receipt = state
        .blocking(move |accounts| {
            accounts.transfer(from, request.to, request.amount, deadline)
        })
        .await?;
    Ok(Json(receipt).into_response())
}

pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: LoginRequest = decode_json(&body)?;
    let result = state.blocking(move |accounts| accounts.login(&request)).await?;
    Ok(Json(result).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id("abc").unwrap_err().status(), StatusCode::BAD_REQUEST);
        assert!(parse_id("").is_err());
    }
}
