//! Authentication guard for `/account/:id` routes
//!
//! Stateless per request: the bearer token must validate against the shared
//! secret and carry the account number of the account named in the path.

use axum::extract::{Path, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use ledger_core::Error;
use tracing::debug;

use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::state::AppState;

/// Header carrying the account token
pub const TOKEN_HEADER: &str = "jwt-token";

/// Token from `jwt-token`, falling back to `Authorization: Bearer`
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok()) {
        return Some(token.trim());
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
}

pub async fn require_account_token(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    request: Request,
    next: Next,
) -> Response {
    debug!(path = %request.uri().path(), "checking account token");

    let Some(token) = bearer_token(request.headers()) else {
        return ApiError::from(Error::unauthorized("missing token")).into_response();
    };

    let claims = match state.accounts.tokens().validate(token) {
        Ok(claims) => claims,
        Err(err) => return ApiError::from(err).into_response(),
    };

    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(err) => return err.into_response(),
    };

    match state
        .blocking(move |accounts| accounts.authorize_claims(&claims, id))
        .await
    {
        Ok(_) => next.run(request).await,
        // Lookup failures of any kind are reported as 401
        Err(err) => ApiError::from(Error::unauthorized(err.to_string())).into_response(),
    }
}
