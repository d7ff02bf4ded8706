//! Per-request deadline handed down to storage calls

use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

/// Instant after which the router has already answered 408
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestDeadline(pub Instant);

/// Stamp the request with its deadline; installed outside `TimeoutLayer`
pub async fn stamp_deadline(
    State(timeout): State<Duration>,
    mut request: Request,
    next: Next,
) -> Response {
    request
        .extensions_mut()
        .insert(RequestDeadline(Instant::now() + timeout));
    next.run(request).await
}
