use std::time::Duration;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::deadline::stamp_deadline;
use crate::guard::require_account_token;
use crate::handlers;
use crate::state::AppState;

/// Build the application router
///
/// `/account/:id` routes sit behind the token guard. The guard is attached
/// per method router, so an unsupported method is answered with 405 before
/// any token is looked at. Every route gets request tracing and the given
/// timeout, and handlers see the matching [`RequestDeadline`](crate::deadline::RequestDeadline).
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let guard = middleware::from_fn_with_state(state.clone(), require_account_token);

    Router::new()
        .route(
            "/account",
            get(handlers::list_accounts)
                .post(handlers::create_account)
                .put(handlers::echo_transfer),
        )
        .route(
            "/account/:id",
            get(handlers::get_account)
                .delete(handlers::delete_account)
                .route_layer(guard.clone()),
        )
        .route(
            "/account/:id/transfer",
            post(handlers::transfer_from_account).route_layer(guard),
        )
        .route(
            "/transfer",
            put(handlers::echo_transfer).post(handlers::echo_transfer),
        )
        .route("/login", post(handlers::login))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn_with_state(request_timeout, stamp_deadline))
        .with_state(state)
}
