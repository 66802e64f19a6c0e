//! Route table.

use axum::{Router, routing::post};
use rand::Rng;
use serialkit_core::{Clock, Store};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router over the given state.
///
/// All four endpoints are POST; request tracing is attached at the
/// router level so every call logs method, path, and latency.
pub fn build_router<S, C, R>(state: AppState<S, C, R>) -> Router
where
    S: Store,
    C: Clock + Clone + 'static,
    R: Rng + Send + Sync + 'static,
{
    Router::new()
        .route("/api/serials_insert", post(handlers::serials_insert))
        .route(
            "/api/serials_additional_insert",
            post(handlers::serials_additional_insert),
        )
        .route("/api/serials_redeem", post(handlers::serials_redeem))
        .route("/api/serials_cancel", post(handlers::serials_cancel))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
