//! Route table for the power API.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::ApiState;

/// Build the router with all endpoints and middleware.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/on", post(handlers::power_on))
        .route("/off", post(handlers::power_off))
        .route("/status", post(handlers::power_status))
        .route("/healthz", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
