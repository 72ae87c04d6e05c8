//! HTTP API for the registration service.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, rate_limit_middleware, RateLimitState};
pub use types::*;

use crate::registration::RegistrationCoordinator;
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: RegistrationCoordinator,
}

impl AppState {
    pub fn new(coordinator: RegistrationCoordinator) -> Self {
        Self { coordinator }
    }
}

/// Create the API router with custom rate limiting.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    let registrations = Router::new()
        .route("/v1/registrations", post(handlers::initiate_registration))
        .route("/v1/registrations/:id", get(handlers::get_status))
        .route(
            "/v1/registrations/:id/complete",
            post(handlers::complete_registration),
        )
        .layer(axum_middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        // Health check (no rate limiting)
        .route("/health", get(handlers::health))
        .merge(registrations)
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
