//! Axum router construction.
//!
//! [`build`] assembles the complete application router: middleware layers
//! (CORS, per-request trace-ID injection), the health route, the read API
//! under `/api` and the OpenAPI document at `/api-docs/openapi.json`.

mod builds;
pub mod doc;
mod health;
mod latest;

use std::sync::Arc;

use axum::routing::get;
use axum::{Router, middleware};
use tower::ServiceBuilder;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .merge(builds::router())
        .merge(latest::router());

    Router::new()
        .merge(health::router())
        .nest("/api", api_router)
        .route("/api-docs/openapi.json", get(doc::openapi_json))
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&state.config)))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}
