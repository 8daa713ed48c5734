//! HTTP API for the homework calendar.
//!
//! Handlers are thin: they parse query parameters, call into
//! `homework_core` and turn the result into JSON or an ICS download.

pub mod routes;
pub mod state;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the application router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::calendar::router())
        .merge(routes::homeworks::router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}
