//! Route definitions

use axum::{Router, routing::get};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{error::handle_panic, handlers, state::AppState};

/// Create the main router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/api/hello", get(handlers::hello))
        .with_state(state)
        // Innermost first: panics are turned into responses before tracing sees them.
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}
