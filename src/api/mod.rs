// HTTP surface: engine paths plus the lease-config admin endpoint

pub mod admin;
pub mod engine;
mod error;

pub use admin::{create_admin_router, AdminAppState, LeaseConfigUpdate};
pub use engine::{create_engine_router, EngineAppState, LeaseRequest};
pub use error::ApiError;

use axum::Router;
use tower_http::trace::TraceLayer;

/// Full application router with request tracing.
pub fn create_app(engine: EngineAppState, admin: AdminAppState) -> Router {
    Router::new()
        .merge(create_engine_router(engine))
        .merge(create_admin_router(admin))
        .layer(TraceLayer::new_for_http())
}
