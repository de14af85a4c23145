use crate::api::error::ApiError;
use crate::auth::authorize;
use crate::config::{LeaseConfig, SharedLeaseConfig};
use axum::{
    extract::State,
    http::HeaderMap,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::sync::{Arc, PoisonError};
use tracing::info;

/// State for the admin API.
#[derive(Clone)]
pub struct AdminAppState {
    pub lease_config: SharedLeaseConfig,
    /// Required bearer token. None = unrestricted (dev mode).
    pub root_token: Option<String>,
}

/// Partial update body. Only fields present in the request are changed.
#[derive(Deserialize)]
pub struct LeaseConfigUpdate {
    pub default_ttl_seconds: Option<u64>,
    pub max_ttl_seconds: Option<u64>,
}

pub fn create_admin_router(state: AdminAppState) -> Router {
    Router::new()
        .route(
            "/v1/sys/lease-config",
            get(get_lease_config).put(put_lease_config),
        )
        .with_state(Arc::new(state))
}

/// GET /v1/sys/lease-config
async fn get_lease_config(
    State(state): State<Arc<AdminAppState>>,
    headers: HeaderMap,
) -> Result<Json<LeaseConfig>, ApiError> {
    authorize(&headers, state.root_token.as_deref())?;

    let cfg = state
        .lease_config
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    Ok(Json(cfg))
}

/// PUT /v1/sys/lease-config - applies to the next renew.
async fn put_lease_config(
    State(state): State<Arc<AdminAppState>>,
    headers: HeaderMap,
    Json(update): Json<LeaseConfigUpdate>,
) -> Result<Json<LeaseConfig>, ApiError> {
    authorize(&headers, state.root_token.as_deref())?;

    let mut cfg = state
        .lease_config
        .write()
        .unwrap_or_else(PoisonError::into_inner);

    if let Some(v) = update.default_ttl_seconds {
        cfg.default_ttl_seconds = v;
    }
    if let Some(v) = update.max_ttl_seconds {
        cfg.max_ttl_seconds = v;
    }

    info!(
        default_ttl_seconds = cfg.default_ttl_seconds,
        max_ttl_seconds = cfg.max_ttl_seconds,
        "Lease config updated"
    );
    Ok(Json(cfg.clone()))
}
