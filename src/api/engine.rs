use crate::api::error::{not_found, ApiError};
use crate::auth::authorize;
use crate::backend::{Backend, ConfigUpdate};
use crate::lease::{LeaseTable, LeaseView};
use crate::role::RoleUpdate;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// State for the engine API.
///
/// The router acts as lease manager: issued secrets stay in `leases` and
/// callers renew or revoke by lease ID.
#[derive(Clone)]
pub struct EngineAppState {
    pub backend: Arc<Backend>,
    /// Bearer token required on every request. None = unrestricted (dev mode).
    pub root_token: Option<String>,
    pub leases: Arc<LeaseTable>,
}

impl EngineAppState {
    pub fn new(backend: Arc<Backend>, root_token: Option<String>) -> Self {
        Self {
            backend,
            root_token,
            leases: Arc::new(LeaseTable::new()),
        }
    }

    fn check(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        authorize(headers, self.root_token.as_deref())?;
        Ok(())
    }
}

/// Body of renew/revoke.
#[derive(Serialize, Deserialize)]
pub struct LeaseRequest {
    pub lease_id: String,
}

#[derive(Serialize)]
struct ListResponse {
    keys: Vec<String>,
}

pub fn create_engine_router(state: EngineAppState) -> Router {
    Router::new()
        .route(
            "/v1/config",
            get(read_config).put(write_config).post(write_config),
        )
        .route("/v1/role", get(list_roles))
        .route("/v1/role/", get(list_roles))
        .route(
            "/v1/role/:name",
            get(read_role)
                .post(upsert_role)
                .put(update_role)
                .delete(delete_role),
        )
        .route("/v1/creds/:name", get(issue_creds))
        .route("/v1/sys/leases/renew", put(renew_lease))
        .route("/v1/sys/leases/revoke", put(revoke_lease))
        .with_state(Arc::new(state))
}

/// GET /v1/config - masked configuration
async fn read_config(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    state.check(&headers)?;

    match state.backend.read_config().await? {
        Some(config) => Ok(Json(config).into_response()),
        None => Ok(not_found()),
    }
}

/// PUT|POST /v1/config
async fn write_config(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
    Json(update): Json<ConfigUpdate>,
) -> Result<StatusCode, ApiError> {
    state.check(&headers)?;
    state.backend.update_config(update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/role
async fn list_roles(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
) -> Result<Json<ListResponse>, ApiError> {
    state.check(&headers)?;
    let keys = state.backend.list_roles().await?;
    Ok(Json(ListResponse { keys }))
}

/// GET /v1/role/:name
async fn read_role(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    state.check(&headers)?;

    match state.backend.read_role(&name).await? {
        Some(role) => Ok(Json(role).into_response()),
        None => Ok(not_found()),
    }
}

/// POST /v1/role/:name - create or update
async fn upsert_role(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(update): Json<RoleUpdate>,
) -> Result<StatusCode, ApiError> {
    state.check(&headers)?;
    state.backend.upsert_role(&name, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /v1/role/:name - update an existing role only
async fn update_role(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
    Json(update): Json<RoleUpdate>,
) -> Result<StatusCode, ApiError> {
    state.check(&headers)?;
    state.backend.update_role(&name, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /v1/role/:name
async fn delete_role(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.check(&headers)?;
    state.backend.delete_role(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/creds/:name - mint a new API key under the role
async fn issue_creds(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    state.check(&headers)?;

    let Some(secret) = state.backend.issue_credentials(&name).await? else {
        return Ok(not_found());
    };
    let view = LeaseView::from(&secret);
    state.leases.insert(secret);
    Ok(Json(view).into_response())
}

/// PUT /v1/sys/leases/renew
async fn renew_lease(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
    Json(request): Json<LeaseRequest>,
) -> Result<Json<LeaseView>, ApiError> {
    state.check(&headers)?;

    let renewed = state
        .leases
        .update(&request.lease_id, |secret| state.backend.renew(secret))
        .ok_or(ApiError::UnknownLease(request.lease_id))?;
    Ok(Json(LeaseView::from(&renewed)))
}

/// PUT /v1/sys/leases/revoke - the lease is dropped once the remote key is gone
async fn revoke_lease(
    State(state): State<Arc<EngineAppState>>,
    headers: HeaderMap,
    Json(request): Json<LeaseRequest>,
) -> Result<StatusCode, ApiError> {
    state.check(&headers)?;

    let secret = state
        .leases
        .take(&request.lease_id)
        .ok_or(ApiError::UnknownLease(request.lease_id))?;
    if let Err(e) = state.backend.revoke(&secret).await {
        state.leases.restore(secret);
        return Err(e.into());
    }
    Ok(StatusCode::NO_CONTENT)
}
