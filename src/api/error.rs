use crate::auth::AuthError;
use crate::error::BackendError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Errors returned by HTTP handlers
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(AuthError),
    /// Renew/revoke named a lease this server never issued or already revoked.
    UnknownLease(String),
    Backend(BackendError),
}

impl From<BackendError> for ApiError {
    fn from(e: BackendError) -> Self {
        ApiError::Backend(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Unauthorized(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::UnknownLease(lease_id) => (
                StatusCode::BAD_REQUEST,
                format!("lease not found: {}", lease_id),
            ),
            ApiError::Backend(e) => {
                let status = match &e {
                    BackendError::Validation(_) | BackendError::Configuration(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    BackendError::Remote(_) => StatusCode::BAD_GATEWAY,
                    BackendError::InternalData(_) | BackendError::Storage(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                if status.is_server_error() {
                    error!(error = %e, "Request failed");
                }
                (status, e.to_string())
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
            }),
        )
            .into_response()
    }
}

/// 404 with an empty object: the read succeeded but there is nothing to show.
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(serde_json::json!({}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteError;

    fn status_of(e: ApiError) -> StatusCode {
        e.into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(BackendError::validation("bad").into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BackendError::Configuration("setup the config first".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(BackendError::Remote(RemoteError::new(Some(401), "Invalid token")).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(BackendError::InternalData("missing".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(BackendError::Storage(anyhow::anyhow!("disk")).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ApiError::UnknownLease("creds/x/1".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AuthError::MissingToken.into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn test_error_body() {
        let response = ApiError::from(BackendError::validation("ttl exceeds max_ttl")).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "ttl exceeds max_ttl");
    }
}
