//! Root-token guard for the HTTP surface.

use axum::http::{header::AUTHORIZATION, HeaderMap};


/// Why a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing root token")]
    MissingToken,
    #[error("authorization header must be 'Bearer <token>'")]
    MalformedHeader,
    #[error("permission denied")]
    PermissionDenied,
}

/// Admits the request when it presents `root_token` as a bearer token.
///
/// With no root token set every request is admitted (dev mode).
pub fn authorize(headers: &HeaderMap, root_token: Option<&str>) -> Result<(), AuthError> {
    let Some(root_token) = root_token else {
        return Ok(());
    };

    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    let (scheme, presented) = value.split_once(' ').ok_or(AuthError::MalformedHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MalformedHeader);
    }

    match presented.trim() {
        "" => Err(AuthError::MissingToken),
        token if token == root_token => Ok(()),
        _ => Err(AuthError::PermissionDenied),
    }
}
