//! Application error types.
//!
//! Domain layers return the narrow enums defined here ([`AuthError`],
//! [`CredentialError`], [`StoreError`]); HTTP handlers return [`AppError`], which
//! carries a status code and renders as `{"error": "..."}`.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Body used for every authentication failure, whichever check rejected the request.
pub const UNAUTHORIZED_MESSAGE: &str = "Not authenticated";

/// Bearer token and principal failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Token could not be decoded or its signature does not match.
    #[error("token is malformed or has an invalid signature")]
    Malformed,

    /// Signature is valid but the `exp` claim is in the past.
    #[error("token has expired")]
    Expired,

    /// Missing header, or the subject no longer exists.
    #[error("unauthorized")]
    Unauthorized,
}

/// Failures raised by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] Error),
}

/// Registration and login failures.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("User already exists")]
    AlreadyExists,

    /// Returned for both unknown usernames and wrong passwords.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    #[error("Failed to process password")]
    Hashing(#[source] Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            status,
            error: err.into(),
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err)
    }

    pub fn not_found<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::NOT_FOUND, err)
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(StatusCode::BAD_REQUEST, err)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, anyhow::anyhow!(message.into()))
    }

    /// Uniform 401. The message never says which check failed.
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, anyhow::anyhow!(UNAUTHORIZED_MESSAGE))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(error = ?self.error, status = %self.status, "Request failed");
        }

        let body = Json(json!({
            "error": self.error.to_string()
        }));

        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                axum::http::header::WWW_AUTHENTICATE,
                axum::http::HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::internal(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        tracing::debug!(reason = %err, "Rejecting request");
        AppError::unauthorized()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::internal(err)
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::AlreadyExists | CredentialError::InvalidCredentials => {
                AppError::bad_request(err)
            }
            CredentialError::Hashing(e) => AppError::internal(e),
            CredentialError::Store(e) => AppError::internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_share_one_response() {
        let malformed: AppError = AuthError::Malformed.into();
        let expired: AppError = AuthError::Expired.into();
        let unauthorized: AppError = AuthError::Unauthorized.into();

        assert_eq!(malformed.status, StatusCode::UNAUTHORIZED);
        assert_eq!(malformed.error.to_string(), expired.error.to_string());
        assert_eq!(expired.error.to_string(), unauthorized.error.to_string());
    }

    #[test]
    fn test_credential_errors_are_bad_requests() {
        let exists: AppError = CredentialError::AlreadyExists.into();
        let invalid: AppError = CredentialError::InvalidCredentials.into();

        assert_eq!(exists.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
        assert_eq!(invalid.error.to_string(), "Incorrect username or password");
    }

    #[test]
    fn test_store_error_is_internal() {
        let err: AppError = CredentialError::Store(StoreError::Backend(anyhow::anyhow!("down")))
            .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unauthorized_response_has_challenge_header() {
        let response = AppError::unauthorized().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(axum::http::header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }
}
