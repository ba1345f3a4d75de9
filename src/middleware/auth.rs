use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::debug;

use studentdb_core::{AppError, AuthError};

use crate::state::AppState;

/// Extractor for the authenticated principal.
///
/// Runs token verification and then confirms the subject still has a
/// credential. Every failure becomes the same 401 before the handler runs.
/// With `AUTH_ENABLED=false` it yields an anonymous principal instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub read_only: bool,
}

impl AuthUser {
    pub const ANONYMOUS: &'static str = "anonymous";

    fn anonymous() -> Self {
        Self {
            username: Self::ANONYMOUS.to_string(),
            read_only: false,
        }
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !state.features.auth_enabled {
            return Ok(AuthUser::anonymous());
        }

        let token = bearer_token(&parts.headers).ok_or(AuthError::Unauthorized)?;
        let subject = state.tokens.verify(token)?;

        let Some(credential) = state.credentials.lookup(&subject).await? else {
            debug!(subject = %subject, "Token subject has no credential");
            return Err(AuthError::Unauthorized.into());
        };

        Ok(AuthUser {
            username: credential.username,
            read_only: credential.read_only,
        })
    }
}

/// [`AuthUser`] that may also write.
///
/// Read-only accounts are refused with 403 only when
/// `AUTH_ENFORCE_READ_ONLY=true`; otherwise this is the same as [`AuthUser`].
#[derive(Debug, Clone)]
pub struct WriteAccess(pub AuthUser);

impl FromRequestParts<AppState> for WriteAccess {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;

        if state.features.enforce_read_only && auth_user.read_only {
            return Err(AppError::forbidden("Read-only account cannot modify records"));
        }

        Ok(WriteAccess(auth_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&headers("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwdw==")), None);
        assert_eq!(bearer_token(&headers("Bearer")), None);
        assert_eq!(bearer_token(&headers("Bearer   ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
