//! Credential models and auth request/response DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A stored login credential. `username` is unique across the store.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub read_only: bool,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
    #[serde(default)]
    pub read_only: bool,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("read_only", &self.read_only)
            .finish_non_exhaustive()
    }
}

/// Form-encoded login body (`username`, `password`).
#[derive(Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub password: String,
}

impl std::fmt::Debug for TokenRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The authenticated principal as reported by `/auth/me`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PrincipalResponse {
    pub username: String,
    pub read_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_read_only_defaults_to_false() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"username":"alice","password":"pw"}"#).unwrap();
        assert!(!req.read_only);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_empty_username_rejected() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"username":"","password":"pw"}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_debug_never_prints_password() {
        let req: RegisterRequest =
            serde_json::from_str(r#"{"username":"alice","password":"hunter2"}"#).unwrap();
        assert!(!format!("{:?}", req).contains("hunter2"));
    }

    #[test]
    fn test_credential_serialization_skips_hash() {
        let credential = Credential {
            username: "alice".to_string(),
            password_hash: "$2b$12$abc".to_string(),
            read_only: false,
        };
        let json = serde_json::to_string(&credential).unwrap();
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_token_response_is_bearer() {
        let response = TokenResponse::bearer("abc".to_string());
        assert_eq!(response.token_type, "bearer");
    }
}
