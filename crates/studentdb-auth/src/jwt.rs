//! JWT (JSON Web Token) issuance and verification.
//!
//! [`TokenService`] signs HS256 access tokens with the process-wide secret from
//! [`JwtConfig`]. Verification checks the signature and the `exp` claim only; it
//! never looks at the credential store. Confirming that the subject still
//! exists is the caller's job.
//!
//! # Example
//!
//! ```ignore
//! use studentdb_auth::TokenService;
//! use studentdb_config::JwtConfig;
//!
//! let tokens = TokenService::new(&JwtConfig::from_env());
//! let token = tokens.issue("alice")?;
//! assert_eq!(tokens.verify(&token)?, "alice");
//! ```

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use studentdb_config::JwtConfig;
use studentdb_core::{AppError, AuthError};

use crate::claims::Claims;

/// Issues and verifies signed, time-limited bearer tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(jwt_config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // An expired token is rejected the moment `exp` passes.
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(jwt_config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_config.secret.as_bytes()),
            validation,
            ttl: Duration::seconds(jwt_config.access_token_expiry),
        }
    }

    /// Lifetime of issued tokens.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token for `subject`, valid from now for [`Self::ttl`].
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails.
    pub fn issue(&self, subject: &str) -> Result<String, AppError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issues a token as if it had been created at `issued_at`.
    pub fn issue_at(&self, subject: &str, issued_at: DateTime<Utc>) -> Result<String, AppError> {
        let iat = issued_at.timestamp().max(0) as usize;
        let exp = (issued_at + self.ttl).timestamp().max(0) as usize;

        let claims = Claims {
            sub: subject.to_string(),
            iat,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(anyhow::anyhow!("Failed to create token: {}", e)))
    }

    /// Verifies `token` and returns its subject.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Expired`] if the signature is valid but `exp` has passed
    /// - [`AuthError::Malformed`] for anything else: bad encoding, wrong
    ///   signature, wrong algorithm, missing claims
    pub fn verify(&self, token: &str) -> Result<String, AuthError> {
        self.decode(token).map(|claims| claims.sub)
    }

    /// Verifies `token` and returns all of its claims.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Malformed,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 1800,
        }
    }

    #[test]
    fn test_issue_success() {
        let tokens = TokenService::new(&get_test_jwt_config());
        let token = tokens.issue("alice").unwrap();
        assert!(!token.is_empty());
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_verify_returns_subject() {
        let tokens = TokenService::new(&get_test_jwt_config());
        let token = tokens.issue("alice").unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "alice");
    }

    #[test]
    fn test_expiry_is_issued_at_plus_ttl() {
        let tokens = TokenService::new(&get_test_jwt_config());
        let token = tokens.issue("alice").unwrap();
        let claims = tokens.decode(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 1800);
    }

    #[test]
    fn test_verify_garbage_is_malformed() {
        let tokens = TokenService::new(&get_test_jwt_config());
        assert_eq!(tokens.verify("invalid-token"), Err(AuthError::Malformed));
        assert_eq!(tokens.verify(""), Err(AuthError::Malformed));
    }

    #[test]
    fn test_verify_wrong_secret_is_malformed() {
        let tokens = TokenService::new(&get_test_jwt_config());
        let token = tokens.issue("alice").unwrap();

        let other = TokenService::new(&JwtConfig {
            secret: "different-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 1800,
        });

        assert_eq!(other.verify(&token), Err(AuthError::Malformed));
    }

    #[test]
    fn test_verify_tampered_payload_is_malformed() {
        let tokens = TokenService::new(&get_test_jwt_config());
        let token = tokens.issue("alice").unwrap();
        let forged = tokens.issue("mallory").unwrap();

        // Splice mallory's payload onto alice's signature.
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(tokens.verify(&spliced), Err(AuthError::Malformed));
    }

    #[test]
    fn test_verify_expired_token() {
        let tokens = TokenService::new(&get_test_jwt_config());
        let issued_at = Utc::now() - Duration::minutes(31);
        let token = tokens.issue_at("alice", issued_at).unwrap();

        assert_eq!(tokens.verify(&token), Err(AuthError::Expired));
    }

    #[test]
    fn test_verify_just_before_expiry() {
        let tokens = TokenService::new(&get_test_jwt_config());
        let issued_at = Utc::now() - Duration::minutes(29);
        let token = tokens.issue_at("alice", issued_at).unwrap();

        assert_eq!(tokens.verify(&token).unwrap(), "alice");
    }

    #[test]
    fn test_debug_hides_keys() {
        let tokens = TokenService::new(&get_test_jwt_config());
        let debug = format!("{:?}", tokens);
        assert!(!debug.contains("test-secret"));
    }
}
