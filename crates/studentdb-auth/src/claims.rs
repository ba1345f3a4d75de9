//! JWT claim structure for access tokens.

use serde::{Deserialize, Serialize};

/// Claims embedded in every access token.
///
/// Tokens are stateless: nothing about them is persisted server-side, so the
/// signature and `exp` alone decide validity.
///
/// # Fields
///
/// - `sub`: Username (subject)
/// - `iat`: Issued-at timestamp
/// - `exp`: Expiration timestamp, always `iat` + the configured lifetime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username (subject claim)
    pub sub: String,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
}
