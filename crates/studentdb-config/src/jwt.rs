use std::env;

/// Access tokens live for 30 minutes unless `JWT_ACCESS_EXPIRY` says otherwise.
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 30 * 60;

#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Lifetime of an access token, in seconds.
    pub access_token_expiry: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_token_expiry: env::var("JWT_ACCESS_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs: &i64| *secs > 0)
                .unwrap_or(DEFAULT_ACCESS_TOKEN_EXPIRY),
        }
    }
}

// The secret must never end up in logs through `#[instrument]` or `{:?}`.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_token_expiry", &self.access_token_expiry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let config = JwtConfig {
            secret: "super-secret".to_string(),
            access_token_expiry: 60,
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("access_token_expiry: 60"));
    }
}
