//! # studentdb Auth
//!
//! Bearer token types and JWT utilities for the studentdb API.
//!
//! - [`claims`]: the access token claim structure
//! - [`jwt`]: [`TokenService`], which issues and verifies tokens
//!
//! Tokens are stateless. There is no session table and no revocation list, so
//! logging out cannot invalidate a token before its `exp`.
//!
//! # Example
//!
//! ```ignore
//! use studentdb_auth::TokenService;
//! use studentdb_config::JwtConfig;
//!
//! let tokens = TokenService::new(&JwtConfig::from_env());
//! let token = tokens.issue("alice")?;
//! let subject = tokens.verify(&token)?;
//! ```

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::Claims;
pub use jwt::TokenService;
