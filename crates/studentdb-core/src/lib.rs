//! # studentdb Core
//!
//! Core types, errors, and utilities for the studentdb API.
//!
//! - [`errors`]: Domain error enums and the HTTP-facing [`AppError`]
//! - [`password`]: bcrypt password hashing and verification
//!
//! # Example
//!
//! ```ignore
//! use studentdb_core::{AppError, hash_password, verify_password};
//!
//! let hash = hash_password("secure_password")?;
//! assert!(verify_password("secure_password", &hash)?);
//!
//! let error = AppError::not_found(anyhow::anyhow!("Student not found"));
//! ```

pub mod errors;
pub mod password;

// Re-export commonly used types at crate root
pub use errors::{AppError, AuthError, CredentialError, StoreError};
pub use password::{hash_password, verify_password};
