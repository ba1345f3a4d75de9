//! # studentdb Config
//!
//! Configuration types for the studentdb API, loaded from environment variables:
//!
//! - [`jwt`]: token signing secret and lifetime
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: PostgreSQL connection settings
//! - [`features`]: auth/metrics toggles and server settings
//!
//! Cache settings live next to the cache in `studentdb-cache`.
//!
//! # Example
//!
//! ```ignore
//! use studentdb_config::{CorsConfig, FeatureConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let features = FeatureConfig::from_env();
//! ```

pub mod cors;
pub mod database;
pub mod features;
pub mod jwt;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use features::{FeatureConfig, env_flag};
pub use jwt::JwtConfig;
