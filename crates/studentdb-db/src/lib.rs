//! # studentdb DB
//!
//! Storage layer for the studentdb API.
//!
//! Both stores are traits so the API can run against PostgreSQL or, when no
//! `DATABASE_URL` is configured, against process-local maps:
//!
//! - [`StudentRepository`]: CRUD and aggregate queries over student records
//! - [`CredentialStore`]: login credentials with bcrypt-hashed passwords
//!
//! # Example
//!
//! ```ignore
//! use studentdb_config::DatabaseConfig;
//! use studentdb_db::{PgStudentRepository, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool(&DatabaseConfig::from_env()).await?;
//! run_migrations(&pool).await?;
//! let students = PgStudentRepository::new(pool);
//! ```

pub mod credentials;
pub mod students;

pub use credentials::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
pub use students::{MemoryStudentRepository, PgStudentRepository, StudentRepository};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use studentdb_config::DatabaseConfig;

/// Connects a PostgreSQL pool sized by `DATABASE_MAX_CONNECTIONS`.
///
/// # Errors
///
/// Fails if `DATABASE_URL` is unset or the database is unreachable.
pub async fn init_db_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let database_url = config
        .url
        .as_deref()
        .context("DATABASE_URL must be set")?;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Applies the bundled schema migrations.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!()
        .run(pool)
        .await
        .context("Failed to run database migrations")
}

// Re-export PgPool for convenience
pub use sqlx::PgPool;
