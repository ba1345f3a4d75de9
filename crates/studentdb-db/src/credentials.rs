//! Credential storage.
//!
//! Implementations only provide an atomic insert-if-absent and a lookup;
//! registration and login are built on top of them as provided methods so that
//! hashing and the uniform login failure behave the same on every backend.

use std::sync::{Arc, LazyLock};

use anyhow::Context;
use async_trait::async_trait;
use dashmap::{DashMap, mapref::entry::Entry};
use sqlx::PgPool;
use tracing::{debug, instrument};

use studentdb_core::{CredentialError, StoreError, hash_password, verify_password};
use studentdb_models::auth::Credential;

/// Hash checked when the username is unknown, so a miss costs as much bcrypt
/// work as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("studentdb-dummy-password").ok());

/// Burns one bcrypt verification against [`DUMMY_HASH`].
fn verify_against_dummy(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync + std::fmt::Debug {
    /// Stores `credential` unless the username is taken. Returns `false` if it was.
    async fn insert_if_absent(&self, credential: Credential) -> Result<bool, StoreError>;

    /// Exact, case-sensitive lookup.
    async fn find(&self, username: &str) -> Result<Option<Credential>, StoreError>;

    /// Registers a new account with a bcrypt-hashed password.
    ///
    /// # Errors
    ///
    /// [`CredentialError::AlreadyExists`] if the username is taken.
    #[instrument(skip(self, password))]
    async fn register(
        &self,
        username: &str,
        password: &str,
        read_only: bool,
    ) -> Result<Credential, CredentialError> {
        let password_hash = hash_password(password).map_err(|e| CredentialError::Hashing(e.error))?;
        let credential = Credential {
            username: username.to_string(),
            password_hash,
            read_only,
        };

        if !self.insert_if_absent(credential.clone()).await? {
            return Err(CredentialError::AlreadyExists);
        }

        debug!(username = %username, "Credential registered");
        Ok(credential)
    }

    /// Checks a username/password pair.
    ///
    /// # Errors
    ///
    /// [`CredentialError::InvalidCredentials`] for an unknown user and for a
    /// wrong password alike.
    #[instrument(skip(self, password))]
    async fn verify_login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Credential, CredentialError> {
        let Some(credential) = self.find(username).await? else {
            verify_against_dummy(password);
            return Err(CredentialError::InvalidCredentials);
        };

        let is_valid = verify_password(password, &credential.password_hash)
            .map_err(|e| CredentialError::Hashing(e.error))?;
        if !is_valid {
            return Err(CredentialError::InvalidCredentials);
        }

        Ok(credential)
    }

    /// Confirms that a token subject still refers to an account.
    async fn lookup(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        self.find(username).await
    }
}

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    #[instrument(skip(self, credential), fields(username = %credential.username))]
    async fn insert_if_absent(&self, credential: Credential) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO credentials (username, password_hash, read_only)
            VALUES ($1, $2, $3)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(&credential.username)
        .bind(&credential.password_hash)
        .bind(credential.read_only)
        .execute(&self.pool)
        .await
        .context("Failed to insert credential")?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn find(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT username, password_hash, read_only FROM credentials WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch credential")?;

        Ok(credential)
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: Arc<DashMap<String, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_if_absent(&self, credential: Credential) -> Result<bool, StoreError> {
        match self.credentials.entry(credential.username.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(credential);
                Ok(true)
            }
        }
    }

    async fn find(&self, username: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.get(username).map(|entry| entry.clone()))
    }
}
