use std::sync::Arc;

use tracing::{info, warn};

use studentdb_auth::TokenService;
use studentdb_cache::{CacheConfig, QueryCache};
use studentdb_config::{CorsConfig, DatabaseConfig, FeatureConfig, JwtConfig};
use studentdb_db::{
    CredentialStore, MemoryCredentialStore, MemoryStudentRepository, PgCredentialStore,
    PgStudentRepository, StudentRepository, init_db_pool, run_migrations,
};

use crate::tasks::TaskQueue;

#[derive(Clone, Debug)]
pub struct AppState {
    pub students: Arc<dyn StudentRepository>,
    pub credentials: Arc<dyn CredentialStore>,
    pub tokens: TokenService,
    /// `None` when caching is disabled.
    pub cache: Option<QueryCache>,
    pub cache_config: CacheConfig,
    pub features: FeatureConfig,
    pub cors_config: CorsConfig,
    pub tasks: TaskQueue,
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let database_config = DatabaseConfig::from_env();
    let cache_config = CacheConfig::from_env();

    let (students, credentials): (Arc<dyn StudentRepository>, Arc<dyn CredentialStore>) =
        if database_config.url.is_some() {
            let pool = init_db_pool(&database_config).await?;
            run_migrations(&pool).await?;
            info!(max_connections = database_config.max_connections, "Connected to PostgreSQL");
            (
                Arc::new(PgStudentRepository::new(pool.clone())),
                Arc::new(PgCredentialStore::new(pool)),
            )
        } else {
            warn!("DATABASE_URL is not set, using the in-memory store; data is lost on restart");
            (
                Arc::new(MemoryStudentRepository::new()),
                Arc::new(MemoryCredentialStore::new()),
            )
        };

    Ok(AppState {
        students,
        credentials,
        tokens: TokenService::new(&JwtConfig::from_env()),
        cache: init_cache(&cache_config).await,
        cache_config,
        features: FeatureConfig::from_env(),
        cors_config: CorsConfig::from_env(),
        tasks: TaskQueue::start(),
    })
}

async fn init_cache(config: &CacheConfig) -> Option<QueryCache> {
    if !config.enabled {
        info!("Query cache disabled");
        return None;
    }

    match QueryCache::connect(config).await {
        Ok(cache) => {
            info!(
                backend = ?config.backend,
                ttl_secs = config.default_ttl_seconds,
                invalidate_on_write = config.invalidate_on_write,
                "Query cache enabled"
            );
            Some(cache)
        }
        Err(e) => {
            warn!(error = %e, "Cache backend unavailable, falling back to the in-memory cache");
            Some(QueryCache::memory(config))
        }
    }
}
