use std::sync::Arc;

use anyhow::{Context, bail};
use tracing::info;

use classbook_authz::{Clock, MemoryStore, Store, SystemClock};
use classbook_config::{CorsConfig, JwtConfig, WorkflowConfig};
use classbook_db::{PgStore, init_db_pool, run_migrations};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub workflow_config: WorkflowConfig,
}

impl AppState {
    /// State with environment-derived configuration around an existing store.
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            jwt_config: JwtConfig::from_env(),
            cors_config: CorsConfig::from_env(),
            workflow_config: WorkflowConfig::from_env(),
        }
    }
}

/// Builds the state from the environment. `STORE_BACKEND` selects
/// `postgres` (default) or `memory`.
pub async fn init_app_state() -> anyhow::Result<AppState> {
    let backend = std::env::var("STORE_BACKEND").unwrap_or_else(|_| "postgres".to_string());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let store: Arc<dyn Store> = match backend.as_str() {
        "postgres" => {
            let pool = init_db_pool().await?;
            run_migrations(&pool).await.context("Database not ready")?;
            Arc::new(PgStore::new(pool))
        }
        "memory" => Arc::new(MemoryStore::with_clock(clock.clone())),
        other => bail!("Unknown STORE_BACKEND: {}", other),
    };
    info!(%backend, "Store initialized");

    Ok(AppState::new(store, clock))
}
