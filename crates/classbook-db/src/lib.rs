//! # Classbook DB
//!
//! PostgreSQL connection pool, migrations and the [`PgStore`] backend of the
//! authorization core's `Store` seam.
//!
//! # Example
//!
//! ```ignore
//! use classbook_db::{PgStore, init_db_pool, run_migrations};
//!
//! let pool = init_db_pool().await?;
//! run_migrations(&pool).await?;
//! let store = PgStore::new(pool);
//! ```

mod store;

use std::env;

use anyhow::Context;
use tracing::info;

pub use sqlx::PgPool;
pub use store::PgStore;

/// Connects to the database named by `DATABASE_URL`.
pub async fn init_db_pool() -> anyhow::Result<PgPool> {
    let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");
    Ok(pool)
}

/// Applies pending migrations from the workspace `migrations/` directory.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations applied");
    Ok(())
}
