use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::repo::{PgUserStore, UserStore};
use crate::config::{AppConfig, StoreBackend};
use crate::memory::{MemorySweetStore, MemoryUserStore};
use crate::sweets::repo::{PgSweetStore, SweetStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub sweets: Arc<dyn SweetStore>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        if !crate::auth::password::warm_dummy_hash() {
            anyhow::bail!("could not build the dummy password hash");
        }
        match config.store {
            StoreBackend::Postgres => Self::postgres(config).await,
            StoreBackend::Memory => {
                tracing::warn!("using in-memory store; data is lost on restart");
                Ok(Self::in_memory(config))
            }
        }
    }

    async fn postgres(config: AppConfig) -> anyhow::Result<Self> {
        let url = config
            .database_url
            .as_deref()
            .context("DATABASE_URL is not set")?;
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run migrations")?;
        tracing::info!("database migrations applied");

        Ok(Self {
            config: Arc::new(config),
            users: Arc::new(PgUserStore::new(db.clone())),
            sweets: Arc::new(PgSweetStore::new(db)),
        })
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            users: Arc::new(MemoryUserStore::default()),
            sweets: Arc::new(MemorySweetStore::default()),
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::in_memory(AppConfig::for_tests())
    }
}
