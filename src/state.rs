use std::sync::Arc;

use crate::{
    auth::JwtKeys,
    config::AppConfig,
    db,
    users::{InMemoryUserStore, PgUserStore, UserStore},
};

/// Shared, read-only per-request context.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
    pub jwt: JwtKeys,
}

impl AppState {
    /// Loads config, validates it, connects to Postgres and runs migrations.
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;
        config.validate()?;

        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;

        Ok(Self::from_parts(
            Arc::new(PgUserStore::new(pool)),
            Arc::new(config),
        ))
    }

    pub fn from_parts(users: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        let jwt = JwtKeys::from_config(&config.jwt);
        Self { users, config, jwt }
    }

    /// In-memory store with the fake config; no database involved.
    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(AppConfig::fake()),
        )
    }
}
