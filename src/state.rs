use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::users::dns::{AcceptAll, DomainResolver, SystemResolver};
use crate::users::memory::InMemoryUserRepository;
use crate::users::repo::{PgUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    /// Set when running against Postgres; used for migrations.
    pub db: Option<PgPool>,
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserRepository>,
    pub resolver: Arc<dyn DomainResolver>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let resolver: Arc<dyn DomainResolver> = if config.email_dns_check {
            Arc::new(SystemResolver::from_system_conf())
        } else {
            Arc::new(AcceptAll)
        };

        let Some(url) = config.database_url.as_deref() else {
            warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            return Ok(Self::from_parts(
                None,
                config.clone(),
                Arc::new(InMemoryUserRepository::new()),
                resolver,
            ));
        };

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(url)
            .await
            .context("connect to database")?;
        info!(max_connections = config.max_connections, "connected to postgres");

        let users = Arc::new(PgUserRepository::new(db.clone())) as Arc<dyn UserRepository>;
        Ok(Self::from_parts(Some(db), config, users, resolver))
    }

    /// Applies `migrations/`. The partial unique index on active emails lives
    /// there, so a failure here must stop startup.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        let Some(db) = &self.db else {
            return Ok(());
        };
        sqlx::migrate!("./migrations")
            .run(db)
            .await
            .context("run database migrations")?;
        info!("database migrations applied");
        Ok(())
    }

    pub fn from_parts(
        db: Option<PgPool>,
        config: Arc<AppConfig>,
        users: Arc<dyn UserRepository>,
        resolver: Arc<dyn DomainResolver>,
    ) -> Self {
        Self {
            db,
            config,
            users,
            resolver,
        }
    }

    /// In-memory state for tests. Email domains under the reserved
    /// `.invalid` TLD fail to resolve; everything else resolves.
    pub fn fake() -> Self {
        #[derive(Clone, Copy)]
        struct FakeResolver;
        #[async_trait]
        impl DomainResolver for FakeResolver {
            async fn resolves(&self, domain: &str) -> bool {
                !domain.ends_with(".invalid")
            }
        }

        Self::from_parts(
            None,
            Arc::new(AppConfig::default()),
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(FakeResolver),
        )
    }
}
