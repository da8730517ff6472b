//! Sync facade: load, reconcile and commit one fixture feed.

use crate::config::Config;
use crate::db::{self, Pool};
use crate::error::{Result, StoreError};
use crate::ids::UuidIds;
use crate::uow::PgUnitOfWork;
use matchsync_engine::{MatchFeed, SyncOptions, SyncPipeline, SyncResult};
use tracing::{info, warn};

/// Reconciles fixture feeds against PostgreSQL.
#[derive(Debug, Clone)]
pub struct MatchSync {
    pool: Pool,
    options: SyncOptions,
}

impl MatchSync {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            options: SyncOptions::default(),
        }
    }

    /// Connect with `config`, applying migrations when enabled.
    pub async fn connect(config: &Config) -> Result<Self> {
        let pool = db::create_pool(&config.database_url, config.max_connections).await?;

        if config.run_migrations {
            info!("Running database migrations...");
            db::run_migrations(&pool).await?;
        }

        Ok(Self::new(pool))
    }

    pub fn with_options(mut self, options: SyncOptions) -> Self {
        self.options = options;
        self
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Sync one feed. Changes are committed only when the pipeline succeeds;
    /// a failed pipeline is reported through the returned result and leaves
    /// the database untouched.
    pub async fn sync(&self, feed: &MatchFeed) -> Result<SyncResult> {
        let fixture = feed.fixture.id;
        let existing =
            db::load_existing(&self.pool, fixture, &[feed.teams.home.id, feed.teams.away.id])
                .await?;

        let mut uow = PgUnitOfWork::new();
        let mut ids = UuidIds;
        let result = SyncPipeline::new(feed, &mut ids)
            .with_options(self.options.clone())
            .run(existing, &mut uow);

        if !result.success {
            warn!(
                fixture,
                error = result.message.as_deref().unwrap_or_default(),
                "sync rolled back"
            );
            return Ok(result);
        }

        uow.commit(&self.pool).await?;
        info!(
            fixture,
            created = result.totals.created,
            updated = result.totals.updated,
            deleted = result.totals.deleted,
            "fixture synced"
        );
        Ok(result)
    }

    /// Decode a raw feed payload and sync it.
    pub async fn sync_json(&self, payload: &str) -> Result<SyncResult> {
        let feed = MatchFeed::from_json(payload)?;
        self.sync(&feed).await
    }

    /// Like [`MatchSync::sync`], but a failed pipeline is an error.
    pub async fn try_sync(&self, feed: &MatchFeed) -> Result<SyncResult> {
        let result = self.sync(feed).await?;
        if result.success {
            Ok(result)
        } else {
            Err(StoreError::SyncFailed(result.message.unwrap_or_default()))
        }
    }
}
