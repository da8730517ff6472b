//! # Matchsync Store
//!
//! PostgreSQL persistence for `matchsync-engine`.
//!
//! [`MatchSync`] loads the persisted state of a fixture, runs the engine's
//! sync pipeline against a staging [`PgUnitOfWork`] and commits the staged
//! changes in a single transaction when the pipeline succeeds.
//!
//! ```no_run
//! use matchsync_store::{Config, MatchSync};
//!
//! # async fn run(payload: &str) -> matchsync_store::Result<()> {
//! let config = Config::from_env()?;
//! let sync = MatchSync::connect(&config).await?;
//! let result = sync.sync_json(payload).await?;
//! println!("{} rows changed", result.totals.total());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod sync;
pub mod uow;

pub use config::{Config, ConfigError};
pub use error::{Result, StoreError};
pub use ids::UuidIds;
pub use sync::MatchSync;
pub use uow::PgUnitOfWork;
