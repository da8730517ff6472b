//! # Matchsync Engine
//!
//! A deterministic reconciliation engine for live football match feeds.
//!
//! A third-party provider is polled repeatedly over the life of a fixture.
//! Each poll is a full, mutable snapshot: events get reordered or retracted,
//! and participants are sometimes identified only by name. This crate turns
//! every poll into the minimal set of create/update/delete changes needed to
//! converge previously persisted state with the feed.
//!
//! ## Design Principles
//!
//! - **No IO**: persistence is a collaborator behind [`UnitOfWork`]
//! - **Deterministic**: same feed and state always produce the same changes
//! - **Idempotent**: re-running a poll against its own result changes nothing
//! - **Durable identity**: surrogate ids are minted once and carried forward
//!   by re-matching on [`IdentityKey`]
//!
//! ## Core Concepts
//!
//! ### Identity
//!
//! [`IdentityKey`] is either the provider's numeric id or a name fallback.
//! The two never collide.
//!
//! ### Normalization
//!
//! The [`EventNormalizer`] orients substitutions, credits own goals to the
//! opponent, reclassifies missed penalties, sorts deterministically and
//! assigns contiguous slots. Participants seen only in events are captured
//! as feed-only.
//!
//! ### Participants
//!
//! [`ParticipantSources::merge`] combines lineup, event-derived and
//! statistics-derived participants with lineup > events > statistics
//! priority.
//!
//! ### Reconciliation
//!
//! The [`ReconciliationPlanner`] diffs new records against persisted rows by
//! key and produces a [`ChangeSet`]. Unchanged rows never appear in it.
//!
//! ### Pipeline
//!
//! [`SyncPipeline`] runs base fixture/teams, participants, events and the two
//! statistics stages in order. Base and participant failures fail the run;
//! statistics failures are absorbed.
//!
//! ## Quick Start
//!
//! ```rust
//! use matchsync_engine::{MatchFeed, MemoryStore, SequentialIds, SyncOptions};
//! use serde_json::json;
//!
//! let feed = MatchFeed::from_value(json!({
//!     "fixture": {"id": 1035037, "timestamp": 1692360000, "status": {"short": "1H", "elapsed": 12}},
//!     "teams": {"home": {"id": 42, "name": "Arsenal"}, "away": {"id": 65, "name": "Nottingham Forest"}},
//!     "goals": {"home": 1, "away": 0},
//!     "events": [{
//!         "time": {"elapsed": 2},
//!         "team": {"id": 42},
//!         "player": {"id": 1460, "name": "E. Nketiah"},
//!         "assist": {"id": null, "name": null},
//!         "type": "Goal",
//!         "detail": "Normal Goal"
//!     }]
//! }))
//! .unwrap();
//!
//! let mut store = MemoryStore::new();
//! let mut ids = SequentialIds::new("row");
//!
//! let first = store.sync(&feed, &mut ids, SyncOptions::default());
//! assert!(first.success);
//! assert_eq!(store.events(1035037).len(), 1);
//!
//! // Polling the same feed again changes nothing
//! let second = store.sync(&feed, &mut ids, SyncOptions::default());
//! assert_eq!(second.totals.total(), 0);
//! ```

pub mod error;
pub mod event;
pub mod feed;
pub mod identity;
pub mod ids;
pub mod memory;
pub mod normalize;
pub mod options;
pub mod participant;
pub mod pipeline;
pub mod reconcile;
pub mod record;
pub mod statistics;

// Re-export main types at crate root
pub use error::Error;
pub use event::{DomainEvent, EventKind};
pub use feed::MatchFeed;
pub use identity::IdentityKey;
pub use ids::{IdGenerator, SequentialIds};
pub use memory::{MemoryStore, MemoryTransaction};
pub use normalize::{EventNormalizer, NormalizedEvents};
pub use options::SyncOptions;
pub use participant::{
    ParticipantMap, ParticipantRecord, ParticipantRole, ParticipantSources, TeamSheet, TeamSheets,
};
pub use pipeline::{ExistingState, Stage, StageReport, SyncPipeline, SyncResult, UnitOfWork};
pub use reconcile::{
    ChangeCounts, ChangeSet, Keyed, Reconciliation, ReconciliationPlanner, UpdatePolicy,
};
pub use record::{
    EventAttrs, FixtureAttrs, ParticipantAttrs, PersistedEvent, PersistedFixture,
    PersistedParticipant, PersistedPlayerStat, PersistedTeam, PersistedTeamStat, PlayerLineStats,
    PlayerStatAttrs, Stored, TeamAttrs, TeamStatAttrs,
};

/// Type aliases for clarity
pub type FixtureId = i64;
pub type TeamId = i64;
pub type SurrogateId = String;
pub type SlotIndex = u32;
