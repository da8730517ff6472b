//! In-memory persistence.
//!
//! [`MemoryStore`] keeps every table as a BTreeMap arena keyed by surrogate
//! id, so iteration order is deterministic. Writes go through a
//! [`MemoryTransaction`], which stages changes on a copy of the store and
//! publishes them on [`MemoryTransaction::commit`]; a dropped transaction
//! leaves the store untouched.

use crate::error::Result;
use crate::feed::MatchFeed;
use crate::ids::IdGenerator;
use crate::pipeline::{ExistingState, SyncPipeline, SyncResult, UnitOfWork};
use crate::reconcile::ChangeSet;
use crate::record::{
    EventAttrs, FixtureAttrs, ParticipantAttrs, PersistedEvent, PersistedFixture,
    PersistedParticipant, PersistedPlayerStat, PersistedTeam, PersistedTeamStat, PlayerStatAttrs,
    Stored, TeamAttrs, TeamStatAttrs,
};
use crate::{Error, FixtureId, SurrogateId, SyncOptions, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

type Arena<A> = BTreeMap<SurrogateId, A>;
type FixtureArena<A> = BTreeMap<FixtureId, Arena<A>>;

/// All rows of every fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStore {
    fixtures: Arena<FixtureAttrs>,
    teams: Arena<TeamAttrs>,
    participants: FixtureArena<ParticipantAttrs>,
    events: FixtureArena<EventAttrs>,
    player_stats: FixtureArena<PlayerStatAttrs>,
    team_stats: FixtureArena<TeamStatAttrs>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted state of a fixture and of the given teams.
    pub fn load_existing(&self, fixture: FixtureId, teams: &[TeamId]) -> ExistingState {
        ExistingState {
            fixture: self.fixture(fixture),
            teams: self
                .teams
                .iter()
                .filter(|(_, attrs)| teams.contains(&attrs.external_id))
                .map(|(id, attrs)| Stored::new(id.clone(), attrs.clone()))
                .collect(),
            participants: rows(&self.participants, fixture),
            events: rows(&self.events, fixture),
            player_stats: rows(&self.player_stats, fixture),
            team_stats: rows(&self.team_stats, fixture),
        }
    }

    /// Start a unit of work.
    pub fn begin(&mut self) -> MemoryTransaction<'_> {
        let staged = self.clone();
        MemoryTransaction {
            store: self,
            staged,
        }
    }

    /// Load, reconcile and commit one feed. Nothing is written unless the
    /// pipeline succeeds.
    pub fn sync(
        &mut self,
        feed: &MatchFeed,
        ids: &mut dyn IdGenerator,
        options: SyncOptions,
    ) -> SyncResult {
        let existing = self.load_existing(feed.fixture.id, &[feed.teams.home.id, feed.teams.away.id]);
        let mut tx = self.begin();
        let result = SyncPipeline::new(feed, ids)
            .with_options(options)
            .run(existing, &mut tx);

        if result.success {
            tx.commit();
            info!(
                fixture = result.fixture_id,
                created = result.totals.created,
                updated = result.totals.updated,
                deleted = result.totals.deleted,
                "fixture synced"
            );
        }
        result
    }

    pub fn fixture(&self, fixture: FixtureId) -> Option<PersistedFixture> {
        self.fixtures
            .iter()
            .find(|(_, attrs)| attrs.external_id == fixture)
            .map(|(id, attrs)| Stored::new(id.clone(), attrs.clone()))
    }

    pub fn team(&self, team: TeamId) -> Option<PersistedTeam> {
        self.teams
            .iter()
            .find(|(_, attrs)| attrs.external_id == team)
            .map(|(id, attrs)| Stored::new(id.clone(), attrs.clone()))
    }

    pub fn participants(&self, fixture: FixtureId) -> Vec<PersistedParticipant> {
        rows(&self.participants, fixture)
    }

    /// Events of a fixture in slot order.
    pub fn events(&self, fixture: FixtureId) -> Vec<PersistedEvent> {
        let mut events = rows(&self.events, fixture);
        events.sort_by_key(|e| e.attrs.slot);
        events
    }

    pub fn player_stats(&self, fixture: FixtureId) -> Vec<PersistedPlayerStat> {
        rows(&self.player_stats, fixture)
    }

    pub fn team_stats(&self, fixture: FixtureId) -> Vec<PersistedTeamStat> {
        rows(&self.team_stats, fixture)
    }
}

fn rows<A: Clone>(arena: &FixtureArena<A>, fixture: FixtureId) -> Vec<Stored<A>> {
    arena
        .get(&fixture)
        .map(|rows| {
            rows.iter()
                .map(|(id, attrs)| Stored::new(id.clone(), attrs.clone()))
                .collect()
        })
        .unwrap_or_default()
}

/// Apply one change set to an arena, all or nothing.
fn apply<A: Clone>(arena: &mut Arena<A>, changes: &ChangeSet<Stored<A>>) -> Result<()> {
    for row in &changes.to_update {
        if !arena.contains_key(&row.id) {
            return Err(Error::Persistence(format!("update of missing row {}", row.id)));
        }
    }
    for row in &changes.to_create {
        let replaced = changes.to_delete.iter().any(|d| d.id == row.id);
        if arena.contains_key(&row.id) && !replaced {
            return Err(Error::DuplicateSurrogateId(row.id.clone()));
        }
    }

    for row in &changes.to_delete {
        arena.remove(&row.id);
    }
    for row in changes.to_update.iter().chain(&changes.to_create) {
        arena.insert(row.id.clone(), row.attrs.clone());
    }
    Ok(())
}

/// Staged writes against a [`MemoryStore`].
pub struct MemoryTransaction<'s> {
    store: &'s mut MemoryStore,
    staged: MemoryStore,
}

impl MemoryTransaction<'_> {
    /// Publish every staged change.
    pub fn commit(self) {
        *self.store = self.staged;
    }
}

impl UnitOfWork for MemoryTransaction<'_> {
    fn apply_fixture(&mut self, changes: &ChangeSet<PersistedFixture>) -> Result<()> {
        apply(&mut self.staged.fixtures, changes)
    }

    fn apply_teams(&mut self, changes: &ChangeSet<PersistedTeam>) -> Result<()> {
        apply(&mut self.staged.teams, changes)
    }

    fn apply_participants(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedParticipant>,
    ) -> Result<()> {
        apply(self.staged.participants.entry(fixture).or_default(), changes)
    }

    fn apply_events(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedEvent>,
    ) -> Result<()> {
        apply(self.staged.events.entry(fixture).or_default(), changes)
    }

    fn apply_player_statistics(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedPlayerStat>,
    ) -> Result<()> {
        apply(self.staged.player_stats.entry(fixture).or_default(), changes)
    }

    fn apply_team_statistics(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedTeamStat>,
    ) -> Result<()> {
        apply(self.staged.team_stats.entry(fixture).or_default(), changes)
    }
}
