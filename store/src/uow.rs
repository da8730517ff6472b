//! PostgreSQL unit of work.
//!
//! The pipeline runs synchronously, so [`PgUnitOfWork`] only stages the
//! change sets it is handed. [`PgUnitOfWork::commit`] then writes them in one
//! transaction, in stage order; within each table deletes run before updates
//! and updates before creates.

use crate::db::{self, Pool, Table};
use crate::error::Result;
use matchsync_engine::error::Result as EngineResult;
use matchsync_engine::{
    ChangeCounts, ChangeSet, FixtureId, PersistedEvent, PersistedFixture, PersistedParticipant,
    PersistedPlayerStat, PersistedTeam, PersistedTeamStat, Stored, UnitOfWork,
};
use sqlx::PgConnection;
use tracing::debug;

/// Change sets staged for one fixture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PgUnitOfWork {
    fixture_id: Option<FixtureId>,
    fixtures: ChangeSet<PersistedFixture>,
    teams: ChangeSet<PersistedTeam>,
    participants: ChangeSet<PersistedParticipant>,
    events: ChangeSet<PersistedEvent>,
    player_stats: ChangeSet<PersistedPlayerStat>,
    team_stats: ChangeSet<PersistedTeamStat>,
}

impl PgUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total counts over everything staged.
    pub fn staged(&self) -> ChangeCounts {
        self.fixtures.counts()
            + self.teams.counts()
            + self.participants.counts()
            + self.events.counts()
            + self.player_stats.counts()
            + self.team_stats.counts()
    }

    pub fn is_empty(&self) -> bool {
        self.staged().total() == 0
    }

    /// Write every staged change set in a single transaction.
    pub async fn commit(self, pool: &Pool) -> Result<ChangeCounts> {
        let counts = self.staged();
        if counts.total() == 0 {
            return Ok(counts);
        }

        let mut tx = pool.begin().await?;
        self.write(&mut *tx).await?;
        tx.commit().await?;

        debug!(fixture = ?self.fixture_id, ?counts, "unit of work committed");
        Ok(counts)
    }

    async fn write(&self, conn: &mut PgConnection) -> Result<()> {
        db::delete_rows(conn, Table::Fixtures, &ids(&self.fixtures.to_delete)).await?;
        for row in &self.fixtures.to_update {
            db::update_fixture(conn, row).await?;
        }
        for row in &self.fixtures.to_create {
            db::insert_fixture(conn, row).await?;
        }

        db::delete_rows(conn, Table::Teams, &ids(&self.teams.to_delete)).await?;
        for row in &self.teams.to_update {
            db::update_team(conn, row).await?;
        }
        for row in &self.teams.to_create {
            db::insert_team(conn, row).await?;
        }

        let Some(fixture) = self.fixture_id else {
            return Ok(());
        };

        db::delete_rows(conn, Table::Participants, &ids(&self.participants.to_delete)).await?;
        for row in &self.participants.to_update {
            db::update_participant(conn, row).await?;
        }
        for row in &self.participants.to_create {
            db::insert_participant(conn, fixture, row).await?;
        }

        db::delete_rows(conn, Table::Events, &ids(&self.events.to_delete)).await?;
        for row in &self.events.to_update {
            db::update_event(conn, row).await?;
        }
        for row in &self.events.to_create {
            db::insert_event(conn, fixture, row).await?;
        }

        db::delete_rows(
            conn,
            Table::ParticipantStatistics,
            &ids(&self.player_stats.to_delete),
        )
        .await?;
        for row in &self.player_stats.to_update {
            db::update_player_stat(conn, row).await?;
        }
        for row in &self.player_stats.to_create {
            db::insert_player_stat(conn, fixture, row).await?;
        }

        db::delete_rows(conn, Table::TeamStatistics, &ids(&self.team_stats.to_delete)).await?;
        for row in &self.team_stats.to_update {
            db::update_team_stat(conn, row).await?;
        }
        for row in &self.team_stats.to_create {
            db::insert_team_stat(conn, fixture, row).await?;
        }

        Ok(())
    }

    /// Record the fixture the per-fixture stages write to. A unit of work
    /// covers exactly one fixture.
    fn bind_fixture(&mut self, fixture: FixtureId) -> EngineResult<()> {
        match self.fixture_id {
            Some(bound) if bound != fixture => Err(matchsync_engine::Error::FixtureMismatch {
                feed: fixture,
                persisted: bound,
            }),
            _ => {
                self.fixture_id = Some(fixture);
                Ok(())
            }
        }
    }
}

fn ids<A>(rows: &[Stored<A>]) -> Vec<String> {
    rows.iter().map(|row| row.id.clone()).collect()
}

/// Append `changes` to a staged change set.
fn stage<T: Clone>(staged: &mut ChangeSet<T>, changes: &ChangeSet<T>) {
    staged.to_create.extend(changes.to_create.iter().cloned());
    staged.to_update.extend(changes.to_update.iter().cloned());
    staged.to_delete.extend(changes.to_delete.iter().cloned());
}

impl UnitOfWork for PgUnitOfWork {
    fn apply_fixture(&mut self, changes: &ChangeSet<PersistedFixture>) -> EngineResult<()> {
        stage(&mut self.fixtures, changes);
        Ok(())
    }

    fn apply_teams(&mut self, changes: &ChangeSet<PersistedTeam>) -> EngineResult<()> {
        stage(&mut self.teams, changes);
        Ok(())
    }

    fn apply_participants(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedParticipant>,
    ) -> EngineResult<()> {
        self.bind_fixture(fixture)?;
        stage(&mut self.participants, changes);
        Ok(())
    }

    fn apply_events(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedEvent>,
    ) -> EngineResult<()> {
        self.bind_fixture(fixture)?;
        stage(&mut self.events, changes);
        Ok(())
    }

    fn apply_player_statistics(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedPlayerStat>,
    ) -> EngineResult<()> {
        self.bind_fixture(fixture)?;
        stage(&mut self.player_stats, changes);
        Ok(())
    }

    fn apply_team_statistics(
        &mut self,
        fixture: FixtureId,
        changes: &ChangeSet<PersistedTeamStat>,
    ) -> EngineResult<()> {
        self.bind_fixture(fixture)?;
        stage(&mut self.team_stats, changes);
        Ok(())
    }
}
