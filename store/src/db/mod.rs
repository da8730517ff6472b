//! Database module for PostgreSQL persistence.

mod events;
mod fixtures;
mod participants;
mod pool;
mod statistics;

pub use events::*;
pub use fixtures::*;
pub use participants::*;
pub use pool::*;
pub use statistics::*;

use matchsync_engine::{ExistingState, FixtureId, TeamId};
use sqlx::PgConnection;
use tracing::debug;

/// Tables written by a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Fixtures,
    Teams,
    Participants,
    Events,
    ParticipantStatistics,
    TeamStatistics,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Fixtures => "fixtures",
            Table::Teams => "teams",
            Table::Participants => "participants",
            Table::Events => "events",
            Table::ParticipantStatistics => "participant_statistics",
            Table::TeamStatistics => "team_statistics",
        }
    }
}

/// Delete rows by surrogate id.
pub async fn delete_rows(
    conn: &mut PgConnection,
    table: Table,
    ids: &[String],
) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let sql = format!("DELETE FROM {} WHERE id = ANY($1)", table.name());
    let result = sqlx::query(&sql).bind(ids).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Load everything persisted for a fixture and the given teams.
pub async fn load_existing(
    pool: &Pool,
    fixture: FixtureId,
    teams: &[TeamId],
) -> crate::Result<ExistingState> {
    let fixture_row = get_fixture(pool, fixture).await?;
    let team_rows = get_teams(pool, teams).await?;
    let participant_rows = get_participants(pool, fixture).await?;
    let event_rows = get_events(pool, fixture).await?;
    let player_stat_rows = get_player_stats(pool, fixture).await?;
    let team_stat_rows = get_team_stats(pool, fixture).await?;

    debug!(
        fixture,
        participants = participant_rows.len(),
        events = event_rows.len(),
        "existing state loaded"
    );

    Ok(ExistingState {
        fixture: fixture_row.as_ref().map(FixtureRow::to_stored),
        teams: team_rows.iter().map(TeamRow::to_stored).collect(),
        participants: participant_rows
            .iter()
            .map(ParticipantRow::to_stored)
            .collect::<Result<_, _>>()?,
        events: event_rows
            .iter()
            .map(EventRow::to_stored)
            .collect::<Result<_, _>>()?,
        player_stats: player_stat_rows
            .iter()
            .map(PlayerStatRow::to_stored)
            .collect::<Result<_, _>>()?,
        team_stats: team_stat_rows.iter().map(TeamStatRow::to_stored).collect(),
    })
}
