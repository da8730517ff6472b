//! Database operations for the participant_statistics and team_statistics
//! tables. Per-player numbers are kept as one JSONB document per row.

use matchsync_engine::{
    Error, FixtureId, PersistedPlayerStat, PersistedTeamStat, PlayerLineStats, PlayerStatAttrs,
    Stored, TeamStatAttrs,
};
use sqlx::{PgConnection, PgPool, Row};

/// A stored participant statistics row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatRow {
    pub id: String,
    pub fixture_id: i64,
    pub participant_id: String,
    pub team_id: i64,
    pub stats: serde_json::Value,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for PlayerStatRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(PlayerStatRow {
            id: row.try_get("id")?,
            fixture_id: row.try_get("fixture_id")?,
            participant_id: row.try_get("participant_id")?,
            team_id: row.try_get("team_id")?,
            stats: row.try_get("stats")?,
        })
    }
}

impl PlayerStatRow {
    pub fn to_stored(&self) -> Result<PersistedPlayerStat, Error> {
        let stats: PlayerLineStats = serde_json::from_value(self.stats.clone()).map_err(|e| {
            Error::Persistence(format!("statistics row {} is unreadable: {}", self.id, e))
        })?;

        Ok(Stored::new(
            self.id.clone(),
            PlayerStatAttrs {
                participant_id: self.participant_id.clone(),
                team_id: self.team_id,
                stats,
            },
        ))
    }
}

/// A stored team statistic row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStatRow {
    pub id: String,
    pub fixture_id: i64,
    pub team_id: i64,
    pub kind: String,
    pub value: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for TeamStatRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(TeamStatRow {
            id: row.try_get("id")?,
            fixture_id: row.try_get("fixture_id")?,
            team_id: row.try_get("team_id")?,
            kind: row.try_get("kind")?,
            value: row.try_get("value")?,
        })
    }
}

impl TeamStatRow {
    pub fn to_stored(&self) -> PersistedTeamStat {
        Stored::new(
            self.id.clone(),
            TeamStatAttrs {
                team_id: self.team_id,
                kind: self.kind.clone(),
                value: self.value.clone(),
            },
        )
    }
}

fn stats_document(stat: &PersistedPlayerStat) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(&stat.attrs.stats).map_err(|e| sqlx::Error::Encode(Box::new(e)))
}

pub async fn get_player_stats(
    pool: &PgPool,
    fixture: FixtureId,
) -> Result<Vec<PlayerStatRow>, sqlx::Error> {
    sqlx::query_as::<_, PlayerStatRow>(
        r#"
        SELECT id, fixture_id, participant_id, team_id, stats
        FROM participant_statistics
        WHERE fixture_id = $1
        "#,
    )
    .bind(fixture)
    .fetch_all(pool)
    .await
}

pub async fn get_team_stats(
    pool: &PgPool,
    fixture: FixtureId,
) -> Result<Vec<TeamStatRow>, sqlx::Error> {
    sqlx::query_as::<_, TeamStatRow>(
        r#"
        SELECT id, fixture_id, team_id, kind, value
        FROM team_statistics
        WHERE fixture_id = $1
        "#,
    )
    .bind(fixture)
    .fetch_all(pool)
    .await
}

pub async fn insert_player_stat(
    conn: &mut PgConnection,
    fixture: FixtureId,
    stat: &PersistedPlayerStat,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO participant_statistics (id, fixture_id, participant_id, team_id, stats)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&stat.id)
    .bind(fixture)
    .bind(&stat.attrs.participant_id)
    .bind(stat.attrs.team_id)
    .bind(stats_document(stat)?)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn update_player_stat(
    conn: &mut PgConnection,
    stat: &PersistedPlayerStat,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE participant_statistics SET
            participant_id = $2,
            team_id = $3,
            stats = $4,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(&stat.id)
    .bind(&stat.attrs.participant_id)
    .bind(stat.attrs.team_id)
    .bind(stats_document(stat)?)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn insert_team_stat(
    conn: &mut PgConnection,
    fixture: FixtureId,
    stat: &PersistedTeamStat,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO team_statistics (id, fixture_id, team_id, kind, value)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&stat.id)
    .bind(fixture)
    .bind(stat.attrs.team_id)
    .bind(&stat.attrs.kind)
    .bind(&stat.attrs.value)
    .execute(conn)
    .await?;

    Ok(())
}

pub async fn update_team_stat(
    conn: &mut PgConnection,
    stat: &PersistedTeamStat,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE team_statistics SET team_id = $2, kind = $3, value = $4, updated_at = NOW() WHERE id = $1",
    )
    .bind(&stat.id)
    .bind(stat.attrs.team_id)
    .bind(&stat.attrs.kind)
    .bind(&stat.attrs.value)
    .execute(conn)
    .await?;

    Ok(())
}
