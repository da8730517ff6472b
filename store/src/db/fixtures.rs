//! Database operations for the fixtures and teams tables.

use chrono::{DateTime, Utc};
use matchsync_engine::{FixtureAttrs, FixtureId, PersistedFixture, PersistedTeam, Stored, TeamAttrs, TeamId};
use sqlx::{PgConnection, PgPool, Row};

/// A stored fixture row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRow {
    pub id: String,
    pub external_id: i64,
    pub home_team_id: i64,
    pub away_team_id: i64,
    pub kickoff: i64,
    pub status: String,
    pub elapsed: Option<i32>,
    pub home_goals: Option<i32>,
    pub away_goals: Option<i32>,
    pub venue: Option<String>,
    pub referee: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for FixtureRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(FixtureRow {
            id: row.try_get("id")?,
            external_id: row.try_get("external_id")?,
            home_team_id: row.try_get("home_team_id")?,
            away_team_id: row.try_get("away_team_id")?,
            kickoff: row.try_get("kickoff")?,
            status: row.try_get("status")?,
            elapsed: row.try_get("elapsed")?,
            home_goals: row.try_get("home_goals")?,
            away_goals: row.try_get("away_goals")?,
            venue: row.try_get("venue")?,
            referee: row.try_get("referee")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl FixtureRow {
    /// Convert database row to an engine fixture.
    pub fn to_stored(&self) -> PersistedFixture {
        Stored::new(
            self.id.clone(),
            FixtureAttrs {
                external_id: self.external_id,
                home_team_id: self.home_team_id,
                away_team_id: self.away_team_id,
                kickoff: self.kickoff,
                status: self.status.clone(),
                elapsed: self.elapsed.map(|v| v as u32),
                home_goals: self.home_goals.map(|v| v as u32),
                away_goals: self.away_goals.map(|v| v as u32),
                venue: self.venue.clone(),
                referee: self.referee.clone(),
            },
        )
    }
}

/// A stored team row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamRow {
    pub id: String,
    pub external_id: i64,
    pub name: String,
    pub logo: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for TeamRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(TeamRow {
            id: row.try_get("id")?,
            external_id: row.try_get("external_id")?,
            name: row.try_get("name")?,
            logo: row.try_get("logo")?,
        })
    }
}

impl TeamRow {
    pub fn to_stored(&self) -> PersistedTeam {
        Stored::new(
            self.id.clone(),
            TeamAttrs {
                external_id: self.external_id,
                name: self.name.clone(),
                logo: self.logo.clone(),
            },
        )
    }
}

/// Get the fixture with a provider id.
pub async fn get_fixture(
    pool: &PgPool,
    fixture: FixtureId,
) -> Result<Option<FixtureRow>, sqlx::Error> {
    sqlx::query_as::<_, FixtureRow>(
        r#"
        SELECT id, external_id, home_team_id, away_team_id, kickoff, status,
               elapsed, home_goals, away_goals, venue, referee, updated_at
        FROM fixtures
        WHERE external_id = $1
        ORDER BY id
        LIMIT 1
        "#,
    )
    .bind(fixture)
    .fetch_optional(pool)
    .await
}

/// Get the team rows for a set of provider ids.
pub async fn get_teams(pool: &PgPool, teams: &[TeamId]) -> Result<Vec<TeamRow>, sqlx::Error> {
    sqlx::query_as::<_, TeamRow>(
        r#"
        SELECT id, external_id, name, logo
        FROM teams
        WHERE external_id = ANY($1)
        "#,
    )
    .bind(teams)
    .fetch_all(pool)
    .await
}

/// Insert a fixture row.
pub async fn insert_fixture(
    conn: &mut PgConnection,
    fixture: &PersistedFixture,
) -> Result<(), sqlx::Error> {
    let attrs = &fixture.attrs;
    sqlx::query(
        r#"
        INSERT INTO fixtures (
            id, external_id, home_team_id, away_team_id, kickoff, status,
            elapsed, home_goals, away_goals, venue, referee
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&fixture.id)
    .bind(attrs.external_id)
    .bind(attrs.home_team_id)
    .bind(attrs.away_team_id)
    .bind(attrs.kickoff)
    .bind(&attrs.status)
    .bind(attrs.elapsed.map(|v| v as i32))
    .bind(attrs.home_goals.map(|v| v as i32))
    .bind(attrs.away_goals.map(|v| v as i32))
    .bind(&attrs.venue)
    .bind(&attrs.referee)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update a fixture row in place.
pub async fn update_fixture(
    conn: &mut PgConnection,
    fixture: &PersistedFixture,
) -> Result<(), sqlx::Error> {
    let attrs = &fixture.attrs;
    sqlx::query(
        r#"
        UPDATE fixtures SET
            external_id = $2,
            home_team_id = $3,
            away_team_id = $4,
            kickoff = $5,
            status = $6,
            elapsed = $7,
            home_goals = $8,
            away_goals = $9,
            venue = $10,
            referee = $11,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(&fixture.id)
    .bind(attrs.external_id)
    .bind(attrs.home_team_id)
    .bind(attrs.away_team_id)
    .bind(attrs.kickoff)
    .bind(&attrs.status)
    .bind(attrs.elapsed.map(|v| v as i32))
    .bind(attrs.home_goals.map(|v| v as i32))
    .bind(attrs.away_goals.map(|v| v as i32))
    .bind(&attrs.venue)
    .bind(&attrs.referee)
    .execute(conn)
    .await?;

    Ok(())
}

/// Insert a team row.
pub async fn insert_team(conn: &mut PgConnection, team: &PersistedTeam) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO teams (id, external_id, name, logo) VALUES ($1, $2, $3, $4)")
        .bind(&team.id)
        .bind(team.attrs.external_id)
        .bind(&team.attrs.name)
        .bind(&team.attrs.logo)
        .execute(conn)
        .await?;

    Ok(())
}

/// Update a team row in place.
pub async fn update_team(conn: &mut PgConnection, team: &PersistedTeam) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE teams SET external_id = $2, name = $3, logo = $4, updated_at = NOW() WHERE id = $1",
    )
    .bind(&team.id)
    .bind(team.attrs.external_id)
    .bind(&team.attrs.name)
    .bind(&team.attrs.logo)
    .execute(conn)
    .await?;

    Ok(())
}
