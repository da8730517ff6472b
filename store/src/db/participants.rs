//! Database operations for the participants table.
//!
//! An identity key is stored as two nullable columns, exactly one of which is
//! set: `key_external_id` for provider ids and `key_name` for name fallbacks.

use matchsync_engine::{
    Error, FixtureId, IdentityKey, ParticipantAttrs, ParticipantRole, PersistedParticipant, Stored,
};
use sqlx::{PgConnection, PgPool, Row};

/// A stored participant row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantRow {
    pub id: String,
    pub fixture_id: i64,
    pub key_external_id: Option<i64>,
    pub key_name: Option<String>,
    pub name: String,
    pub number: Option<i32>,
    pub position: Option<String>,
    pub grid: Option<String>,
    pub role: String,
    pub is_bench: bool,
    pub is_feed_only: bool,
    pub team_id: Option<i64>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ParticipantRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ParticipantRow {
            id: row.try_get("id")?,
            fixture_id: row.try_get("fixture_id")?,
            key_external_id: row.try_get("key_external_id")?,
            key_name: row.try_get("key_name")?,
            name: row.try_get("name")?,
            number: row.try_get("number")?,
            position: row.try_get("position")?,
            grid: row.try_get("grid")?,
            role: row.try_get("role")?,
            is_bench: row.try_get("is_bench")?,
            is_feed_only: row.try_get("is_feed_only")?,
            team_id: row.try_get("team_id")?,
        })
    }
}

impl ParticipantRow {
    /// Convert database row to an engine participant.
    pub fn to_stored(&self) -> Result<PersistedParticipant, Error> {
        let key = match (self.key_external_id, self.key_name.as_deref()) {
            (Some(id), None) => IdentityKey::ExternalId(id),
            (None, Some(name)) => IdentityKey::NameFallback(name.to_string()),
            _ => {
                return Err(Error::Persistence(format!(
                    "participant {} must have exactly one identity column",
                    self.id
                )))
            }
        };

        Ok(Stored::new(
            self.id.clone(),
            ParticipantAttrs {
                key,
                name: self.name.clone(),
                number: self.number.map(|v| v as u32),
                position: self.position.clone(),
                grid: self.grid.clone(),
                role: ParticipantRole::from_stored(&self.role),
                is_bench: self.is_bench,
                is_feed_only: self.is_feed_only,
                team_id: self.team_id,
            },
        ))
    }
}

/// Split an identity key into its (external id, name) columns.
pub fn key_columns(key: &IdentityKey) -> (Option<i64>, Option<&str>) {
    match key {
        IdentityKey::ExternalId(id) => (Some(*id), None),
        IdentityKey::NameFallback(name) => (None, Some(name.as_str())),
    }
}

/// Get all participant rows of a fixture.
pub async fn get_participants(
    pool: &PgPool,
    fixture: FixtureId,
) -> Result<Vec<ParticipantRow>, sqlx::Error> {
    sqlx::query_as::<_, ParticipantRow>(
        r#"
        SELECT id, fixture_id, key_external_id, key_name, name, number, position,
               grid, role, is_bench, is_feed_only, team_id
        FROM participants
        WHERE fixture_id = $1
        "#,
    )
    .bind(fixture)
    .fetch_all(pool)
    .await
}

/// Insert a participant row.
pub async fn insert_participant(
    conn: &mut PgConnection,
    fixture: FixtureId,
    participant: &PersistedParticipant,
) -> Result<(), sqlx::Error> {
    let attrs = &participant.attrs;
    let (key_external_id, key_name) = key_columns(&attrs.key);
    sqlx::query(
        r#"
        INSERT INTO participants (
            id, fixture_id, key_external_id, key_name, name, number, position,
            grid, role, is_bench, is_feed_only, team_id
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        "#,
    )
    .bind(&participant.id)
    .bind(fixture)
    .bind(key_external_id)
    .bind(key_name)
    .bind(&attrs.name)
    .bind(attrs.number.map(|v| v as i32))
    .bind(&attrs.position)
    .bind(&attrs.grid)
    .bind(attrs.role.as_str())
    .bind(attrs.is_bench)
    .bind(attrs.is_feed_only)
    .bind(attrs.team_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update a participant row in place.
pub async fn update_participant(
    conn: &mut PgConnection,
    participant: &PersistedParticipant,
) -> Result<(), sqlx::Error> {
    let attrs = &participant.attrs;
    let (key_external_id, key_name) = key_columns(&attrs.key);
    sqlx::query(
        r#"
        UPDATE participants SET
            key_external_id = $2,
            key_name = $3,
            name = $4,
            number = $5,
            position = $6,
            grid = $7,
            role = $8,
            is_bench = $9,
            is_feed_only = $10,
            team_id = $11,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(&participant.id)
    .bind(key_external_id)
    .bind(key_name)
    .bind(&attrs.name)
    .bind(attrs.number.map(|v| v as i32))
    .bind(&attrs.position)
    .bind(&attrs.grid)
    .bind(attrs.role.as_str())
    .bind(attrs.is_bench)
    .bind(attrs.is_feed_only)
    .bind(attrs.team_id)
    .execute(conn)
    .await?;

    Ok(())
}
