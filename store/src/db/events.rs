//! Database operations for the events table.

use matchsync_engine::{Error, EventAttrs, FixtureId, PersistedEvent, Stored};
use sqlx::{PgConnection, PgPool, Row};

/// A stored event row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub id: String,
    pub fixture_id: i64,
    pub slot: i32,
    pub minute: i32,
    pub extra_minute: Option<i32>,
    pub kind: String,
    pub detail: String,
    pub team_id: Option<i64>,
    pub participant_id: Option<String>,
    pub assist_id: Option<String>,
    pub comment: Option<String>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for EventRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(EventRow {
            id: row.try_get("id")?,
            fixture_id: row.try_get("fixture_id")?,
            slot: row.try_get("slot")?,
            minute: row.try_get("minute")?,
            extra_minute: row.try_get("extra_minute")?,
            kind: row.try_get("kind")?,
            detail: row.try_get("detail")?,
            team_id: row.try_get("team_id")?,
            participant_id: row.try_get("participant_id")?,
            assist_id: row.try_get("assist_id")?,
            comment: row.try_get("comment")?,
        })
    }
}

impl EventRow {
    /// Convert database row to an engine event. Fails on an unknown kind.
    pub fn to_stored(&self) -> Result<PersistedEvent, Error> {
        Ok(Stored::new(
            self.id.clone(),
            EventAttrs {
                slot: self.slot as u32,
                minute: self.minute as u32,
                extra_minute: self.extra_minute.map(|v| v as u32),
                kind: self.kind.parse()?,
                detail: self.detail.clone(),
                team_id: self.team_id,
                participant_id: self.participant_id.clone(),
                assist_id: self.assist_id.clone(),
                comment: self.comment.clone(),
            },
        ))
    }
}

/// Get all event rows of a fixture, in slot order.
pub async fn get_events(pool: &PgPool, fixture: FixtureId) -> Result<Vec<EventRow>, sqlx::Error> {
    sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, fixture_id, slot, minute, extra_minute, kind, detail,
               team_id, participant_id, assist_id, comment
        FROM events
        WHERE fixture_id = $1
        ORDER BY slot, id
        "#,
    )
    .bind(fixture)
    .fetch_all(pool)
    .await
}

/// Insert an event row.
pub async fn insert_event(
    conn: &mut PgConnection,
    fixture: FixtureId,
    event: &PersistedEvent,
) -> Result<(), sqlx::Error> {
    let attrs = &event.attrs;
    sqlx::query(
        r#"
        INSERT INTO events (
            id, fixture_id, slot, minute, extra_minute, kind, detail,
            team_id, participant_id, assist_id, comment
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&event.id)
    .bind(fixture)
    .bind(attrs.slot as i32)
    .bind(attrs.minute as i32)
    .bind(attrs.extra_minute.map(|v| v as i32))
    .bind(attrs.kind.as_str())
    .bind(&attrs.detail)
    .bind(attrs.team_id)
    .bind(&attrs.participant_id)
    .bind(&attrs.assist_id)
    .bind(&attrs.comment)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update an event row in place.
pub async fn update_event(conn: &mut PgConnection, event: &PersistedEvent) -> Result<(), sqlx::Error> {
    let attrs = &event.attrs;
    sqlx::query(
        r#"
        UPDATE events SET
            slot = $2,
            minute = $3,
            extra_minute = $4,
            kind = $5,
            detail = $6,
            team_id = $7,
            participant_id = $8,
            assist_id = $9,
            comment = $10,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(&event.id)
    .bind(attrs.slot as i32)
    .bind(attrs.minute as i32)
    .bind(attrs.extra_minute.map(|v| v as i32))
    .bind(attrs.kind.as_str())
    .bind(&attrs.detail)
    .bind(attrs.team_id)
    .bind(&attrs.participant_id)
    .bind(&attrs.assist_id)
    .bind(&attrs.comment)
    .execute(conn)
    .await?;

    Ok(())
}
