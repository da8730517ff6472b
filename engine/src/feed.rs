//! Provider feed record for one fixture.
//!
//! These types mirror the provider's JSON payload. Every person reference in
//! the feed is an optional numeric id plus an optional display name; neither
//! is guaranteed. Nothing here is normalized - see [`crate::normalize`] and
//! [`crate::participant`] for that.

use crate::{error::Result, Error, FixtureId, IdentityKey, TeamId};
use serde::{Deserialize, Serialize};

/// One poll of the live feed for a single fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFeed {
    pub fixture: FixtureInfo,
    pub teams: Teams,
    #[serde(default)]
    pub goals: Goals,
    #[serde(default)]
    pub lineups: Vec<Lineup>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
    /// Per-team aggregate statistics
    #[serde(default)]
    pub statistics: Vec<TeamStatistics>,
    /// Per-team per-player statistics
    #[serde(default)]
    pub players: Vec<TeamPlayers>,
}

impl MatchFeed {
    /// Decode a feed payload.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| Error::InvalidFeed(e.to_string()))
    }

    /// Decode a feed from an already parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::InvalidFeed(e.to_string()))
    }

    /// The other team of this fixture, if `team_id` plays in it.
    pub fn opponent_of(&self, team_id: TeamId) -> Option<TeamId> {
        if team_id == self.teams.home.id {
            Some(self.teams.away.id)
        } else if team_id == self.teams.away.id {
            Some(self.teams.home.id)
        } else {
            None
        }
    }

    /// Whether `team_id` is one of the two sides of this fixture.
    pub fn plays(&self, team_id: TeamId) -> bool {
        self.opponent_of(team_id).is_some()
    }
}

/// Fixture identity and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureInfo {
    pub id: FixtureId,
    /// Kickoff, seconds since epoch
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub referee: Option<String>,
    #[serde(default)]
    pub venue: Option<Venue>,
    #[serde(default)]
    pub status: FixtureStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Match status as reported by the provider ("NS", "1H", "HT", "FT", ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureStatus {
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub elapsed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teams {
    pub home: TeamRef,
    pub away: TeamRef,
}

/// A team reference. Teams always carry a provider id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    pub id: TeamId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goals {
    #[serde(default)]
    pub home: Option<u32>,
    #[serde(default)]
    pub away: Option<u32>,
}

/// A person reference: id, name, or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
}

impl PersonRef {
    /// Identity key for this reference, `None` when it names nobody.
    pub fn key(&self) -> Option<IdentityKey> {
        IdentityKey::from_parts(self.id, self.name.as_deref())
    }

    /// Display name, empty when absent.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }
}

/// Declared lineup for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineup {
    pub team: TeamRef,
    #[serde(default)]
    pub coach: Option<PersonRef>,
    #[serde(default)]
    pub formation: Option<String>,
    #[serde(rename = "startXI", default)]
    pub start_xi: Vec<LineupSlot>,
    #[serde(default)]
    pub substitutes: Vec<LineupSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupSlot {
    pub player: LineupPlayer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineupPlayer {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub pos: Option<String>,
    #[serde(default)]
    pub grid: Option<String>,
}

impl LineupPlayer {
    pub fn key(&self) -> Option<IdentityKey> {
        IdentityKey::from_parts(self.id, self.name.as_deref())
    }
}

/// A raw event as listed by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub time: EventTime,
    #[serde(default)]
    pub team: Option<TeamRef>,
    #[serde(default)]
    pub player: PersonRef,
    #[serde(default)]
    pub assist: PersonRef,
    /// Provider event type: "Goal", "Card", "subst", "Var", ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub comments: Option<String>,
    /// Position the provider assigned to this event, when it sends one
    #[serde(default)]
    pub sequence: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub elapsed: u32,
    #[serde(default)]
    pub extra: Option<u32>,
}

/// Aggregate statistics for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatistics {
    pub team: TeamRef,
    #[serde(default)]
    pub statistics: Vec<StatEntry>,
}

/// A string-keyed statistic. Values arrive as numbers, strings ("54%") or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatEntry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl StatEntry {
    /// Textual form of the value, `None` for null.
    pub fn value_text(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

/// Player statistics for one team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPlayers {
    pub team: TeamRef,
    #[serde(default)]
    pub players: Vec<PlayerLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLine {
    pub player: PersonRef,
    /// The provider wraps the performance in a single-element list
    #[serde(default)]
    pub statistics: Vec<PlayerPerformance>,
}

impl PlayerLine {
    pub fn performance(&self) -> Option<&PlayerPerformance> {
        self.statistics.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerPerformance {
    pub games: Games,
    pub goals: GoalStats,
    pub shots: Shots,
    pub passes: Passes,
    pub tackles: Tackles,
    pub duels: Duels,
    pub dribbles: Dribbles,
    pub fouls: Fouls,
    pub cards: Cards,
    pub penalty: Penalty,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Games {
    pub minutes: Option<u32>,
    pub number: Option<u32>,
    pub position: Option<String>,
    pub rating: Option<String>,
    pub captain: bool,
    pub substitute: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalStats {
    pub total: Option<u32>,
    pub conceded: Option<u32>,
    pub assists: Option<u32>,
    pub saves: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shots {
    pub total: Option<u32>,
    pub on: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Passes {
    pub total: Option<u32>,
    pub key: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tackles {
    pub total: Option<u32>,
    pub blocks: Option<u32>,
    pub interceptions: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Duels {
    pub total: Option<u32>,
    pub won: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dribbles {
    pub attempts: Option<u32>,
    pub success: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fouls {
    pub drawn: Option<u32>,
    pub committed: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cards {
    pub yellow: u32,
    pub red: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Penalty {
    pub scored: Option<u32>,
    pub missed: Option<u32>,
    pub saved: Option<u32>,
}
