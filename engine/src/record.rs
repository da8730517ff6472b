//! Durable record types.
//!
//! Every persisted row is a [`Stored`] value: a surrogate id minted once by
//! the id generator plus the mutable attributes the planner diffs. Relations
//! between rows are plain foreign-key fields (team ids, participant surrogate
//! ids) resolved through lookup maps, never live references.

use crate::event::DomainEvent;
use crate::feed::{MatchFeed, PlayerPerformance};
use crate::participant::{ParticipantRecord, ParticipantRole};
use crate::reconcile::Keyed;
use crate::{EventKind, FixtureId, IdentityKey, SlotIndex, SurrogateId, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A persisted row: durable surrogate id plus mutable attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stored<A> {
    /// Minted on creation, never changed afterwards
    pub id: SurrogateId,
    pub attrs: A,
}

impl<A> Stored<A> {
    pub fn new(id: impl Into<SurrogateId>, attrs: A) -> Self {
        Self {
            id: id.into(),
            attrs,
        }
    }
}

pub type PersistedFixture = Stored<FixtureAttrs>;
pub type PersistedTeam = Stored<TeamAttrs>;
pub type PersistedParticipant = Stored<ParticipantAttrs>;
pub type PersistedEvent = Stored<EventAttrs>;
pub type PersistedPlayerStat = Stored<PlayerStatAttrs>;
pub type PersistedTeamStat = Stored<TeamStatAttrs>;

/// Fixture-level attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureAttrs {
    pub external_id: FixtureId,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    /// Kickoff, seconds since epoch
    pub kickoff: i64,
    pub status: String,
    pub elapsed: Option<u32>,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub venue: Option<String>,
    pub referee: Option<String>,
}

impl FixtureAttrs {
    pub fn from_feed(feed: &MatchFeed) -> Self {
        Self {
            external_id: feed.fixture.id,
            home_team_id: feed.teams.home.id,
            away_team_id: feed.teams.away.id,
            kickoff: feed.fixture.timestamp,
            status: feed.fixture.status.short.clone(),
            elapsed: feed.fixture.status.elapsed,
            home_goals: feed.goals.home,
            away_goals: feed.goals.away,
            venue: feed.fixture.venue.as_ref().and_then(|v| v.name.clone()),
            referee: feed.fixture.referee.clone(),
        }
    }
}

impl Keyed for FixtureAttrs {
    type Key = FixtureId;

    fn key(&self) -> FixtureId {
        self.external_id
    }
}

/// Team catalog attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamAttrs {
    pub external_id: TeamId,
    pub name: String,
    pub logo: Option<String>,
}

impl TeamAttrs {
    /// Both sides of a feed, home first.
    pub fn from_feed(feed: &MatchFeed) -> Vec<Self> {
        [&feed.teams.home, &feed.teams.away]
            .into_iter()
            .map(|team| Self {
                external_id: team.id,
                name: team.name.clone(),
                logo: team.logo.clone(),
            })
            .collect()
    }
}

impl Keyed for TeamAttrs {
    type Key = TeamId;

    fn key(&self) -> TeamId {
        self.external_id
    }
}

/// Participant attributes, keyed by identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantAttrs {
    /// Last-known identity key
    pub key: IdentityKey,
    pub name: String,
    pub number: Option<u32>,
    pub position: Option<String>,
    pub grid: Option<String>,
    pub role: ParticipantRole,
    pub is_bench: bool,
    pub is_feed_only: bool,
    pub team_id: Option<TeamId>,
}

impl From<ParticipantRecord> for ParticipantAttrs {
    fn from(record: ParticipantRecord) -> Self {
        Self {
            key: record.key,
            name: record.name,
            number: record.number,
            position: record.position,
            grid: record.grid,
            role: record.role,
            is_bench: record.is_bench,
            is_feed_only: record.is_feed_only,
            team_id: record.team_id,
        }
    }
}

impl Keyed for ParticipantAttrs {
    type Key = IdentityKey;

    fn key(&self) -> IdentityKey {
        self.key.clone()
    }
}

/// Event attributes, keyed by slot within the fixture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttrs {
    pub slot: SlotIndex,
    pub minute: u32,
    pub extra_minute: Option<u32>,
    pub kind: EventKind,
    pub detail: String,
    pub team_id: Option<TeamId>,
    pub participant_id: Option<SurrogateId>,
    pub assist_id: Option<SurrogateId>,
    pub comment: Option<String>,
}

impl EventAttrs {
    /// Resolve an event's identity keys against the participants' surrogate
    /// ids. Keys that do not resolve leave the reference empty.
    pub fn resolve(event: &DomainEvent, participants: &BTreeMap<IdentityKey, SurrogateId>) -> Self {
        let lookup = |key: &Option<IdentityKey>| {
            key.as_ref()
                .and_then(|k| participants.get(k))
                .cloned()
        };

        Self {
            slot: event.slot,
            minute: event.minute,
            extra_minute: event.extra_minute,
            kind: event.kind,
            detail: event.detail.clone(),
            team_id: event.team_id,
            participant_id: lookup(&event.participant),
            assist_id: lookup(&event.assist),
            comment: event.comment.clone(),
        }
    }
}

impl Keyed for EventAttrs {
    type Key = SlotIndex;

    fn key(&self) -> SlotIndex {
        self.slot
    }

    /// A slot holds the same event while its minute, kind, team and primary
    /// participant are unchanged.
    fn same_identity(&self, other: &Self) -> bool {
        self.minute == other.minute
            && self.extra_minute == other.extra_minute
            && self.kind == other.kind
            && self.team_id == other.team_id
            && self.participant_id == other.participant_id
    }
}

/// Flattened per-player performance numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerLineStats {
    pub minutes: Option<u32>,
    pub number: Option<u32>,
    pub position: Option<String>,
    pub rating: Option<String>,
    pub captain: bool,
    pub substitute: bool,
    pub goals: Option<u32>,
    pub assists: Option<u32>,
    pub conceded: Option<u32>,
    pub saves: Option<u32>,
    pub shots_total: Option<u32>,
    pub shots_on: Option<u32>,
    pub passes_total: Option<u32>,
    pub passes_key: Option<u32>,
    pub tackles: Option<u32>,
    pub blocks: Option<u32>,
    pub interceptions: Option<u32>,
    pub duels_total: Option<u32>,
    pub duels_won: Option<u32>,
    pub dribbles_attempts: Option<u32>,
    pub dribbles_success: Option<u32>,
    pub fouls_drawn: Option<u32>,
    pub fouls_committed: Option<u32>,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub penalties_scored: Option<u32>,
    pub penalties_missed: Option<u32>,
    pub penalties_saved: Option<u32>,
}

impl From<&PlayerPerformance> for PlayerLineStats {
    fn from(p: &PlayerPerformance) -> Self {
        Self {
            minutes: p.games.minutes,
            number: p.games.number,
            position: p.games.position.clone(),
            rating: p.games.rating.clone(),
            captain: p.games.captain,
            substitute: p.games.substitute,
            goals: p.goals.total,
            assists: p.goals.assists,
            conceded: p.goals.conceded,
            saves: p.goals.saves,
            shots_total: p.shots.total,
            shots_on: p.shots.on,
            passes_total: p.passes.total,
            passes_key: p.passes.key,
            tackles: p.tackles.total,
            blocks: p.tackles.blocks,
            interceptions: p.tackles.interceptions,
            duels_total: p.duels.total,
            duels_won: p.duels.won,
            dribbles_attempts: p.dribbles.attempts,
            dribbles_success: p.dribbles.success,
            fouls_drawn: p.fouls.drawn,
            fouls_committed: p.fouls.committed,
            yellow_cards: p.cards.yellow,
            red_cards: p.cards.red,
            penalties_scored: p.penalty.scored,
            penalties_missed: p.penalty.missed,
            penalties_saved: p.penalty.saved,
        }
    }
}

/// Per-participant statistics, keyed by the participant's surrogate id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatAttrs {
    pub participant_id: SurrogateId,
    pub team_id: TeamId,
    pub stats: PlayerLineStats,
}

impl Keyed for PlayerStatAttrs {
    type Key = SurrogateId;

    fn key(&self) -> SurrogateId {
        self.participant_id.clone()
    }
}

/// One string-keyed team statistic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatAttrs {
    pub team_id: TeamId,
    pub kind: String,
    pub value: Option<String>,
}

impl Keyed for TeamStatAttrs {
    type Key = (TeamId, String);

    fn key(&self) -> (TeamId, String) {
        (self.team_id, self.kind.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(slot: SlotIndex, minute: u32) -> DomainEvent {
        DomainEvent {
            slot,
            minute,
            extra_minute: None,
            kind: EventKind::Goal,
            detail: "Normal Goal".into(),
            team_id: Some(42),
            participant: Some(IdentityKey::ExternalId(10001)),
            assist: Some(IdentityKey::NameFallback("Unknown Winger".into())),
            comment: None,
        }
    }

    #[test]
    fn event_resolution_leaves_unknown_keys_empty() {
        let mut ids = BTreeMap::new();
        ids.insert(IdentityKey::ExternalId(10001), "p-1".to_string());

        let attrs = EventAttrs::resolve(&goal(3, 27), &ids);
        assert_eq!(attrs.slot, 3);
        assert_eq!(attrs.participant_id.as_deref(), Some("p-1"));
        assert_eq!(attrs.assist_id, None);
    }

    #[test]
    fn event_identity_ignores_cosmetic_fields() {
        let ids = BTreeMap::new();
        let base = EventAttrs::resolve(&goal(0, 27), &ids);

        let mut commented = base.clone();
        commented.comment = Some("Header".into());
        commented.detail = "Header Goal".into();
        assert!(base.same_identity(&commented));

        let mut moved = base.clone();
        moved.minute = 28;
        assert!(!base.same_identity(&moved));
    }

    #[test]
    fn participant_attrs_from_record() {
        let record = ParticipantRecord::feed_only(IdentityKey::ExternalId(7), "A. Player", Some(42));
        let attrs = ParticipantAttrs::from(record);
        assert_eq!(attrs.key(), IdentityKey::ExternalId(7));
        assert!(attrs.is_bench && attrs.is_feed_only);
    }

    #[test]
    fn team_stat_key() {
        let stat = TeamStatAttrs {
            team_id: 42,
            kind: "Ball Possession".into(),
            value: Some("61%".into()),
        };
        assert_eq!(stat.key(), (42, "Ball Possession".to_string()));
    }
}
