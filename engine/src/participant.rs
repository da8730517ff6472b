//! Participants and the three sources they are assembled from.
//!
//! A participant can be known from the declared lineup, from events only
//! (late call-ups, officials named in free text) or from the statistics
//! block only. [`ParticipantSources::merge`] collapses the three into one map
//! with lineup > event-derived > statistics-derived priority.

use crate::feed::{Lineup, MatchFeed, PersonRef};
use crate::{IdentityKey, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Participants keyed by identity. Ordered so every pass iterates the same way.
pub type ParticipantMap = BTreeMap<IdentityKey, ParticipantRecord>;

/// What a participant does in the fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParticipantRole {
    #[default]
    Player,
    Coach,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipantRole::Player => "player",
            ParticipantRole::Coach => "coach",
        }
    }

    /// Parse the persisted form; anything unknown is a player.
    pub fn from_stored(s: &str) -> Self {
        match s {
            "coach" => ParticipantRole::Coach,
            _ => ParticipantRole::Player,
        }
    }
}

/// One participant as observed in a single pass. Discarded after diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub key: IdentityKey,
    pub name: String,
    pub number: Option<u32>,
    pub position: Option<String>,
    pub grid: Option<String>,
    pub role: ParticipantRole,
    pub is_bench: bool,
    /// Not present in the declared lineup
    pub is_feed_only: bool,
    pub team_id: Option<TeamId>,
}

impl ParticipantRecord {
    /// A participant known only from the feed's events or statistics.
    pub fn feed_only(key: IdentityKey, name: impl Into<String>, team_id: Option<TeamId>) -> Self {
        Self {
            key,
            name: name.into(),
            number: None,
            position: None,
            grid: None,
            role: ParticipantRole::Player,
            is_bench: true,
            is_feed_only: true,
            team_id,
        }
    }
}

/// Declared starting and bench sets for one team.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamSheet {
    pub starters: BTreeSet<IdentityKey>,
    pub bench: BTreeSet<IdentityKey>,
}

impl TeamSheet {
    pub fn is_starter(&self, key: &IdentityKey) -> bool {
        self.starters.contains(key)
    }

    pub fn is_bench(&self, key: &IdentityKey) -> bool {
        self.bench.contains(key)
    }

    pub fn contains(&self, key: &IdentityKey) -> bool {
        self.is_starter(key) || self.is_bench(key)
    }
}

/// Team sheets for both sides, keyed by team id.
pub type TeamSheets = BTreeMap<TeamId, TeamSheet>;

/// Build the lineup-derived participant map and the team sheets.
///
/// Coaches are lineup participants with [`ParticipantRole::Coach`]; they sit
/// on neither sheet and are added after every team's players, so a player
/// always owns its key. A coach whose id collides with a player is keyed by
/// name instead. A key listed twice keeps its first entry.
pub fn lineup_participants(feed: &MatchFeed) -> (ParticipantMap, TeamSheets) {
    let mut participants = ParticipantMap::new();
    let mut sheets = TeamSheets::new();

    for lineup in &feed.lineups {
        let sheet = sheets.entry(lineup.team.id).or_default();
        add_lineup_side(lineup, false, &mut participants, sheet);
        add_lineup_side(lineup, true, &mut participants, sheet);
    }

    for lineup in &feed.lineups {
        let Some(coach) = &lineup.coach else {
            continue;
        };
        let Some(key) = coach_key(coach, &participants) else {
            warn!(team = lineup.team.id, "coach without a free key skipped");
            continue;
        };

        participants.insert(
            key.clone(),
            ParticipantRecord {
                key,
                name: coach.display_name().to_string(),
                number: None,
                position: None,
                grid: None,
                role: ParticipantRole::Coach,
                is_bench: false,
                is_feed_only: false,
                team_id: Some(lineup.team.id),
            },
        );
    }

    (participants, sheets)
}

fn coach_key(coach: &PersonRef, participants: &ParticipantMap) -> Option<IdentityKey> {
    let key = coach.key()?;
    if !participants.contains_key(&key) {
        return Some(key);
    }

    warn!(%key, "coach key already taken by a player, falling back to name");
    IdentityKey::from_parts(None, coach.name.as_deref())
        .filter(|fallback| !participants.contains_key(fallback))
}

fn add_lineup_side(
    lineup: &Lineup,
    bench: bool,
    participants: &mut ParticipantMap,
    sheet: &mut TeamSheet,
) {
    let slots = if bench {
        &lineup.substitutes
    } else {
        &lineup.start_xi
    };

    for slot in slots {
        let player = &slot.player;
        let Some(key) = player.key() else {
            warn!(team = lineup.team.id, "lineup entry without id or name skipped");
            continue;
        };

        if participants.contains_key(&key) {
            warn!(team = lineup.team.id, %key, "participant listed twice in lineups");
            continue;
        }

        if bench {
            sheet.bench.insert(key.clone());
        } else {
            sheet.starters.insert(key.clone());
        }

        participants.insert(
            key.clone(),
            ParticipantRecord {
                key,
                name: player.name.clone().unwrap_or_default(),
                number: player.number,
                position: player.pos.clone(),
                grid: player.grid.clone(),
                role: ParticipantRole::Player,
                is_bench: bench,
                is_feed_only: false,
                team_id: Some(lineup.team.id),
            },
        );
    }
}

/// Build the statistics-derived participant map.
pub fn statistics_participants(feed: &MatchFeed) -> ParticipantMap {
    let mut participants = ParticipantMap::new();

    for team in &feed.players {
        for line in &team.players {
            let Some(key) = line.player.key() else {
                continue;
            };
            let games = line.performance().map(|p| &p.games);

            participants.entry(key.clone()).or_insert(ParticipantRecord {
                key,
                name: line.player.display_name().to_string(),
                number: games.and_then(|g| g.number),
                position: games.and_then(|g| g.position.clone()),
                grid: None,
                role: ParticipantRole::Player,
                is_bench: games.map(|g| g.substitute).unwrap_or(true),
                is_feed_only: true,
                team_id: Some(team.team.id),
            });
        }
    }

    participants
}

/// The three partial participant sources of one pass.
#[derive(Debug, Clone, Default)]
pub struct ParticipantSources {
    pub lineup: ParticipantMap,
    pub events: ParticipantMap,
    pub statistics: ParticipantMap,
}

impl ParticipantSources {
    /// Merge by source priority: lineup, then event-derived, then
    /// statistics-derived. Entries not sourced from the lineup are flagged
    /// feed-only.
    pub fn merge(self) -> ParticipantMap {
        let mut merged = self.lineup;

        for (key, mut record) in self.events.into_iter().chain(self.statistics) {
            if merged.contains_key(&key) {
                continue;
            }
            record.is_feed_only = true;
            merged.insert(key, record);
        }

        merged
    }
}
