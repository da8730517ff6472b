//! Event normalization.
//!
//! Turns the provider's raw, ordered-ish event list into a deterministic,
//! contiguously indexed [`DomainEvent`] sequence.
//!
//! # Rules
//!
//! 1. Raw events are walked in chronological order while tracking who is on
//!    the pitch for each team (declared starting XI, updated by every
//!    substitution).
//! 2. Substitutions are oriented so `participant` is the incoming player: when
//!    the named player is on the pitch and the assist is not, the two swap.
//!    Ambiguous pairs keep the provider's order; a substitution naming nobody
//!    becomes [`EventKind::Unclassified`].
//! 3. Own goals are credited to the opponent of the scorer's declared team.
//! 4. Missed penalties reported as goals are reclassified to
//!    [`EventKind::Other`] (see [`EventKind::classify`]).
//! 5. The result is sorted by (minute, extra minute or 0, team, substitution
//!    ordinal) and slots are reassigned from 0.
//!
//! Participants referenced by events but absent from the lineup are captured
//! as bench, feed-only participants.

use crate::event::trailing_number;
use crate::feed::{MatchFeed, RawEvent};
use crate::participant::{ParticipantMap, ParticipantRecord, TeamSheets};
use crate::{DomainEvent, EventKind, IdentityKey, SlotIndex, SyncOptions, TeamId};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Output of one normalization pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedEvents {
    /// Sorted events with slots 0..n
    pub events: Vec<DomainEvent>,
    /// Participants referenced by events but missing from the lineup
    pub participants: ParticipantMap,
}

/// Where a participant stands at a given point of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    OnPitch,
    OffPitch,
    Unknown,
}

/// Live view of each team's players on the pitch.
struct PitchState<'a> {
    sheets: &'a TeamSheets,
    on_pitch: BTreeMap<TeamId, BTreeSet<IdentityKey>>,
}

impl<'a> PitchState<'a> {
    fn new(sheets: &'a TeamSheets) -> Self {
        let on_pitch = sheets
            .iter()
            .map(|(team, sheet)| (*team, sheet.starters.clone()))
            .collect();
        Self { sheets, on_pitch }
    }

    fn presence(&self, team: Option<TeamId>, key: &IdentityKey) -> Presence {
        let Some(team) = team else {
            return Presence::Unknown;
        };
        let Some(sheet) = self.sheets.get(&team) else {
            return Presence::Unknown;
        };
        if !sheet.contains(key) {
            return Presence::Unknown;
        }
        match self.on_pitch.get(&team) {
            Some(players) if players.contains(key) => Presence::OnPitch,
            _ => Presence::OffPitch,
        }
    }

    fn substitute(&mut self, team: TeamId, incoming: &IdentityKey, outgoing: &IdentityKey) {
        let players = self.on_pitch.entry(team).or_default();
        players.remove(outgoing);
        players.insert(incoming.clone());
    }
}

/// Normalizes the events of one feed.
pub struct EventNormalizer<'a> {
    feed: &'a MatchFeed,
    lineup: &'a ParticipantMap,
    sheets: &'a TeamSheets,
    options: &'a SyncOptions,
}

impl<'a> EventNormalizer<'a> {
    /// Create a normalizer over a feed, its lineup-derived participants and
    /// its team sheets.
    pub fn new(
        feed: &'a MatchFeed,
        lineup: &'a ParticipantMap,
        sheets: &'a TeamSheets,
        options: &'a SyncOptions,
    ) -> Self {
        Self {
            feed,
            lineup,
            sheets,
            options,
        }
    }

    /// Run the normalization pass.
    pub fn normalize(&self) -> NormalizedEvents {
        check_sequence(&self.feed.events);

        let mut order: Vec<(&RawEvent, EventKind)> = self
            .feed
            .events
            .iter()
            .map(|raw| (raw, self.classify(raw)))
            .collect();
        order.sort_by_key(|(raw, kind)| raw_sort_key(raw, *kind));

        let mut pitch = PitchState::new(self.sheets);
        let mut participants = ParticipantMap::new();
        let mut events = Vec::with_capacity(order.len());

        for (raw, kind) in order {
            self.capture_feed_only(raw, &mut participants);
            events.push(self.normalize_one(raw, kind, &mut pitch));
        }

        // Stable: equal keys keep the chronological walk order
        events.sort_by(|a, b| a.chronological_cmp(b));
        for (slot, event) in events.iter_mut().enumerate() {
            event.slot = slot as SlotIndex;
        }

        NormalizedEvents {
            events,
            participants,
        }
    }

    fn classify(&self, raw: &RawEvent) -> EventKind {
        EventKind::classify(
            &raw.kind,
            &raw.detail,
            &self.options.own_goal_detail,
            &self.options.missed_penalty_detail,
        )
    }

    fn normalize_one(
        &self,
        raw: &RawEvent,
        kind: EventKind,
        pitch: &mut PitchState<'_>,
    ) -> DomainEvent {
        let raw_team = raw.team.as_ref().map(|t| t.id);

        let mut event = DomainEvent {
            slot: 0,
            minute: raw.time.elapsed,
            extra_minute: raw.time.extra,
            kind,
            detail: raw.detail.clone(),
            team_id: raw_team,
            participant: raw.player.key(),
            assist: raw.assist.key(),
            comment: raw.comments.clone(),
        };

        match kind {
            EventKind::Substitution => orient_substitution(&mut event, pitch),
            EventKind::OwnGoal => self.reattribute_own_goal(&mut event),
            _ => {}
        }

        event
    }

    fn reattribute_own_goal(&self, event: &mut DomainEvent) {
        let declared = event
            .participant
            .as_ref()
            .and_then(|key| self.lineup.get(key))
            .and_then(|p| p.team_id)
            .or(event.team_id);

        match declared.and_then(|team| self.feed.opponent_of(team)) {
            Some(opponent) => event.team_id = Some(opponent),
            None => warn!(
                minute = event.minute,
                team = ?event.team_id,
                "own goal for a team outside the fixture, team left unchanged"
            ),
        }
    }

    fn capture_feed_only(&self, raw: &RawEvent, participants: &mut ParticipantMap) {
        if !self.options.capture_feed_only {
            return;
        }
        let team = raw.team.as_ref().map(|t| t.id);

        for person in [&raw.player, &raw.assist] {
            let Some(key) = person.key() else {
                continue;
            };
            if self.lineup.contains_key(&key) || participants.contains_key(&key) {
                continue;
            }
            debug!(%key, "feed-only participant captured from events");
            participants.insert(
                key.clone(),
                ParticipantRecord::feed_only(key, person.display_name(), team),
            );
        }
    }
}

fn orient_substitution(event: &mut DomainEvent, pitch: &mut PitchState<'_>) {
    let (player, assist) = match (&event.participant, &event.assist) {
        (None, None) => {
            warn!(minute = event.minute, "substitution names nobody, left unclassified");
            event.kind = EventKind::Unclassified;
            return;
        }
        (Some(player), Some(assist)) => (player.clone(), assist.clone()),
        _ => return,
    };

    let team = event.team_id;
    match (pitch.presence(team, &player), pitch.presence(team, &assist)) {
        (Presence::OffPitch, Presence::OnPitch) => {}
        (Presence::OnPitch, Presence::OffPitch) => {
            std::mem::swap(&mut event.participant, &mut event.assist);
        }
        (p, a) => debug!(
            minute = event.minute,
            player = %player,
            assist = %assist,
            "ambiguous substitution direction ({:?}/{:?}), provider order kept",
            p,
            a
        ),
    }

    if let (Some(team), Some(incoming), Some(outgoing)) =
        (team, event.participant.as_ref(), event.assist.as_ref())
    {
        pitch.substitute(team, incoming, outgoing);
    }
}

/// Chronological key of a raw event, used for the on-pitch walk.
fn raw_sort_key(raw: &RawEvent, kind: EventKind) -> (u32, u32, Option<TeamId>, u32) {
    let ordinal = if kind == EventKind::Substitution {
        trailing_number(&raw.detail).unwrap_or(0)
    } else {
        0
    };
    (
        raw.time.elapsed,
        raw.time.extra.unwrap_or(0),
        raw.team.as_ref().map(|t| t.id),
        ordinal,
    )
}

/// Warn about provider sequence numbers that are duplicated, missing or not
/// zero-based. Processing continues with the feed as given.
fn check_sequence(events: &[RawEvent]) {
    let sequences: Vec<u32> = events.iter().filter_map(|e| e.sequence).collect();
    if sequences.is_empty() {
        return;
    }
    if sequences.len() != events.len() {
        warn!(
            numbered = sequences.len(),
            total = events.len(),
            "feed numbers only some of its events"
        );
    }

    let unique: BTreeSet<u32> = sequences.iter().copied().collect();
    if unique.len() != sequences.len() {
        warn!(
            duplicates = sequences.len() - unique.len(),
            "feed event sequence contains duplicates"
        );
    }
    if let (Some(first), Some(last)) = (unique.first(), unique.last()) {
        if *first != 0 {
            warn!(first = *first, "feed event sequence is not zero-based");
        }
        let span = (last - first) as usize + 1;
        if span != unique.len() {
            warn!(
                missing = span - unique.len(),
                "feed event sequence has gaps"
            );
        }
    }
}
