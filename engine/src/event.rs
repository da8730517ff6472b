//! Match event types.

use crate::{error::Result, Error, IdentityKey, SlotIndex, TeamId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Classified kind of a match event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Goal,
    OwnGoal,
    /// Reserved for feeds that report a missed penalty as its own event type.
    /// A "Goal" event with a "Missed Penalty" detail becomes [`EventKind::Other`].
    MissedPenalty,
    Substitution,
    Card,
    /// A substitution naming neither participant
    Unclassified,
    Other,
}

impl EventKind {
    /// Classify a provider event type and detail.
    ///
    /// `own_goal` and `missed_penalty` are the detail markers the provider
    /// uses on "Goal" events, compared case-insensitively.
    pub fn classify(raw_type: &str, detail: &str, own_goal: &str, missed_penalty: &str) -> Self {
        let detail = detail.trim();
        match raw_type.trim().to_ascii_lowercase().as_str() {
            "goal" if detail.eq_ignore_ascii_case(missed_penalty) => EventKind::Other,
            "goal" if detail.eq_ignore_ascii_case(own_goal) => EventKind::OwnGoal,
            "goal" => EventKind::Goal,
            "subst" | "substitution" => EventKind::Substitution,
            "card" => EventKind::Card,
            "missed penalty" => EventKind::MissedPenalty,
            _ => EventKind::Other,
        }
    }

    /// Stable textual form, used as the persisted representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Goal => "goal",
            EventKind::OwnGoal => "own_goal",
            EventKind::MissedPenalty => "missed_penalty",
            EventKind::Substitution => "substitution",
            EventKind::Card => "card",
            EventKind::Unclassified => "unclassified",
            EventKind::Other => "other",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "goal" => Ok(EventKind::Goal),
            "own_goal" => Ok(EventKind::OwnGoal),
            "missed_penalty" => Ok(EventKind::MissedPenalty),
            "substitution" => Ok(EventKind::Substitution),
            "card" => Ok(EventKind::Card),
            "unclassified" => Ok(EventKind::Unclassified),
            "other" => Ok(EventKind::Other),
            other => Err(Error::UnknownEventKind(other.to_string())),
        }
    }
}

/// A normalized event produced by one pass of the normalizer.
///
/// For substitutions `participant` is always the incoming player and
/// `assist` the outgoing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainEvent {
    /// Position after normalization and sorting, contiguous from 0
    pub slot: SlotIndex,
    pub minute: u32,
    pub extra_minute: Option<u32>,
    pub kind: EventKind,
    pub detail: String,
    pub team_id: Option<TeamId>,
    pub participant: Option<IdentityKey>,
    pub assist: Option<IdentityKey>,
    pub comment: Option<String>,
}

impl DomainEvent {
    /// Ordinal carried by substitution details such as "Substitution 3".
    /// Zero for every other event.
    pub fn substitution_ordinal(&self) -> u32 {
        if self.kind != EventKind::Substitution {
            return 0;
        }
        trailing_number(&self.detail).unwrap_or(0)
    }

    /// Deterministic ordering: minute, extra minute (absent = 0), team,
    /// substitution ordinal.
    pub fn chronological_cmp(&self, other: &Self) -> Ordering {
        self.minute
            .cmp(&other.minute)
            .then_with(|| {
                self.extra_minute
                    .unwrap_or(0)
                    .cmp(&other.extra_minute.unwrap_or(0))
            })
            .then_with(|| self.team_id.cmp(&other.team_id))
            .then_with(|| self.substitution_ordinal().cmp(&other.substitution_ordinal()))
    }
}

pub(crate) fn trailing_number(text: &str) -> Option<u32> {
    let trimmed = text.trim_end();
    let digits = trimmed.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    trimmed[trimmed.len() - digits..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(minute: u32, extra: Option<u32>, team: i64, kind: EventKind, detail: &str) -> DomainEvent {
        DomainEvent {
            slot: 0,
            minute,
            extra_minute: extra,
            kind,
            detail: detail.into(),
            team_id: Some(team),
            participant: None,
            assist: None,
            comment: None,
        }
    }

    #[test]
    fn classify_provider_types() {
        let c = |t: &str, d: &str| EventKind::classify(t, d, "Own Goal", "Missed Penalty");

        assert_eq!(c("Goal", "Normal Goal"), EventKind::Goal);
        assert_eq!(c("Goal", "Penalty"), EventKind::Goal);
        assert_eq!(c("Goal", "Own Goal"), EventKind::OwnGoal);
        assert_eq!(c("Goal", "Missed Penalty"), EventKind::Other);
        assert_eq!(c("subst", "Substitution 1"), EventKind::Substitution);
        assert_eq!(c("Card", "Yellow Card"), EventKind::Card);
        assert_eq!(c("Var", "Goal cancelled"), EventKind::Other);
    }

    #[test]
    fn kind_text_roundtrip() {
        for kind in [
            EventKind::Goal,
            EventKind::OwnGoal,
            EventKind::MissedPenalty,
            EventKind::Substitution,
            EventKind::Card,
            EventKind::Unclassified,
            EventKind::Other,
        ] {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert_eq!(
            "penalty_shootout".parse::<EventKind>(),
            Err(Error::UnknownEventKind("penalty_shootout".into()))
        );
    }

    #[test]
    fn substitution_ordinal_parsing() {
        assert_eq!(
            event(60, None, 1, EventKind::Substitution, "Substitution 3").substitution_ordinal(),
            3
        );
        assert_eq!(
            event(60, None, 1, EventKind::Substitution, "Substitution").substitution_ordinal(),
            0
        );
        assert_eq!(
            event(60, None, 1, EventKind::Card, "Card 2").substitution_ordinal(),
            0
        );
    }

    #[test]
    fn missing_extra_minute_sorts_first() {
        let regular = event(45, None, 1, EventKind::Goal, "Normal Goal");
        let stoppage = event(45, Some(2), 1, EventKind::Goal, "Normal Goal");
        assert_eq!(regular.chronological_cmp(&stoppage), Ordering::Less);
    }

    #[test]
    fn same_minute_substitutions_order_by_ordinal() {
        let second = event(70, None, 1, EventKind::Substitution, "Substitution 2");
        let first = event(70, None, 1, EventKind::Substitution, "Substitution 1");
        assert_eq!(first.chronological_cmp(&second), Ordering::Less);
    }
}
