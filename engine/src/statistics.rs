//! Statistic rows derived from the feed.

use crate::error::Result;
use crate::feed::MatchFeed;
use crate::record::{PlayerLineStats, PlayerStatAttrs, TeamStatAttrs};
use crate::{Error, IdentityKey, SurrogateId};
use std::collections::BTreeMap;
use tracing::debug;

/// Per-participant statistic rows, keyed through the participants' surrogate
/// ids. Lines whose participant did not resolve are skipped.
pub fn player_stat_attrs(
    feed: &MatchFeed,
    participants: &BTreeMap<IdentityKey, SurrogateId>,
) -> Result<Vec<PlayerStatAttrs>> {
    let mut rows = Vec::new();

    for team in &feed.players {
        if !feed.plays(team.team.id) {
            return Err(Error::InvalidFeed(format!(
                "player statistics for team {} outside fixture {}",
                team.team.id, feed.fixture.id
            )));
        }

        for line in &team.players {
            let Some(participant_id) = line.player.key().and_then(|k| participants.get(&k)) else {
                debug!(
                    team = team.team.id,
                    name = line.player.display_name(),
                    "statistics line without a resolved participant skipped"
                );
                continue;
            };

            rows.push(PlayerStatAttrs {
                participant_id: participant_id.clone(),
                team_id: team.team.id,
                stats: line
                    .performance()
                    .map(PlayerLineStats::from)
                    .unwrap_or_default(),
            });
        }
    }

    Ok(rows)
}

/// Aggregate team statistic rows.
pub fn team_stat_attrs(feed: &MatchFeed) -> Result<Vec<TeamStatAttrs>> {
    let mut rows = Vec::new();

    for team in &feed.statistics {
        if !feed.plays(team.team.id) {
            return Err(Error::InvalidFeed(format!(
                "team statistics for team {} outside fixture {}",
                team.team.id, feed.fixture.id
            )));
        }

        for entry in &team.statistics {
            rows.push(TeamStatAttrs {
                team_id: team.team.id,
                kind: entry.kind.trim().to_string(),
                value: entry.value_text(),
            });
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn feed(extra: Value) -> MatchFeed {
        let mut value = json!({
            "fixture": {"id": 9},
            "teams": {"home": {"id": 42, "name": "Arsenal"}, "away": {"id": 65, "name": "Forest"}}
        });
        for (k, v) in extra.as_object().unwrap() {
            value[k] = v.clone();
        }
        MatchFeed::from_value(value).unwrap()
    }

    #[test]
    fn player_rows_resolve_through_participant_ids() {
        let feed = feed(json!({
            "players": [{
                "team": {"id": 42},
                "players": [
                    {"player": {"id": 10001, "name": "G. Jesus"},
                     "statistics": [{"games": {"minutes": 90, "rating": "7.4"}, "goals": {"total": 1}, "cards": {"yellow": 1, "red": 0}}]},
                    {"player": {"id": 10050, "name": "Unknown"}, "statistics": []}
                ]
            }]
        }));
        let mut ids = BTreeMap::new();
        ids.insert(IdentityKey::ExternalId(10001), "p-1".to_string());

        let rows = player_stat_attrs(&feed, &ids).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].participant_id, "p-1");
        assert_eq!(rows[0].stats.minutes, Some(90));
        assert_eq!(rows[0].stats.rating.as_deref(), Some("7.4"));
        assert_eq!(rows[0].stats.goals, Some(1));
        assert_eq!(rows[0].stats.yellow_cards, 1);
    }

    #[test]
    fn team_rows_keep_textual_values() {
        let feed = feed(json!({
            "statistics": [{
                "team": {"id": 65},
                "statistics": [
                    {"type": "Ball Possession", "value": "39%"},
                    {"type": "Total Shots", "value": 6},
                    {"type": "Offsides", "value": null}
                ]
            }]
        }));

        let rows = team_stat_attrs(&feed).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].value.as_deref(), Some("39%"));
        assert_eq!(rows[1].value.as_deref(), Some("6"));
        assert_eq!(rows[2].value, None);
    }

    #[test]
    fn statistics_for_foreign_team_are_rejected() {
        let feed = feed(json!({
            "statistics": [{"team": {"id": 1}, "statistics": []}]
        }));
        assert!(matches!(team_stat_attrs(&feed), Err(Error::InvalidFeed(_))));
    }
}
