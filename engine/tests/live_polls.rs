//! Multi-poll scenarios for matchsync-engine
//!
//! Each test feeds successive snapshots of one live fixture through a
//! MemoryStore and checks what survives between polls.

use matchsync_engine::{
    EventKind, IdentityKey, MatchFeed, MemoryStore, SequentialIds, Stage, SurrogateId,
    SyncOptions,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const FIXTURE: i64 = 1035037;
const HOME: i64 = 42;
const AWAY: i64 = 65;

fn feed(elapsed: u32, events: Value) -> MatchFeed {
    feed_with(elapsed, events, json!([]))
}

fn feed_with(elapsed: u32, events: Value, away_bench: Value) -> MatchFeed {
    MatchFeed::from_value(json!({
        "fixture": {
            "id": FIXTURE,
            "timestamp": 1692360000,
            "referee": "M. Oliver",
            "venue": {"id": 494, "name": "Emirates Stadium"},
            "status": {"short": "2H", "elapsed": elapsed}
        },
        "teams": {
            "home": {"id": HOME, "name": "Arsenal"},
            "away": {"id": AWAY, "name": "Nottingham Forest"}
        },
        "goals": {"home": 1, "away": 0},
        "lineups": [
            {
                "team": {"id": HOME},
                "coach": {"id": 501, "name": "M. Arteta"},
                "formation": "4-3-3",
                "startXI": [
                    {"player": {"id": 1001, "name": "G. Jesus", "number": 9, "pos": "F", "grid": "4:2"}},
                    {"player": {"id": 1002, "name": "B. Saka", "number": 7, "pos": "F", "grid": "4:3"}}
                ],
                "substitutes": [
                    {"player": {"id": 1012, "name": "L. Trossard", "number": 19, "pos": "F"}}
                ]
            },
            {
                "team": {"id": AWAY},
                "formation": "5-4-1",
                "startXI": [
                    {"player": {"id": 2001, "name": "T. Awoniyi", "number": 9, "pos": "F"}},
                    {"player": {"id": 2002, "name": "M. Turner", "number": 1, "pos": "G"}}
                ],
                "substitutes": away_bench
            }
        ],
        "events": events
    }))
    .unwrap()
}

fn goal(minute: u32, team: i64, player: i64) -> Value {
    json!({
        "time": {"elapsed": minute},
        "team": {"id": team},
        "player": {"id": player},
        "assist": {"id": null, "name": null},
        "type": "Goal",
        "detail": "Normal Goal"
    })
}

fn card(minute: u32, team: i64, player: Value) -> Value {
    json!({
        "time": {"elapsed": minute},
        "team": {"id": team},
        "player": player,
        "assist": {},
        "type": "Card",
        "detail": "Yellow Card"
    })
}

fn participant_ids(store: &MemoryStore) -> BTreeMap<IdentityKey, SurrogateId> {
    store
        .participants(FIXTURE)
        .into_iter()
        .map(|row| (row.attrs.key, row.id))
        .collect()
}

#[test]
fn repeated_poll_changes_nothing() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");
    let poll = feed(12, json!([goal(10, HOME, 1001)]));

    let first = store.sync(&poll, &mut ids, SyncOptions::default());
    assert!(first.success);
    assert_eq!(first.counts(Stage::Base).created, 3);
    // 3 home players + coach + 2 away players
    assert_eq!(first.counts(Stage::Participants).created, 6);
    assert_eq!(first.counts(Stage::Events).created, 1);
    let minted = ids.minted();

    let second = store.sync(&poll, &mut ids, SyncOptions::default());
    assert!(second.success);
    assert_eq!(second.totals.total(), 0);
    assert_eq!(ids.minted(), minted);
}

#[test]
fn surrogate_ids_survive_polls() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");

    store.sync(&feed(12, json!([goal(10, HOME, 1001)])), &mut ids, SyncOptions::default());
    let before = participant_ids(&store);
    let goal_id = store.events(FIXTURE)[0].id.clone();

    let result = store.sync(
        &feed(55, json!([goal(10, HOME, 1001), card(50, AWAY, json!({"id": 2001}))])),
        &mut ids,
        SyncOptions::default(),
    );

    assert!(result.success);
    // Only the fixture status moved
    assert_eq!(result.counts(Stage::Base).updated, 1);
    assert_eq!(result.counts(Stage::Participants).total(), 0);
    assert_eq!(participant_ids(&store), before);

    let events = store.events(FIXTURE);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].id, goal_id);
    assert_eq!(
        events[0].attrs.participant_id.as_ref(),
        before.get(&IdentityKey::ExternalId(1001))
    );
    assert_eq!(
        events[1].attrs.participant_id.as_ref(),
        before.get(&IdentityKey::ExternalId(2001))
    );
    assert_eq!(store.fixture(FIXTURE).unwrap().attrs.elapsed, Some(55));
}

#[test]
fn earlier_event_shifts_slots_and_replaces_rows() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");

    store.sync(&feed(12, json!([goal(10, HOME, 1001)])), &mut ids, SyncOptions::default());
    let goal_id = store.events(FIXTURE)[0].id.clone();

    // A late-reported card at minute 5 takes slot 0
    let result = store.sync(
        &feed(12, json!([goal(10, HOME, 1001), card(5, AWAY, json!({"id": 2002}))])),
        &mut ids,
        SyncOptions::default(),
    );

    let events = result.counts(Stage::Events);
    assert_eq!(events.created, 2);
    assert_eq!(events.deleted, 1);
    assert_eq!(events.updated, 0);

    let rows = store.events(FIXTURE);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].attrs.kind, EventKind::Card);
    assert_eq!(rows[1].attrs.kind, EventKind::Goal);
    assert!(rows.iter().all(|row| row.id != goal_id));
}

#[test]
fn shifted_slots_update_in_place_when_replacement_is_off() {
    let options = SyncOptions {
        replace_shifted_events: false,
        ..SyncOptions::default()
    };
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");

    store.sync(&feed(12, json!([goal(10, HOME, 1001)])), &mut ids, options.clone());
    let goal_id = store.events(FIXTURE)[0].id.clone();

    let result = store.sync(
        &feed(12, json!([goal(10, HOME, 1001), card(5, AWAY, json!({"id": 2002}))])),
        &mut ids,
        options,
    );

    let events = result.counts(Stage::Events);
    assert_eq!(events.updated, 1);
    assert_eq!(events.created, 1);
    assert_eq!(events.deleted, 0);

    // Slot 0 kept its id but now holds the card
    let rows = store.events(FIXTURE);
    assert_eq!(rows[0].id, goal_id);
    assert_eq!(rows[0].attrs.kind, EventKind::Card);
}

#[test]
fn retracted_event_is_removed() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");

    store.sync(
        &feed(40, json!([goal(10, HOME, 1001), card(30, AWAY, json!({"id": 2001}))])),
        &mut ids,
        SyncOptions::default(),
    );
    assert_eq!(store.events(FIXTURE).len(), 2);

    // Goal disallowed after review
    let result = store.sync(
        &feed(40, json!([card(30, AWAY, json!({"id": 2001}))])),
        &mut ids,
        SyncOptions::default(),
    );

    assert!(result.success);
    let rows = store.events(FIXTURE);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].attrs.slot, 0);
    assert_eq!(rows[0].attrs.kind, EventKind::Card);
}

#[test]
fn participant_dropped_from_lineup_is_deleted() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");
    let bench = json!([{"player": {"id": 2012, "name": "C. Wood", "number": 11}}]);

    store.sync(&feed_with(1, json!([]), bench), &mut ids, SyncOptions::default());
    assert!(participant_ids(&store).contains_key(&IdentityKey::ExternalId(2012)));

    let result = store.sync(&feed_with(1, json!([]), json!([])), &mut ids, SyncOptions::default());

    assert_eq!(result.counts(Stage::Participants).deleted, 1);
    assert!(!participant_ids(&store).contains_key(&IdentityKey::ExternalId(2012)));
}

#[test]
fn late_feed_only_participant_is_captured() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");

    store.sync(&feed(30, json!([])), &mut ids, SyncOptions::default());

    let result = store.sync(
        &feed(52, json!([card(50, AWAY, json!({"id": null, "name": "A. Taylor"}))])),
        &mut ids,
        SyncOptions::default(),
    );
    assert_eq!(result.counts(Stage::Participants).created, 1);

    let taylor = store
        .participants(FIXTURE)
        .into_iter()
        .find(|row| row.attrs.key == IdentityKey::NameFallback("A. Taylor".into()))
        .unwrap();
    assert!(taylor.attrs.is_feed_only);
    assert!(taylor.attrs.is_bench);
    assert_eq!(taylor.attrs.team_id, Some(AWAY));

    let events = store.events(FIXTURE);
    assert_eq!(events[0].attrs.participant_id.as_ref(), Some(&taylor.id));
}

#[test]
fn own_goal_counts_for_the_opponent() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");

    // Arsenal 0-1 Forest from an Arsenal own goal, reported under Forest
    let mut poll = feed(
        20,
        json!([{
            "time": {"elapsed": 18},
            "team": {"id": AWAY},
            "player": {"id": 1002, "name": "B. Saka"},
            "assist": {},
            "type": "Goal",
            "detail": "Own Goal"
        }]),
    );
    poll.goals.home = Some(0);
    poll.goals.away = Some(1);

    let result = store.sync(&poll, &mut ids, SyncOptions::default());
    assert!(result.success);

    let events = store.events(FIXTURE);
    assert_eq!(events[0].attrs.kind, EventKind::OwnGoal);
    // Scorer is declared for the home side, so the goal belongs to the away side
    assert_eq!(events[0].attrs.team_id, Some(AWAY));
}

#[test]
fn substitution_is_stored_incoming_first() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");

    // Provider lists the outgoing player first
    let poll = feed(
        62,
        json!([{
            "time": {"elapsed": 61},
            "team": {"id": HOME},
            "player": {"id": 1002, "name": "B. Saka"},
            "assist": {"id": 1012, "name": "L. Trossard"},
            "type": "subst",
            "detail": "Substitution 1"
        }]),
    );
    store.sync(&poll, &mut ids, SyncOptions::default());

    let participants = participant_ids(&store);
    let event = &store.events(FIXTURE)[0];
    assert_eq!(event.attrs.kind, EventKind::Substitution);
    assert_eq!(
        event.attrs.participant_id.as_ref(),
        participants.get(&IdentityKey::ExternalId(1012))
    );
    assert_eq!(
        event.attrs.assist_id.as_ref(),
        participants.get(&IdentityKey::ExternalId(1002))
    );
}

#[test]
fn statistics_follow_the_feed() {
    let mut store = MemoryStore::new();
    let mut ids = SequentialIds::new("row");

    let mut poll = feed(45, json!([]));
    poll.players = serde_json::from_value(json!([{
        "team": {"id": HOME},
        "players": [{"player": {"id": 1001, "name": "G. Jesus"}, "statistics": [{"games": {"minutes": 45}}]}]
    }]))
    .unwrap();
    poll.statistics = serde_json::from_value(json!([{
        "team": {"id": HOME},
        "statistics": [{"type": "Ball Possession", "value": "61%"}]
    }]))
    .unwrap();

    store.sync(&poll, &mut ids, SyncOptions::default());
    assert_eq!(store.player_stats(FIXTURE).len(), 1);
    assert_eq!(store.team_stats(FIXTURE)[0].attrs.value.as_deref(), Some("61%"));

    poll.players[0].players[0].statistics[0].games.minutes = Some(90);
    let result = store.sync(&poll, &mut ids, SyncOptions::default());

    assert_eq!(result.counts(Stage::PlayerStatistics).updated, 1);
    assert_eq!(result.counts(Stage::TeamStatistics).total(), 0);
    assert_eq!(store.player_stats(FIXTURE)[0].attrs.stats.minutes, Some(90));
}
