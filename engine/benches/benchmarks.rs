//! Performance benchmarks for matchsync-engine

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use matchsync_engine::participant::lineup_participants;
use matchsync_engine::{
    EventNormalizer, IdentityKey, MatchFeed, MemoryStore, ParticipantAttrs, ParticipantRecord,
    ReconciliationPlanner, SequentialIds, Stored, SyncOptions, UpdatePolicy,
};
use serde_json::{json, Value};

/// A feed with full lineups and `events` events spread over the match.
fn synthetic_feed(events: usize) -> MatchFeed {
    let side = |team: i64| {
        let start: Vec<Value> = (0..11)
            .map(|i| json!({"player": {"id": team * 100 + i, "name": format!("Player {}", team * 100 + i), "number": i + 1}}))
            .collect();
        let bench: Vec<Value> = (11..20)
            .map(|i| json!({"player": {"id": team * 100 + i, "name": format!("Player {}", team * 100 + i), "number": i + 1}}))
            .collect();
        json!({"team": {"id": team}, "startXI": start, "substitutes": bench})
    };

    let events: Vec<Value> = (0..events)
        .rev()
        .map(|i| {
            let team = if i % 2 == 0 { 42 } else { 65 };
            json!({
                "time": {"elapsed": (i % 90) as u32 + 1},
                "team": {"id": team},
                "player": {"id": team * 100 + (i % 11) as i64},
                "assist": {},
                "type": if i % 3 == 0 { "Goal" } else { "Card" },
                "detail": if i % 3 == 0 { "Normal Goal" } else { "Yellow Card" }
            })
        })
        .collect();

    MatchFeed::from_value(json!({
        "fixture": {"id": 1, "timestamp": 1700000000, "status": {"short": "2H", "elapsed": 90}},
        "teams": {"home": {"id": 42, "name": "Home"}, "away": {"id": 65, "name": "Away"}},
        "lineups": [side(42), side(65)],
        "events": events
    }))
    .unwrap()
}

fn participants(size: usize, number: u32) -> Vec<ParticipantAttrs> {
    (0..size)
        .map(|i| {
            let mut record = ParticipantRecord::feed_only(
                IdentityKey::ExternalId(i as i64 + 1),
                format!("Player {}", i),
                Some(42),
            );
            record.number = Some(number);
            record.into()
        })
        .collect()
}

fn bench_normalization(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalization");
    let options = SyncOptions::default();

    for size in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::new("normalize", size), size, |b, &size| {
            let feed = synthetic_feed(size);
            let (lineup, sheets) = lineup_participants(&feed);

            b.iter(|| EventNormalizer::new(black_box(&feed), &lineup, &sheets, &options).normalize())
        });
    }

    group.finish();
}

fn bench_planning(c: &mut Criterion) {
    let mut group = c.benchmark_group("planning");

    for size in [100, 1000, 5000].iter() {
        group.bench_with_input(BenchmarkId::new("plan_unchanged", size), size, |b, &size| {
            let existing: Vec<Stored<ParticipantAttrs>> = participants(size, 1)
                .into_iter()
                .enumerate()
                .map(|(i, attrs)| Stored::new(format!("p-{}", i), attrs))
                .collect();
            let incoming = participants(size, 1);
            let mut ids = SequentialIds::new("new");

            b.iter(|| {
                ReconciliationPlanner::new(&mut ids, UpdatePolicy::InPlace)
                    .plan(black_box(incoming.clone()), black_box(existing.clone()))
            })
        });

        group.bench_with_input(BenchmarkId::new("plan_all_changed", size), size, |b, &size| {
            let existing: Vec<Stored<ParticipantAttrs>> = participants(size, 1)
                .into_iter()
                .enumerate()
                .map(|(i, attrs)| Stored::new(format!("p-{}", i), attrs))
                .collect();
            // Half the keys overlap, every overlapping row changed
            let incoming: Vec<ParticipantAttrs> = participants(size + size / 2, 2)
                .into_iter()
                .skip(size / 2)
                .collect();
            let mut ids = SequentialIds::new("new");

            b.iter(|| {
                ReconciliationPlanner::new(&mut ids, UpdatePolicy::InPlace)
                    .plan(black_box(incoming.clone()), black_box(existing.clone()))
            })
        });
    }

    group.finish();
}

fn bench_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync");

    for size in [10, 100].iter() {
        group.bench_with_input(BenchmarkId::new("first_poll", size), size, |b, &size| {
            let feed = synthetic_feed(size);
            let mut ids = SequentialIds::new("row");

            b.iter(|| {
                let mut store = MemoryStore::new();
                store.sync(black_box(&feed), &mut ids, SyncOptions::default())
            })
        });

        group.bench_with_input(BenchmarkId::new("repeat_poll", size), size, |b, &size| {
            let feed = synthetic_feed(size);
            let mut ids = SequentialIds::new("row");
            let mut store = MemoryStore::new();
            store.sync(&feed, &mut ids, SyncOptions::default());

            b.iter(|| store.sync(black_box(&feed), &mut ids, SyncOptions::default()))
        });
    }

    group.finish();
}

fn bench_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    group.bench_function("feed_from_json", |b| {
        let payload = serde_json::to_string(&synthetic_feed(50)).unwrap();

        b.iter(|| MatchFeed::from_json(black_box(&payload)))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_normalization,
    bench_planning,
    bench_sync,
    bench_serialization,
);
criterion_main!(benches);
