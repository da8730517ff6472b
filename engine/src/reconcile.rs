//! Keyed reconciliation of new observations against persisted rows.
//!
//! One generic algorithm serves every table of a fixture: participants are
//! keyed by identity, events by slot, statistics by participant or
//! (team, statistic) pair.
//!
//! # Algorithm
//!
//! 1. Index persisted rows by key (duplicate keys: first row by surrogate id
//!    stays, the rest are deleted)
//! 2. Keys only in the new set are created with a freshly minted id
//! 3. Keys in both sets whose attributes differ are updated in place, keeping
//!    the surrogate id
//! 4. Keys in both sets with identical attributes produce nothing
//! 5. Keys only in the persisted set are deleted
//!
//! Under [`UpdatePolicy::ReplaceOnIdentityChange`] a changed row whose
//! [`Keyed::same_identity`] check fails is deleted and recreated instead of
//! updated. Events use this so a slot that now holds a different event gets
//! a new surrogate id.

use crate::ids::IdGenerator;
use crate::record::Stored;
use crate::SurrogateId;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};
use tracing::warn;

/// Attributes that can be reconciled by key.
pub trait Keyed {
    type Key: Ord + Clone + fmt::Debug;

    /// Key correlating a new observation with its persisted row.
    fn key(&self) -> Self::Key;

    /// Whether `other` still describes the same real-world record as `self`.
    fn same_identity(&self, other: &Self) -> bool {
        let _ = other;
        true
    }
}

/// How a changed row sharing a key with a persisted row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UpdatePolicy {
    /// Always mutate the persisted row (default)
    #[default]
    InPlace,
    /// Delete and recreate rows whose identity changed
    ReplaceOnIdentityChange,
}

/// Created, updated and deleted counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeCounts {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl ChangeCounts {
    pub fn total(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

impl Add for ChangeCounts {
    type Output = ChangeCounts;

    fn add(self, rhs: ChangeCounts) -> ChangeCounts {
        ChangeCounts {
            created: self.created + rhs.created,
            updated: self.updated + rhs.updated,
            deleted: self.deleted + rhs.deleted,
        }
    }
}

impl AddAssign for ChangeCounts {
    fn add_assign(&mut self, rhs: ChangeCounts) {
        *self = *self + rhs;
    }
}

/// The result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSet<T> {
    pub to_create: Vec<T>,
    pub to_update: Vec<T>,
    pub to_delete: Vec<T>,
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
        }
    }
}

impl<T> ChangeSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_changes(&self) -> bool {
        !(self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty())
    }

    pub fn created(&self) -> usize {
        self.to_create.len()
    }

    pub fn updated(&self) -> usize {
        self.to_update.len()
    }

    pub fn deleted(&self) -> usize {
        self.to_delete.len()
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            created: self.created(),
            updated: self.updated(),
            deleted: self.deleted(),
        }
    }
}

/// Planned changes plus the surrogate id of every key that survives the pass
/// (created, updated or unchanged).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<A: Keyed> {
    pub changes: ChangeSet<Stored<A>>,
    pub ids: BTreeMap<A::Key, SurrogateId>,
}

/// Plans the minimal create/update/delete set for one table.
pub struct ReconciliationPlanner<'g> {
    ids: &'g mut dyn IdGenerator,
    policy: UpdatePolicy,
}

impl<'g> ReconciliationPlanner<'g> {
    /// Create a planner minting ids from `ids`.
    pub fn new(ids: &'g mut dyn IdGenerator, policy: UpdatePolicy) -> Self {
        Self { ids, policy }
    }

    /// Diff `incoming` observations against `existing` rows.
    pub fn plan<A>(&mut self, incoming: Vec<A>, mut existing: Vec<Stored<A>>) -> Reconciliation<A>
    where
        A: Keyed + PartialEq,
    {
        let mut changes = ChangeSet::new();
        let mut ids = BTreeMap::new();

        // Sorted so duplicate resolution does not depend on load order
        existing.sort_by(|a, b| a.id.cmp(&b.id));
        let mut persisted: BTreeMap<A::Key, Stored<A>> = BTreeMap::new();
        for row in existing {
            match persisted.entry(row.attrs.key()) {
                Entry::Vacant(slot) => {
                    slot.insert(row);
                }
                Entry::Occupied(slot) => {
                    warn!(
                        key = ?slot.key(),
                        kept = %slot.get().id,
                        dropped = %row.id,
                        "duplicate persisted key, extra row scheduled for deletion"
                    );
                    changes.to_delete.push(row);
                }
            }
        }

        for attrs in incoming {
            let key = attrs.key();
            if ids.contains_key(&key) {
                warn!(key = ?key, "duplicate key in new records, first occurrence kept");
                continue;
            }

            match persisted.remove(&key) {
                None => {
                    let id = self.ids.next_id();
                    ids.insert(key, id.clone());
                    changes.to_create.push(Stored::new(id, attrs));
                }
                Some(row) if row.attrs == attrs => {
                    ids.insert(key, row.id);
                }
                Some(row)
                    if self.policy == UpdatePolicy::ReplaceOnIdentityChange
                        && !row.attrs.same_identity(&attrs) =>
                {
                    let id = self.ids.next_id();
                    ids.insert(key, id.clone());
                    changes.to_delete.push(row);
                    changes.to_create.push(Stored::new(id, attrs));
                }
                Some(mut row) => {
                    row.attrs = attrs;
                    ids.insert(key, row.id.clone());
                    changes.to_update.push(row);
                }
            }
        }

        changes.to_delete.extend(persisted.into_values());

        Reconciliation { changes, ids }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    #[derive(Debug, Clone, PartialEq)]
    struct Player {
        code: &'static str,
        number: u32,
    }

    impl Keyed for Player {
        type Key = &'static str;

        fn key(&self) -> &'static str {
            self.code
        }
    }

    /// Identity follows the number, so a changed number is a different row.
    #[derive(Debug, Clone, PartialEq)]
    struct Slot {
        slot: u32,
        minute: u32,
        note: &'static str,
    }

    impl Keyed for Slot {
        type Key = u32;

        fn key(&self) -> u32 {
            self.slot
        }

        fn same_identity(&self, other: &Self) -> bool {
            self.minute == other.minute
        }
    }

    fn p(code: &'static str, number: u32) -> Player {
        Player { code, number }
    }

    fn stored(id: &str, player: Player) -> Stored<Player> {
        Stored::new(id, player)
    }

    #[test]
    fn orphans_are_deleted() {
        let mut ids = SequentialIds::new("id");
        let mut planner = ReconciliationPlanner::new(&mut ids, UpdatePolicy::InPlace);

        let existing = vec![stored("a", p("P101", 9)), stored("b", p("P999", 4))];
        let plan = planner.plan(vec![p("P101", 9)], existing);

        assert!(plan.changes.to_create.is_empty());
        assert!(plan.changes.to_update.is_empty());
        assert_eq!(plan.changes.to_delete, vec![stored("b", p("P999", 4))]);
        assert_eq!(plan.ids.get("P101").map(String::as_str), Some("a"));
    }

    #[test]
    fn creates_and_updates() {
        let mut ids = SequentialIds::new("id");
        let mut planner = ReconciliationPlanner::new(&mut ids, UpdatePolicy::InPlace);

        let existing = vec![stored("a", p("P101", 9))];
        let plan = planner.plan(vec![p("P101", 10), p("P102", 7)], existing);

        assert_eq!(plan.changes.to_create, vec![stored("id-1", p("P102", 7))]);
        assert_eq!(plan.changes.to_update, vec![stored("a", p("P101", 10))]);
        assert!(plan.changes.to_delete.is_empty());
        assert_eq!(
            plan.changes.counts(),
            ChangeCounts {
                created: 1,
                updated: 1,
                deleted: 0
            }
        );
    }

    #[test]
    fn second_pass_is_empty() {
        let mut ids = SequentialIds::new("id");
        let incoming = vec![p("P101", 10), p("P102", 7)];

        let first = ReconciliationPlanner::new(&mut ids, UpdatePolicy::InPlace)
            .plan(incoming.clone(), vec![stored("a", p("P101", 9))]);

        let persisted: Vec<_> = first
            .changes
            .to_create
            .into_iter()
            .chain(first.changes.to_update)
            .collect();
        let second =
            ReconciliationPlanner::new(&mut ids, UpdatePolicy::InPlace).plan(incoming, persisted);

        assert!(!second.changes.has_changes());
        assert_eq!(second.ids.len(), 2);
    }

    #[test]
    fn duplicate_persisted_keys_keep_lowest_id() {
        let mut ids = SequentialIds::new("id");
        let mut planner = ReconciliationPlanner::new(&mut ids, UpdatePolicy::InPlace);

        let existing = vec![stored("z", p("P1", 1)), stored("a", p("P1", 1))];
        let plan = planner.plan(vec![p("P1", 1)], existing);

        assert_eq!(plan.changes.to_delete, vec![stored("z", p("P1", 1))]);
        assert_eq!(plan.ids.get("P1").map(String::as_str), Some("a"));
    }

    #[test]
    fn duplicate_new_keys_keep_first() {
        let mut ids = SequentialIds::new("id");
        let mut planner = ReconciliationPlanner::new(&mut ids, UpdatePolicy::InPlace);

        let plan = planner.plan(vec![p("P1", 1), p("P1", 2)], Vec::new());
        assert_eq!(plan.changes.to_create, vec![stored("id-1", p("P1", 1))]);
    }

    #[test]
    fn replace_policy_recreates_shifted_rows() {
        let mut ids = SequentialIds::new("evt");
        let mut planner =
            ReconciliationPlanner::new(&mut ids, UpdatePolicy::ReplaceOnIdentityChange);

        let existing = vec![
            Stored::new("e0", Slot { slot: 0, minute: 10, note: "" }),
            Stored::new("e1", Slot { slot: 1, minute: 20, note: "" }),
        ];
        let incoming = vec![
            Slot { slot: 0, minute: 10, note: "header" },
            Slot { slot: 1, minute: 25, note: "" },
        ];
        let plan = planner.plan(incoming, existing);

        assert_eq!(plan.changes.to_update.len(), 1);
        assert_eq!(plan.changes.to_update[0].id, "e0");
        assert_eq!(plan.changes.to_delete.len(), 1);
        assert_eq!(plan.changes.to_delete[0].id, "e1");
        assert_eq!(plan.changes.to_create.len(), 1);
        assert_eq!(plan.changes.to_create[0].id, "evt-1");
        assert_eq!(plan.ids.get(&1).map(String::as_str), Some("evt-1"));
    }

    #[test]
    fn change_counts_add() {
        let mut total = ChangeCounts::default();
        total += ChangeCounts {
            created: 1,
            updated: 2,
            deleted: 3,
        };
        total += ChangeCounts {
            created: 1,
            updated: 0,
            deleted: 0,
        };
        assert_eq!(total.created, 2);
        assert_eq!(total.total(), 7);
    }
}
