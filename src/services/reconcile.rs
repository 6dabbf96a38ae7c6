//! Delta-based stat reconciliation.
//!
//! Aggregates on players are never set to absolute values; every edit is
//! turned into the increment between the previous and the new snapshot, so a
//! match's attendance or stats can be edited any number of times before the
//! match ends without double counting. All functions here are pure; the
//! match service applies the resulting deltas as single `$inc` updates.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use crate::dao::models::MatchStats;

/// Combined per-player stat increment; only non-zero kinds are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatDelta {
    /// Goal increment (may be negative).
    pub goals: i64,
    /// Assist increment (may be negative).
    pub assists: i64,
    /// Save increment (may be negative).
    pub saves: i64,
}

impl StatDelta {
    /// True when every kind is zero, i.e. no write is needed.
    pub fn is_zero(&self) -> bool {
        self.goals == 0 && self.assists == 0 && self.saves == 0
    }

    /// Negate every kind, for reversal on match deletion.
    pub fn negated(self) -> Self {
        Self {
            goals: -self.goals,
            assists: -self.assists,
            saves: -self.saves,
        }
    }
}

/// Appearance deltas for an attendance edit.
///
/// Newly present players get `+1`, newly absent players get `-1`, unchanged
/// players produce no entry at all (and therefore no write).
pub fn attendance_deltas(previous: &[Uuid], next: &[Uuid]) -> Vec<(Uuid, i64)> {
    let before: BTreeSet<Uuid> = previous.iter().copied().collect();
    let after: BTreeSet<Uuid> = next.iter().copied().collect();

    let mut deltas = Vec::new();
    for id in after.difference(&before) {
        deltas.push((*id, 1));
    }
    for id in before.difference(&after) {
        deltas.push((*id, -1));
    }
    deltas
}

/// Per-player combined stat deltas between two stat snapshots.
///
/// Keys are the hyphenated player UUIDs as stored in the match document.
/// Players whose deltas are all zero are skipped.
pub fn stat_deltas(previous: &MatchStats, next: &MatchStats) -> BTreeMap<String, StatDelta> {
    let mut keys: BTreeSet<&String> = BTreeSet::new();
    for map in [
        &previous.goals,
        &previous.assists,
        &previous.saves,
        &next.goals,
        &next.assists,
        &next.saves,
    ] {
        keys.extend(map.keys());
    }

    let mut deltas = BTreeMap::new();
    for key in keys {
        let delta = StatDelta {
            goals: diff(&next.goals, &previous.goals, key),
            assists: diff(&next.assists, &previous.assists, key),
            saves: diff(&next.saves, &previous.saves, key),
        };
        if !delta.is_zero() {
            deltas.insert(key.clone(), delta);
        }
    }
    deltas
}

/// Deltas that undo every aggregate contribution a match has made.
///
/// Each attendee loses one appearance plus whatever goals/assists/saves the
/// match recorded for them. The MVP decrement is handled separately by the
/// caller since the winner needs not be an attendee of record.
pub fn reversal_deltas(attendees: &[Uuid], stats: &MatchStats) -> Vec<(Uuid, i64, StatDelta)> {
    attendees
        .iter()
        .map(|id| {
            let key = id.to_string();
            let recorded = StatDelta {
                goals: stats.goals.get(&key).copied().unwrap_or(0),
                assists: stats.assists.get(&key).copied().unwrap_or(0),
                saves: stats.saves.get(&key).copied().unwrap_or(0),
            };
            (*id, -1, recorded.negated())
        })
        .collect()
}

fn diff(next: &BTreeMap<String, i64>, previous: &BTreeMap<String, i64>, key: &str) -> i64 {
    next.get(key).copied().unwrap_or(0) - previous.get(key).copied().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(goals: &[(&str, i64)], assists: &[(&str, i64)], saves: &[(&str, i64)]) -> MatchStats {
        MatchStats {
            goals: goals.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            assists: assists.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            saves: saves.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn unchanged_attendance_produces_no_writes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let deltas = attendance_deltas(&[a, b], &[b, a]);
        assert!(deltas.is_empty());
    }

    #[test]
    fn attendance_deltas_split_added_and_removed() {
        let kept = Uuid::new_v4();
        let removed = Uuid::new_v4();
        let added = Uuid::new_v4();

        let deltas = attendance_deltas(&[kept, removed], &[kept, added]);
        assert_eq!(deltas.len(), 2);
        assert!(deltas.contains(&(added, 1)));
        assert!(deltas.contains(&(removed, -1)));
    }

    #[test]
    fn stat_deltas_are_differences_not_absolutes() {
        let before = stats(&[("p1", 2)], &[], &[]);
        let after = stats(&[("p1", 3)], &[("p1", 1)], &[]);

        let deltas = stat_deltas(&before, &after);
        let d = deltas.get("p1").unwrap();
        assert_eq!(d.goals, 1);
        assert_eq!(d.assists, 1);
        assert_eq!(d.saves, 0);
    }

    #[test]
    fn repeated_edits_never_double_count() {
        // S0 = ∅, S1 = {p:2}, S2 = {p:5}: the summed deltas must equal the
        // final snapshot value, not the sum of intermediates.
        let s0 = MatchStats::default();
        let s1 = stats(&[("p", 2)], &[], &[]);
        let s2 = stats(&[("p", 5)], &[], &[]);

        let first = stat_deltas(&s0, &s1).get("p").unwrap().goals;
        let second = stat_deltas(&s1, &s2).get("p").unwrap().goals;
        assert_eq!(first + second, 5);
    }

    #[test]
    fn all_zero_players_are_skipped() {
        let before = stats(&[("p1", 2), ("p2", 1)], &[], &[]);
        let after = stats(&[("p1", 2), ("p2", 3)], &[], &[]);

        let deltas = stat_deltas(&before, &after);
        assert!(!deltas.contains_key("p1"));
        assert_eq!(deltas.get("p2").unwrap().goals, 2);
    }

    #[test]
    fn removed_entries_produce_negative_deltas() {
        let before = stats(&[("p1", 2)], &[], &[("p1", 4)]);
        let after = MatchStats::default();

        let deltas = stat_deltas(&before, &after);
        let d = deltas.get("p1").unwrap();
        assert_eq!(d.goals, -2);
        assert_eq!(d.saves, -4);
    }

    #[test]
    fn negative_inputs_pass_through_unclamped() {
        let before = MatchStats::default();
        let after = stats(&[("p1", -3)], &[], &[]);
        assert_eq!(stat_deltas(&before, &after).get("p1").unwrap().goals, -3);
    }

    #[test]
    fn reversal_undoes_stats_and_appearance() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let recorded = stats(&[(&a.to_string(), 2)], &[(&b.to_string(), 1)], &[]);

        let reversal = reversal_deltas(&[a, b], &recorded);
        assert_eq!(reversal.len(), 2);

        let (_, appearance, delta) = reversal.iter().find(|(id, _, _)| *id == a).unwrap();
        assert_eq!(*appearance, -1);
        assert_eq!(delta.goals, -2);
        assert_eq!(delta.assists, 0);

        let (_, appearance, delta) = reversal.iter().find(|(id, _, _)| *id == b).unwrap();
        assert_eq!(*appearance, -1);
        assert_eq!(delta.assists, -1);
    }

    #[test]
    fn reversal_for_attendee_without_stats_only_touches_appearances() {
        let a = Uuid::new_v4();
        let reversal = reversal_deltas(&[a], &MatchStats::default());
        let (_, appearance, delta) = &reversal[0];
        assert_eq!(*appearance, -1);
        assert!(delta.is_zero());
    }
}
