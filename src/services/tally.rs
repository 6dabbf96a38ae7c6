//! Plurality tally over MVP ballots.
//!
//! Votes are fed in cast order and counted into an insertion-ordered map, so
//! the winner on a tie is the first candidate to have reached the maximum
//! count. That is the documented deterministic tie-break rule: it is
//! equivalent to picking the earliest-cast vote among the tied leaders.

use indexmap::IndexMap;
use uuid::Uuid;

use crate::dao::models::VoteEntity;

/// Result of tallying the ballots of one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyOutcome {
    /// Plurality winner under the first-to-max tie-break rule.
    pub winner: Uuid,
    /// Vote counts per candidate, in first-vote order.
    pub counts: IndexMap<Uuid, u64>,
    /// Total number of ballots counted.
    pub total_votes: u64,
}

/// Tally `votes` (already sorted by cast time) and pick the winner.
///
/// Returns `None` when no ballot was cast; closing an empty poll is the
/// caller's error to surface.
pub fn tally_votes(votes: &[VoteEntity]) -> Option<TallyOutcome> {
    if votes.is_empty() {
        return None;
    }

    let mut counts: IndexMap<Uuid, u64> = IndexMap::new();
    let mut winner = votes[0].player_voted_for;
    let mut max = 0u64;

    for vote in votes {
        let count = counts.entry(vote.player_voted_for).or_insert(0);
        *count += 1;
        // Strictly-greater keeps the earlier leader on ties.
        if *count > max {
            max = *count;
            winner = vote.player_voted_for;
        }
    }

    Some(TallyOutcome {
        winner,
        counts,
        total_votes: votes.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use mongodb::bson::DateTime;

    use super::*;

    fn ballots(candidates: &[Uuid]) -> Vec<VoteEntity> {
        let match_id = Uuid::new_v4();
        let group_id = Uuid::new_v4();
        candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| VoteEntity {
                id: Uuid::new_v4(),
                match_id,
                group_id,
                voter_name: format!("voter-{index}"),
                player_voted_for: *candidate,
                cast_at: DateTime::from_millis(index as i64),
            })
            .collect()
    }

    #[test]
    fn empty_poll_has_no_outcome() {
        assert!(tally_votes(&[]).is_none());
    }

    #[test]
    fn clear_majority_wins() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let outcome = tally_votes(&ballots(&[a, b, b])).unwrap();
        assert_eq!(outcome.winner, b);
        assert_eq!(outcome.counts[&b], 2);
        assert_eq!(outcome.total_votes, 3);
    }

    #[test]
    fn tie_goes_to_first_candidate_reaching_the_max() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        // Cast order P1, P2, P1, P2: P1 reaches 2 before P2 does.
        let outcome = tally_votes(&ballots(&[p1, p2, p1, p2])).unwrap();
        assert_eq!(outcome.winner, p1);
        assert_eq!(outcome.counts[&p1], 2);
        assert_eq!(outcome.counts[&p2], 2);
    }

    #[test]
    fn tie_break_depends_on_cast_order_not_candidate_identity() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        // Same ballots, reversed arrival: the other candidate wins.
        let outcome = tally_votes(&ballots(&[p2, p1, p2, p1])).unwrap();
        assert_eq!(outcome.winner, p2);
    }

    #[test]
    fn late_surge_overtakes_early_leader() {
        let early = Uuid::new_v4();
        let late = Uuid::new_v4();
        let outcome = tally_votes(&ballots(&[early, late, late])).unwrap();
        assert_eq!(outcome.winner, late);
    }

    #[test]
    fn counts_preserve_first_vote_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        let outcome = tally_votes(&ballots(&[b, a, c, a])).unwrap();
        let order: Vec<Uuid> = outcome.counts.keys().copied().collect();
        assert_eq!(order, vec![b, a, c]);
    }
}
