//! Explicit match lifecycle, replacing ad-hoc checks over the persisted
//! flag triple with a single transition table.

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Lifecycle phase of a match.
///
/// Derived from and serialized back to the stored `voting_open` /
/// `voting_closed` / `ended` flags, so the wire and storage layout stays
/// compatible with pre-existing documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// No voting activity yet; attendance and stats are editable.
    Draft,
    /// MVP voting is accepting ballots.
    VotingOpen,
    /// Voting concluded with a recorded winner; match not yet frozen.
    VotingClosed,
    /// Match is frozen; all further mutation is rejected.
    Ended,
}

/// Events that drive a match through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchEvent {
    /// Open MVP voting (candidates recorded by the caller).
    OpenVoting,
    /// Close voting and record the plurality winner.
    CloseVoting,
    /// Freeze the match permanently.
    End,
}

/// The persisted flag triple a [`MatchPhase`] maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchFlags {
    /// Voting currently accepting ballots.
    pub voting_open: bool,
    /// Voting has been closed.
    pub voting_closed: bool,
    /// Match is frozen.
    pub ended: bool,
}

/// Error returned when an event cannot be applied from the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{event:?} is not allowed while the match is in {from:?}")]
pub struct InvalidTransition {
    /// The phase the match was in.
    pub from: MatchPhase,
    /// The event that cannot be applied from this phase.
    pub event: MatchEvent,
}

impl MatchPhase {
    /// Derive the phase from the stored flags.
    ///
    /// Precedence: ended > closed > open. This makes the invariants
    /// `voting_closed ⇒ ¬voting_open` and `ended ⇒ voting_closed ∨ never
    /// opened` hold even over inconsistent legacy documents.
    pub fn from_flags(voting_open: bool, voting_closed: bool, ended: bool) -> Self {
        if ended {
            MatchPhase::Ended
        } else if voting_closed {
            MatchPhase::VotingClosed
        } else if voting_open {
            MatchPhase::VotingOpen
        } else {
            MatchPhase::Draft
        }
    }

    /// Serialize the phase back to the stored flag triple.
    pub fn flags(self) -> MatchFlags {
        match self {
            MatchPhase::Draft => MatchFlags {
                voting_open: false,
                voting_closed: false,
                ended: false,
            },
            MatchPhase::VotingOpen => MatchFlags {
                voting_open: true,
                voting_closed: false,
                ended: false,
            },
            MatchPhase::VotingClosed => MatchFlags {
                voting_open: false,
                voting_closed: true,
                ended: false,
            },
            // An ended match always reads as voting-closed, even when no poll
            // ever ran.
            MatchPhase::Ended => MatchFlags {
                voting_open: false,
                voting_closed: true,
                ended: true,
            },
        }
    }

    /// Compute the next phase for an event, rejecting illegal transitions.
    pub fn apply(self, event: MatchEvent) -> Result<MatchPhase, InvalidTransition> {
        let next = match (self, event) {
            (MatchPhase::Draft, MatchEvent::OpenVoting) => MatchPhase::VotingOpen,
            (MatchPhase::VotingOpen, MatchEvent::CloseVoting) => MatchPhase::VotingClosed,
            // Ending is legal when voting closed or never opened, never while
            // ballots are still being accepted.
            (MatchPhase::Draft, MatchEvent::End) => MatchPhase::Ended,
            (MatchPhase::VotingClosed, MatchEvent::End) => MatchPhase::Ended,
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        Ok(next)
    }

    /// Whether attendance, stats and metadata edits are still legal.
    pub fn allows_edits(self) -> bool {
        self != MatchPhase::Ended
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&MatchPhase::VotingOpen).unwrap(),
            "\"voting_open\""
        );
        assert_eq!(serde_json::to_string(&MatchPhase::Ended).unwrap(), "\"ended\"");
    }

    #[test]
    fn flags_round_trip_through_phase() {
        for (open, closed, ended) in [
            (false, false, false),
            (true, false, false),
            (false, true, false),
            (false, true, true),
        ] {
            let phase = MatchPhase::from_flags(open, closed, ended);
            let flags = phase.flags();
            assert_eq!(MatchPhase::from_flags(flags.voting_open, flags.voting_closed, flags.ended), phase);
        }
    }

    #[test]
    fn inconsistent_legacy_flags_resolve_by_precedence() {
        // open and closed both set: closed wins.
        assert_eq!(MatchPhase::from_flags(true, true, false), MatchPhase::VotingClosed);
        // ended always wins.
        assert_eq!(MatchPhase::from_flags(true, false, true), MatchPhase::Ended);
    }

    #[test]
    fn happy_path_with_voting() {
        let phase = MatchPhase::Draft;
        let phase = phase.apply(MatchEvent::OpenVoting).unwrap();
        assert_eq!(phase, MatchPhase::VotingOpen);
        let phase = phase.apply(MatchEvent::CloseVoting).unwrap();
        assert_eq!(phase, MatchPhase::VotingClosed);
        let phase = phase.apply(MatchEvent::End).unwrap();
        assert_eq!(phase, MatchPhase::Ended);
    }

    #[test]
    fn ending_without_voting_is_legal() {
        assert_eq!(MatchPhase::Draft.apply(MatchEvent::End).unwrap(), MatchPhase::Ended);
    }

    #[test]
    fn ending_while_voting_open_is_rejected() {
        let err = MatchPhase::VotingOpen.apply(MatchEvent::End).unwrap_err();
        assert_eq!(err.from, MatchPhase::VotingOpen);
        assert_eq!(err.event, MatchEvent::End);
    }

    #[test]
    fn closing_is_irreversible() {
        assert!(MatchPhase::VotingClosed.apply(MatchEvent::OpenVoting).is_err());
        assert!(MatchPhase::VotingClosed.apply(MatchEvent::CloseVoting).is_err());
    }

    #[test]
    fn ended_rejects_every_event() {
        for event in [MatchEvent::OpenVoting, MatchEvent::CloseVoting, MatchEvent::End] {
            assert!(MatchPhase::Ended.apply(event).is_err());
        }
        assert!(!MatchPhase::Ended.allows_edits());
    }

    #[test]
    fn double_open_is_rejected() {
        assert!(MatchPhase::VotingOpen.apply(MatchEvent::OpenVoting).is_err());
    }
}
