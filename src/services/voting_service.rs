//! MVP poll lifecycle: opening, casting ballots, closing, and the public
//! live-status view.

use indexmap::IndexMap;
use mongodb::bson::{DateTime, doc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::AdminContext,
    dao::{
        ids::as_bson,
        models::{PlayerEntity, VoteEntity},
        storage::StorageError,
    },
    dto::{
        admin::{CloseVotingRequest, CloseVotingResponse, MatchResponse, StartVotingRequest},
        public::{CandidateTally, PlayerSummary, VoteRequest, VoteStatusResponse},
        validation::normalize_voter_name,
    },
    error::ServiceError,
    services::tally,
    state::{
        SharedState,
        lifecycle::{MatchEvent, MatchPhase},
    },
};

fn version_conflict(match_id: Uuid) -> ServiceError {
    ServiceError::Conflict(format!(
        "match {match_id} was modified concurrently; reload and retry"
    ))
}

/// Open the MVP poll with a restricted candidate list.
pub async fn start_voting(
    state: &SharedState,
    admin: &AdminContext,
    payload: StartVotingRequest,
) -> Result<MatchResponse, ServiceError> {
    if payload.candidates.is_empty() {
        return Err(ServiceError::InvalidInput(
            "candidate list must not be empty".into(),
        ));
    }

    let store = state.store().await?;
    let entity = store
        .find_match(payload.match_id, admin.group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match {}", payload.match_id)))?;

    for candidate in &payload.candidates {
        if !entity.attendees.contains(candidate) {
            return Err(ServiceError::InvalidInput(format!(
                "candidate {candidate} is not an attendee of this match"
            )));
        }
    }

    let next = entity.phase().apply(MatchEvent::OpenVoting)?;
    let flags = next.flags();

    let candidate_values: Vec<_> = payload.candidates.iter().copied().map(as_bson).collect();
    let updated = store
        .update_match_guarded(
            entity.id,
            entity.version,
            doc! {
                "voting_open": flags.voting_open,
                "voting_closed": flags.voting_closed,
                "mvp_candidates": candidate_values,
            },
        )
        .await?;
    if !updated {
        return Err(version_conflict(entity.id));
    }

    info!(
        match_id = %entity.id,
        candidates = payload.candidates.len(),
        "voting opened"
    );

    store
        .find_match(payload.match_id, admin.group_id)
        .await?
        .map(MatchResponse::from)
        .ok_or_else(|| ServiceError::NotFound(format!("match {}", payload.match_id)))
}

/// Cast one MVP ballot under a normalized voter name.
pub async fn cast_vote(state: &SharedState, payload: VoteRequest) -> Result<(), ServiceError> {
    let store = state.store().await?;

    let entity = store
        .find_match_unscoped(payload.match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match {}", payload.match_id)))?;

    if entity.phase() != MatchPhase::VotingOpen {
        return Err(ServiceError::InvalidState(
            "voting is not open for this match".into(),
        ));
    }

    let voter_name = normalize_voter_name(&payload.voter_name).ok_or_else(|| {
        ServiceError::InvalidInput("voter name must be at least 2 characters".into())
    })?;

    if !entity.attendees.contains(&payload.player_id) {
        return Err(ServiceError::InvalidInput(
            "the chosen player did not attend this match".into(),
        ));
    }
    if !entity.mvp_candidates.is_empty() && !entity.mvp_candidates.contains(&payload.player_id) {
        return Err(ServiceError::InvalidInput(
            "the chosen player is not an MVP candidate".into(),
        ));
    }

    if store.find_vote(entity.id, &voter_name).await?.is_some() {
        return Err(ServiceError::Conflict(
            "a ballot under that name was already cast".into(),
        ));
    }

    let vote = VoteEntity {
        id: Uuid::new_v4(),
        match_id: entity.id,
        group_id: entity.group_id,
        voter_name,
        player_voted_for: payload.player_id,
        cast_at: DateTime::now(),
    };

    // The unique index closes the race between the check above and this
    // insert; a losing writer gets the same "already cast" answer.
    match store.insert_vote(&vote).await {
        Ok(()) => {
            info!(match_id = %entity.id, "ballot cast");
            Ok(())
        }
        Err(StorageError::DuplicateKey { .. }) => Err(ServiceError::Conflict(
            "a ballot under that name was already cast".into(),
        )),
        Err(other) => Err(other.into()),
    }
}

/// Close the poll, record the winner and credit their MVP title.
pub async fn close_voting(
    state: &SharedState,
    admin: &AdminContext,
    payload: CloseVotingRequest,
) -> Result<CloseVotingResponse, ServiceError> {
    let store = state.store().await?;
    let entity = store
        .find_match(payload.match_id, admin.group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match {}", payload.match_id)))?;

    let next = entity.phase().apply(MatchEvent::CloseVoting)?;
    let flags = next.flags();

    let votes = store.votes_for_match(entity.id).await?;
    let outcome = tally::tally_votes(&votes).ok_or_else(|| {
        ServiceError::InvalidState("cannot close voting before any ballot was cast".into())
    })?;

    let updated = store
        .update_match_guarded(
            entity.id,
            entity.version,
            doc! {
                "voting_open": flags.voting_open,
                "voting_closed": flags.voting_closed,
                "mvp_winner_id": as_bson(outcome.winner),
            },
        )
        .await?;
    if !updated {
        return Err(version_conflict(entity.id));
    }

    store
        .apply_mvp_delta(outcome.winner, admin.group_id, 1)
        .await?;

    // The close is committed at this point; a winner whose player record no
    // longer resolves must not turn the success into an error.
    let winner = store
        .find_player(outcome.winner, admin.group_id)
        .await?
        .map(PlayerSummary::from);
    if winner.is_none() {
        warn!(
            match_id = %entity.id,
            winner = %outcome.winner,
            "poll winner has no resolvable player record"
        );
    }

    info!(
        match_id = %entity.id,
        winner = %outcome.winner,
        total_votes = outcome.total_votes,
        "voting closed"
    );

    Ok(CloseVotingResponse {
        winner_id: outcome.winner,
        winner,
        total_votes: outcome.total_votes,
    })
}

/// Public snapshot of the group's currently-open poll.
pub async fn vote_status(
    state: &SharedState,
    group_id: Uuid,
) -> Result<VoteStatusResponse, ServiceError> {
    let store = state.store().await?;

    let Some(entity) = store.find_open_voting_match(group_id).await? else {
        return Ok(VoteStatusResponse::inactive());
    };

    let votes = store.votes_for_match(entity.id).await?;

    let mut counts: IndexMap<Uuid, u64> = IndexMap::new();
    for vote in &votes {
        *counts.entry(vote.player_voted_for).or_insert(0) += 1;
    }

    let candidate_ids: Vec<Uuid> = counts.keys().copied().collect();
    let players: std::collections::HashMap<Uuid, PlayerEntity> = store
        .find_players_by_ids(&candidate_ids, group_id)
        .await?
        .into_iter()
        .map(|player| (player.id, player))
        .collect();

    let lines = counts
        .into_iter()
        .filter_map(|(player_id, ballots)| {
            players.get(&player_id).cloned().map(|player| CandidateTally {
                player: PlayerSummary::from(player),
                votes: ballots,
            })
        })
        .collect();

    Ok(VoteStatusResponse {
        active: true,
        match_id: Some(entity.id),
        counts: lines,
        total_votes: votes.len() as u64,
    })
}
