//! Match logging, attendance and stat edits, and password-confirmed deletion.
//!
//! Every aggregate counter on a player is only ever touched through the
//! deltas computed by [`crate::services::reconcile`], so repeating an edit
//! with the same payload produces zero writes and deleting a match restores
//! the pre-match aggregates exactly.

use std::collections::{HashMap, HashSet};

use mongodb::bson::{DateTime, doc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{self, AdminContext},
    dao::models::{MatchEntity, MatchStats, PlayerEntity},
    dto::{
        admin::{
            AttendanceRequest, CreateMatchRequest, DeleteMatchRequest, EndMatchRequest,
            MatchResponse, StatsUpdateRequest, UpdateMatchRequest,
        },
        parse_timestamp,
        public::{PlayerSummary, RecentMatchResponse},
    },
    error::ServiceError,
    services::reconcile,
    state::SharedState,
};

fn version_conflict(match_id: Uuid) -> ServiceError {
    ServiceError::Conflict(format!(
        "match {match_id} was modified concurrently; reload and retry"
    ))
}

async fn load_match(
    state: &SharedState,
    match_id: Uuid,
    group_id: Uuid,
) -> Result<MatchEntity, ServiceError> {
    let store = state.store().await?;
    store
        .find_match(match_id, group_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match {match_id}")))
}

fn require_editable(entity: &MatchEntity) -> Result<(), ServiceError> {
    if !entity.phase().allows_edits() {
        return Err(ServiceError::InvalidState(
            "match has ended and can no longer be edited".into(),
        ));
    }
    Ok(())
}

/// Log a new match in the draft phase.
pub async fn create_match(
    state: &SharedState,
    admin: &AdminContext,
    payload: CreateMatchRequest,
) -> Result<MatchResponse, ServiceError> {
    let date = parse_timestamp(&payload.date).ok_or_else(|| {
        ServiceError::InvalidInput(format!("`{}` is not an RFC3339 date", payload.date))
    })?;

    let entity = MatchEntity {
        id: Uuid::new_v4(),
        group_id: admin.group_id,
        date,
        attendees: Vec::new(),
        mvp_candidates: Vec::new(),
        stats: MatchStats::default(),
        mvp_winner_id: None,
        voting_open: false,
        voting_closed: false,
        ended: false,
        match_goal: payload.match_goal,
        video_url: payload.video_url,
        created_at: DateTime::now(),
        ended_at: None,
        version: 0,
    };

    let store = state.store().await?;
    store.insert_match(&entity).await?;
    info!(match_id = %entity.id, group_id = %admin.group_id, "match created");

    Ok(MatchResponse::from(entity))
}

/// Replace a match's attendee list, reconciling appearance counters.
pub async fn set_attendance(
    state: &SharedState,
    admin: &AdminContext,
    payload: AttendanceRequest,
) -> Result<MatchResponse, ServiceError> {
    let store = state.store().await?;
    let entity = load_match(state, payload.match_id, admin.group_id).await?;
    require_editable(&entity)?;

    let deltas = reconcile::attendance_deltas(&entity.attendees, &payload.attendees);

    let attendee_values: Vec<_> = payload
        .attendees
        .iter()
        .copied()
        .map(crate::dao::ids::as_bson)
        .collect();
    let updated = store
        .update_match_guarded(
            entity.id,
            entity.version,
            doc! { "attendees": attendee_values },
        )
        .await?;
    if !updated {
        return Err(version_conflict(entity.id));
    }

    for (player_id, delta) in &deltas {
        store
            .apply_appearance_delta(*player_id, admin.group_id, *delta)
            .await?;
    }

    info!(
        match_id = %entity.id,
        changed = deltas.len(),
        "attendance reconciled"
    );

    load_match(state, payload.match_id, admin.group_id)
        .await
        .map(MatchResponse::from)
}

/// Replace a match's stat maps, reconciling cumulative counters.
pub async fn update_stats(
    state: &SharedState,
    admin: &AdminContext,
    payload: StatsUpdateRequest,
) -> Result<MatchResponse, ServiceError> {
    let store = state.store().await?;
    let entity = load_match(state, payload.match_id, admin.group_id).await?;
    require_editable(&entity)?;

    let next = payload.to_match_stats();
    let deltas = reconcile::stat_deltas(&entity.stats, &next);

    let stats_doc = mongodb::bson::serialize_to_document(&next)
        .map_err(|err| ServiceError::InvalidInput(format!("unencodable stats payload: {err}")))?;
    let updated = store
        .update_match_guarded(entity.id, entity.version, doc! { "stats": stats_doc })
        .await?;
    if !updated {
        return Err(version_conflict(entity.id));
    }

    for (player_key, delta) in &deltas {
        let Ok(player_id) = Uuid::parse_str(player_key) else {
            warn!(key = %player_key, match_id = %entity.id, "skipping unparsable stat key");
            continue;
        };
        store
            .apply_stat_delta(player_id, admin.group_id, *delta, 0)
            .await?;
    }

    info!(match_id = %entity.id, changed = deltas.len(), "stats reconciled");

    load_match(state, payload.match_id, admin.group_id)
        .await
        .map(MatchResponse::from)
}

/// Update a match's free-text metadata.
pub async fn update_match(
    state: &SharedState,
    admin: &AdminContext,
    payload: UpdateMatchRequest,
) -> Result<MatchResponse, ServiceError> {
    let store = state.store().await?;
    let entity = load_match(state, payload.match_id, admin.group_id).await?;
    require_editable(&entity)?;

    let mut set = doc! {};
    if let Some(goal) = &payload.match_goal {
        set.insert("match_goal", goal.as_str());
    }
    if let Some(url) = &payload.video_url {
        set.insert("video_url", url.as_str());
    }
    if set.is_empty() {
        return Ok(MatchResponse::from(entity));
    }

    let updated = store
        .update_match_guarded(entity.id, entity.version, set)
        .await?;
    if !updated {
        return Err(version_conflict(entity.id));
    }

    load_match(state, payload.match_id, admin.group_id)
        .await
        .map(MatchResponse::from)
}

/// Freeze a match; no further edits, voting or stat changes are accepted.
pub async fn end_match(
    state: &SharedState,
    admin: &AdminContext,
    payload: EndMatchRequest,
) -> Result<MatchResponse, ServiceError> {
    let store = state.store().await?;
    let entity = load_match(state, payload.match_id, admin.group_id).await?;

    let next = entity.phase().apply(crate::state::lifecycle::MatchEvent::End)?;
    let flags = next.flags();

    let updated = store
        .update_match_guarded(
            entity.id,
            entity.version,
            doc! {
                "voting_open": flags.voting_open,
                "voting_closed": flags.voting_closed,
                "ended": flags.ended,
                "ended_at": DateTime::now(),
            },
        )
        .await?;
    if !updated {
        return Err(version_conflict(entity.id));
    }

    info!(match_id = %entity.id, "match ended");

    load_match(state, payload.match_id, admin.group_id)
        .await
        .map(MatchResponse::from)
}

/// Delete a match after re-checking the admin's password, reversing every
/// aggregate contribution it made and discarding its ballots.
pub async fn delete_match(
    state: &SharedState,
    admin: &AdminContext,
    payload: DeleteMatchRequest,
) -> Result<(), ServiceError> {
    let store = state.store().await?;

    let account = store
        .find_admin_by_email(&admin.email)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("invalid credentials".into()))?;
    auth::verify_password(&payload.password, &account.password_hash)?;

    let entity = load_match(state, payload.match_id, admin.group_id).await?;

    for (player_id, appearance_delta, stat_delta) in
        reconcile::reversal_deltas(&entity.attendees, &entity.stats)
    {
        store
            .apply_stat_delta(player_id, admin.group_id, stat_delta, appearance_delta)
            .await?;
    }

    if let Some(winner_id) = entity.mvp_winner_id {
        store.apply_mvp_delta(winner_id, admin.group_id, -1).await?;
    }

    let discarded = store.delete_votes_for_match(entity.id).await?;
    store.delete_match(entity.id).await?;

    info!(
        match_id = %entity.id,
        group_id = %admin.group_id,
        votes_discarded = discarded,
        "match deleted and aggregates reversed"
    );
    Ok(())
}

/// The group's most recent matches with attendee and winner details resolved.
pub async fn recent_matches(
    state: &SharedState,
    group_id: Uuid,
) -> Result<Vec<RecentMatchResponse>, ServiceError> {
    let store = state.store().await?;
    let matches = store.recent_matches(group_id).await?;

    let mut wanted: HashSet<Uuid> = HashSet::new();
    for entity in &matches {
        wanted.extend(entity.attendees.iter().copied());
        wanted.extend(entity.mvp_winner_id);
    }
    let wanted: Vec<Uuid> = wanted.into_iter().collect();

    let players: HashMap<Uuid, PlayerEntity> = store
        .find_players_by_ids(&wanted, group_id)
        .await?
        .into_iter()
        .map(|player| (player.id, player))
        .collect();

    let responses = matches
        .iter()
        .map(|entity| {
            let attendees = entity
                .attendees
                .iter()
                .filter_map(|id| players.get(id).cloned())
                .map(PlayerSummary::from)
                .collect();
            let mvp_winner = entity
                .mvp_winner_id
                .and_then(|id| players.get(&id).cloned())
                .map(PlayerSummary::from);
            RecentMatchResponse::assemble(entity, attendees, mvp_winner)
        })
        .collect();

    Ok(responses)
}
