//! Player roster management and the leaderboard projections.

use std::collections::BTreeSet;

use mongodb::bson::DateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AdminContext,
    dao::models::PlayerEntity,
    dto::{
        admin::{
            AddPlayerRequest, BulkAddPlayersRequest, BulkAddPlayersResponse, DeletePlayerRequest,
            EditPlayerRequest, SkippedPlayer,
        },
        public::{LeaderboardResponse, PlayerSummary},
        validation::MIN_NAME_LEN,
    },
    error::ServiceError,
    state::SharedState,
};

/// All players of a group, sorted by name.
pub async fn list_players(
    state: &SharedState,
    group_id: Uuid,
) -> Result<Vec<PlayerSummary>, ServiceError> {
    let store = state.store().await?;
    let players = store.list_players(group_id).await?;
    Ok(players.into_iter().map(PlayerSummary::from).collect())
}

/// The five leaderboard projections over a group's players.
///
/// Each list is the same player set sorted by one counter, descending. The
/// sort is stable, so players tied on a counter keep their name order.
pub async fn leaderboard(
    state: &SharedState,
    group_id: Uuid,
) -> Result<LeaderboardResponse, ServiceError> {
    let store = state.store().await?;
    let players: Vec<PlayerSummary> = store
        .list_players(group_id)
        .await?
        .into_iter()
        .map(PlayerSummary::from)
        .collect();

    fn ranked(players: &[PlayerSummary], key: fn(&PlayerSummary) -> i64) -> Vec<PlayerSummary> {
        let mut sorted = players.to_vec();
        sorted.sort_by_key(|player| std::cmp::Reverse(key(player)));
        sorted
    }

    Ok(LeaderboardResponse {
        goals: ranked(&players, |p| p.goals),
        assists: ranked(&players, |p| p.assists),
        saves: ranked(&players, |p| p.saves),
        mvp: ranked(&players, |p| p.mvp),
        appearances: ranked(&players, |p| p.appearances),
    })
}

fn new_player(group_id: Uuid, name: String, photo_url: String) -> PlayerEntity {
    PlayerEntity {
        id: Uuid::new_v4(),
        group_id,
        name,
        photo_url,
        total_goals: 0,
        total_assists: 0,
        total_saves: 0,
        total_mvp: 0,
        total_appearances: 0,
        created_at: DateTime::now(),
    }
}

/// Register a new player with zeroed counters.
pub async fn add_player(
    state: &SharedState,
    admin: &AdminContext,
    payload: AddPlayerRequest,
) -> Result<PlayerSummary, ServiceError> {
    let store = state.store().await?;
    let name = payload.name.trim().to_owned();

    if store
        .find_player_by_name(admin.group_id, &name, None)
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "a player named `{name}` already exists in this group"
        )));
    }

    let player = new_player(admin.group_id, name, payload.photo_url);
    store.insert_player(&player).await?;
    info!(player_id = %player.id, group_id = %admin.group_id, "player registered");

    Ok(PlayerSummary::from(player))
}

/// Rename a player or replace their photo reference.
pub async fn edit_player(
    state: &SharedState,
    admin: &AdminContext,
    payload: EditPlayerRequest,
) -> Result<PlayerSummary, ServiceError> {
    let store = state.store().await?;
    let name = payload.name.trim().to_owned();

    if store
        .find_player_by_name(admin.group_id, &name, Some(payload.player_id))
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "a player named `{name}` already exists in this group"
        )));
    }

    let updated = store
        .update_player_identity(payload.player_id, admin.group_id, &name, &payload.photo_url)
        .await?;
    if !updated {
        return Err(ServiceError::NotFound(format!(
            "player {}",
            payload.player_id
        )));
    }

    store
        .find_player(payload.player_id, admin.group_id)
        .await?
        .map(PlayerSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("player {}", payload.player_id)))
}

/// Remove a player who has never been marked present at a match.
pub async fn delete_player(
    state: &SharedState,
    admin: &AdminContext,
    payload: DeletePlayerRequest,
) -> Result<(), ServiceError> {
    let store = state.store().await?;

    if store
        .player_has_attendance(payload.player_id, admin.group_id)
        .await?
    {
        return Err(ServiceError::InvalidState(
            "player has attendance history and cannot be deleted".into(),
        ));
    }

    let deleted = store
        .delete_player(payload.player_id, admin.group_id)
        .await?;
    if !deleted {
        return Err(ServiceError::NotFound(format!(
            "player {}",
            payload.player_id
        )));
    }

    info!(player_id = %payload.player_id, group_id = %admin.group_id, "player deleted");
    Ok(())
}

/// Outcome of planning a bulk add: names to insert plus skipped entries.
#[derive(Debug, PartialEq, Eq)]
pub struct BulkAddPlan {
    /// Trimmed names that should be inserted.
    pub to_add: Vec<String>,
    /// Names that were rejected, with reasons.
    pub skipped: Vec<SkippedPlayer>,
}

/// Decide which requested names can be registered.
///
/// `existing_lower` holds the lowercased names already taken in the group.
/// Comparison is case-insensitive; entries duplicated within the request
/// itself are also skipped.
pub fn plan_bulk_add(existing_lower: &BTreeSet<String>, requested: &[String]) -> BulkAddPlan {
    let mut seen = existing_lower.clone();
    let mut to_add = Vec::new();
    let mut skipped = Vec::new();

    for raw in requested {
        let name = raw.trim();
        if name.chars().count() < MIN_NAME_LEN {
            skipped.push(SkippedPlayer {
                name: raw.clone(),
                reason: format!("name must be at least {MIN_NAME_LEN} characters"),
            });
            continue;
        }

        let key = name.to_lowercase();
        if seen.contains(&key) {
            skipped.push(SkippedPlayer {
                name: raw.clone(),
                reason: "a player with that name already exists".into(),
            });
            continue;
        }

        seen.insert(key);
        to_add.push(name.to_owned());
    }

    BulkAddPlan { to_add, skipped }
}

/// Register several players at once, skipping invalid or duplicate names.
pub async fn bulk_add_players(
    state: &SharedState,
    admin: &AdminContext,
    payload: BulkAddPlayersRequest,
) -> Result<BulkAddPlayersResponse, ServiceError> {
    let store = state.store().await?;

    let existing_lower: BTreeSet<String> = store
        .list_players(admin.group_id)
        .await?
        .into_iter()
        .map(|player| player.name.trim().to_lowercase())
        .collect();

    let plan = plan_bulk_add(&existing_lower, &payload.names);

    let mut added = Vec::with_capacity(plan.to_add.len());
    for name in plan.to_add {
        let player = new_player(admin.group_id, name, String::new());
        store.insert_player(&player).await?;
        added.push(PlayerSummary::from(player));
    }

    info!(
        group_id = %admin.group_id,
        added = added.len(),
        skipped = plan.skipped.len(),
        "bulk player add completed"
    );

    Ok(BulkAddPlayersResponse {
        added,
        skipped: plan.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn existing(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_lowercase()).collect()
    }

    #[test]
    fn bulk_plan_skips_existing_and_short_names() {
        let plan = plan_bulk_add(
            &existing(&["Bob"]),
            &[
                "Bob".into(),
                "bob".into(),
                "".into(),
                "Carol".into(),
            ],
        );

        assert_eq!(plan.to_add, vec!["Carol".to_string()]);
        assert_eq!(plan.skipped.len(), 3);
        assert!(plan.skipped[0].reason.contains("already exists"));
        assert!(plan.skipped[1].reason.contains("already exists"));
        assert!(plan.skipped[2].reason.contains("at least"));
    }

    #[test]
    fn bulk_plan_catches_duplicates_within_the_request() {
        let plan = plan_bulk_add(
            &existing(&[]),
            &["Dave".into(), " dave ".into(), "DAVE".into()],
        );

        assert_eq!(plan.to_add, vec!["Dave".to_string()]);
        assert_eq!(plan.skipped.len(), 2);
    }

    #[test]
    fn bulk_plan_trims_before_inserting() {
        let plan = plan_bulk_add(&existing(&[]), &["  Erin  ".into()]);
        assert_eq!(plan.to_add, vec!["Erin".to_string()]);
        assert!(plan.skipped.is_empty());
    }

    #[test]
    fn bulk_plan_empty_request_adds_nothing() {
        let plan = plan_bulk_add(&existing(&["Bob"]), &[]);
        assert!(plan.to_add.is_empty());
        assert!(plan.skipped.is_empty());
    }
}
