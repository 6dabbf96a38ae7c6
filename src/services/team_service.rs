//! Random team splits: shuffle the chosen players and deal them round-robin
//! into the requested number of teams, capturing identity snapshots.

use mongodb::bson::DateTime;
use rand::seq::SliceRandom;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::AdminContext,
    dao::models::{PlayerEntity, PlayerSnapshot, TeamShuffleEntity},
    dto::{
        admin::{CreateShuffleRequest, DeleteShuffleRequest},
        public::ShuffleResponse,
    },
    error::ServiceError,
    state::SharedState,
};

/// Deal already-shuffled players into `num_teams` teams round-robin.
///
/// Team sizes differ by at most one; earlier teams get the extra player.
fn deal_round_robin(players: Vec<PlayerSnapshot>, num_teams: usize) -> Vec<Vec<PlayerSnapshot>> {
    let mut teams: Vec<Vec<PlayerSnapshot>> = (0..num_teams).map(|_| Vec::new()).collect();
    for (index, player) in players.into_iter().enumerate() {
        teams[index % num_teams].push(player);
    }
    teams
}

/// Create a new randomized team split for the admin's group.
pub async fn create_shuffle(
    state: &SharedState,
    admin: &AdminContext,
    payload: CreateShuffleRequest,
) -> Result<ShuffleResponse, ServiceError> {
    if payload.player_ids.len() < payload.num_teams {
        return Err(ServiceError::InvalidInput(format!(
            "{} players cannot fill {} teams",
            payload.player_ids.len(),
            payload.num_teams
        )));
    }

    let store = state.store().await?;
    let players = store
        .find_players_by_ids(&payload.player_ids, admin.group_id)
        .await?;

    // The lookup is tenant-scoped, so a foreign or unknown id shows up as a
    // missing player rather than leaking another group's roster.
    if players.len() != payload.player_ids.len() {
        return Err(ServiceError::NotFound(
            "one or more selected players were not found in your group".into(),
        ));
    }

    let mut snapshots: Vec<PlayerSnapshot> = players
        .into_iter()
        .map(|player: PlayerEntity| PlayerSnapshot {
            id: player.id,
            name: player.name,
            photo_url: player.photo_url,
        })
        .collect();
    snapshots.shuffle(&mut rand::rng());

    let entity = TeamShuffleEntity {
        id: Uuid::new_v4(),
        group_id: admin.group_id,
        teams: deal_round_robin(snapshots, payload.num_teams),
        created_at: DateTime::now(),
        created_by: admin.email.clone(),
    };

    store.insert_shuffle(&entity).await?;
    info!(
        shuffle_id = %entity.id,
        group_id = %admin.group_id,
        teams = payload.num_teams,
        "team shuffle created"
    );

    Ok(ShuffleResponse::from(entity))
}

/// The group's newest team split, or `None` when none exists.
pub async fn latest_shuffle(
    state: &SharedState,
    group_id: Uuid,
) -> Result<Option<ShuffleResponse>, ServiceError> {
    let store = state.store().await?;
    let latest = store.latest_shuffle(group_id).await?;
    Ok(latest.map(ShuffleResponse::from))
}

/// Remove a team split belonging to the admin's group.
pub async fn delete_shuffle(
    state: &SharedState,
    admin: &AdminContext,
    payload: DeleteShuffleRequest,
) -> Result<(), ServiceError> {
    let store = state.store().await?;
    let deleted = store
        .delete_shuffle(payload.shuffle_id, admin.group_id)
        .await?;
    if !deleted {
        return Err(ServiceError::NotFound(format!(
            "team shuffle {}",
            payload.shuffle_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(name: &str) -> PlayerSnapshot {
        PlayerSnapshot {
            id: Uuid::new_v4(),
            name: name.into(),
            photo_url: String::new(),
        }
    }

    #[test]
    fn round_robin_balances_team_sizes() {
        let players: Vec<_> = (0..7).map(|i| snapshot(&format!("p{i}"))).collect();
        let teams = deal_round_robin(players, 3);

        assert_eq!(teams.len(), 3);
        assert_eq!(teams[0].len(), 3);
        assert_eq!(teams[1].len(), 2);
        assert_eq!(teams[2].len(), 2);
    }

    #[test]
    fn round_robin_keeps_every_player_exactly_once() {
        let players: Vec<_> = (0..10).map(|i| snapshot(&format!("p{i}"))).collect();
        let ids: Vec<Uuid> = players.iter().map(|p| p.id).collect();

        let teams = deal_round_robin(players, 4);
        let mut dealt: Vec<Uuid> = teams.iter().flatten().map(|p| p.id).collect();
        dealt.sort();

        let mut expected = ids;
        expected.sort();
        assert_eq!(dealt, expected);
    }

    #[test]
    fn round_robin_exact_split() {
        let players: Vec<_> = (0..6).map(|i| snapshot(&format!("p{i}"))).collect();
        let teams = deal_round_robin(players, 2);
        assert_eq!(teams[0].len(), 3);
        assert_eq!(teams[1].len(), 3);
    }
}
