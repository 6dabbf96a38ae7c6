//! DTOs for the bearer-gated admin routes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{MatchEntity, MatchStats},
    dto::{format_timestamp, public::PlayerSummary, validation::validate_trimmed_name},
    state::lifecycle::MatchPhase,
};

/// Credentials presented to the login route.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    /// Admin account email.
    #[validate(email)]
    pub email: String,
    /// Plaintext password, checked against the stored bcrypt hash.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Successful login payload.
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Bearer token for subsequent admin calls, valid for one week.
    pub token: String,
    /// Email of the authenticated admin.
    pub email: String,
    /// The group this session manages.
    pub group_id: Uuid,
}

/// Request to log a new match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateMatchRequest {
    /// Scheduled date, RFC3339.
    #[validate(length(min = 1))]
    pub date: String,
    /// Optional free-text objective.
    pub match_goal: Option<String>,
    /// Optional video reference.
    pub video_url: Option<String>,
}

/// Admin view of a match, flags included.
#[derive(Debug, Serialize, ToSchema)]
pub struct MatchResponse {
    /// Match identifier.
    pub id: Uuid,
    /// Scheduled date, RFC3339.
    pub date: String,
    /// Lifecycle phase.
    pub phase: MatchPhase,
    /// Attendee player ids.
    pub attendees: Vec<Uuid>,
    /// Restricted candidate list; empty means every attendee is eligible.
    pub mvp_candidates: Vec<Uuid>,
    /// MVP winner once voting closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mvp_winner_id: Option<Uuid>,
    /// Free-text objective, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_goal: Option<String>,
    /// Video reference, when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    /// Concurrency token; echo it back with the next mutation.
    pub version: i64,
}

impl From<MatchEntity> for MatchResponse {
    fn from(entity: MatchEntity) -> Self {
        let phase = entity.phase();
        Self {
            id: entity.id,
            date: format_timestamp(entity.date),
            phase,
            attendees: entity.attendees,
            mvp_candidates: entity.mvp_candidates,
            mvp_winner_id: entity.mvp_winner_id,
            match_goal: entity.match_goal,
            video_url: entity.video_url,
            version: entity.version,
        }
    }
}

/// Request replacing a match's attendee list.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttendanceRequest {
    /// Match to update.
    pub match_id: Uuid,
    /// Full attendee list; missing players are marked absent.
    pub attendees: Vec<Uuid>,
}

/// Request replacing a match's recorded stats.
///
/// Maps are keyed by player id; absent players are treated as zero, so
/// removing a key retracts the previously recorded count.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StatsUpdateRequest {
    /// Match to update.
    pub match_id: Uuid,
    /// Goals per player.
    #[serde(default)]
    pub goals: BTreeMap<Uuid, i64>,
    /// Assists per player.
    #[serde(default)]
    pub assists: BTreeMap<Uuid, i64>,
    /// Saves per player.
    #[serde(default)]
    pub saves: BTreeMap<Uuid, i64>,
}

impl StatsUpdateRequest {
    /// Convert to the stored representation (string-keyed maps).
    pub fn to_match_stats(&self) -> MatchStats {
        fn keyed(map: &BTreeMap<Uuid, i64>) -> BTreeMap<String, i64> {
            map.iter()
                .map(|(id, count)| (id.to_string(), *count))
                .collect()
        }

        MatchStats {
            goals: keyed(&self.goals),
            assists: keyed(&self.assists),
            saves: keyed(&self.saves),
        }
    }
}

/// Request updating a match's free-text metadata.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMatchRequest {
    /// Match to update.
    pub match_id: Uuid,
    /// New objective text; `null` leaves the current value untouched.
    pub match_goal: Option<String>,
    /// New video reference; `null` leaves the current value untouched.
    pub video_url: Option<String>,
}

/// Request opening the MVP poll.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartVotingRequest {
    /// Match whose poll opens.
    pub match_id: Uuid,
    /// Candidate list; must be non-empty and a subset of the attendees.
    pub candidates: Vec<Uuid>,
}

/// Request closing the MVP poll.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CloseVotingRequest {
    /// Match whose poll closes.
    pub match_id: Uuid,
}

/// Result of closing a poll.
#[derive(Debug, Serialize, ToSchema)]
pub struct CloseVotingResponse {
    /// Id of the winning candidate.
    pub winner_id: Uuid,
    /// Winner details, absent when the player record no longer resolves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<PlayerSummary>,
    /// Total ballots counted.
    pub total_votes: u64,
}

/// Request ending a match.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EndMatchRequest {
    /// Match to freeze.
    pub match_id: Uuid,
}

/// Request deleting a match; requires the admin password again.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DeleteMatchRequest {
    /// Match to delete.
    pub match_id: Uuid,
    /// The admin's password, re-checked before the destructive path runs.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Request registering a new player.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddPlayerRequest {
    /// Player name, unique within the group.
    #[validate(custom(function = "validate_trimmed_name"))]
    pub name: String,
    /// Optional photo reference.
    #[serde(default)]
    pub photo_url: String,
}

/// Request renaming a player or replacing their photo.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct EditPlayerRequest {
    /// Player to update.
    pub player_id: Uuid,
    /// New name; must stay unique among the group's other players.
    #[validate(custom(function = "validate_trimmed_name"))]
    pub name: String,
    /// New photo reference.
    #[serde(default)]
    pub photo_url: String,
}

/// Request removing a player.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeletePlayerRequest {
    /// Player to remove; rejected while attendance history exists.
    pub player_id: Uuid,
}

/// Request registering several players at once.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct BulkAddPlayersRequest {
    /// Names to register; duplicates and invalid entries are skipped.
    #[validate(length(min = 1))]
    pub names: Vec<String>,
}

/// One name the bulk add could not register.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct SkippedPlayer {
    /// The offending name as submitted.
    pub name: String,
    /// Why it was skipped.
    pub reason: String,
}

/// Partial-success outcome of a bulk player add.
#[derive(Debug, Serialize, ToSchema)]
pub struct BulkAddPlayersResponse {
    /// Players that were registered.
    pub added: Vec<PlayerSummary>,
    /// Names that were skipped, each with a reason.
    pub skipped: Vec<SkippedPlayer>,
}

/// Request creating a random team split.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateShuffleRequest {
    /// Players to distribute; all must belong to the admin's group.
    #[validate(length(min = 2))]
    pub player_ids: Vec<Uuid>,
    /// Number of teams to produce.
    #[validate(range(min = 2))]
    pub num_teams: usize,
}

/// Request removing a team-randomization record.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteShuffleRequest {
    /// Record to remove.
    pub shuffle_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_voting_response_reports_winner_id_without_details() {
        let winner_id = Uuid::new_v4();
        let response = CloseVotingResponse {
            winner_id,
            winner: None,
            total_votes: 4,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["winner_id"], winner_id.to_string());
        assert_eq!(value["total_votes"], 4);
        assert!(value.get("winner").is_none());
    }

    #[test]
    fn close_voting_response_includes_resolved_winner() {
        let winner_id = Uuid::new_v4();
        let response = CloseVotingResponse {
            winner_id,
            winner: Some(PlayerSummary {
                id: winner_id,
                name: "Dana".into(),
                photo_url: String::new(),
                goals: 3,
                assists: 1,
                saves: 0,
                mvp: 2,
                appearances: 5,
            }),
            total_votes: 4,
        };

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["winner"]["name"], "Dana");
    }
}
