//! DTOs for the unauthenticated routes: group discovery, leaderboards,
//! recent matches, team views and MVP voting.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{GroupEntity, MatchEntity, PlayerEntity, PlayerSnapshot, TeamShuffleEntity},
    dto::{format_timestamp, validation::validate_group_code},
    state::lifecycle::MatchPhase,
};

/// Public view of a group.
#[derive(Debug, Serialize, ToSchema)]
pub struct GroupSummary {
    /// Group identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: String,
}

impl From<GroupEntity> for GroupSummary {
    fn from(entity: GroupEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            description: entity.description,
        }
    }
}

/// Request to resolve a join code to a group.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinGroupRequest {
    /// 6-character join code, matched case-insensitively.
    #[validate(custom(function = "validate_group_code"))]
    pub code: String,
}

/// Public view of a player including their cumulative aggregates.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Player identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Photo reference, empty when none was set.
    pub photo_url: String,
    /// Cumulative goals.
    pub goals: i64,
    /// Cumulative assists.
    pub assists: i64,
    /// Cumulative saves.
    pub saves: i64,
    /// MVP titles won.
    pub mvp: i64,
    /// Matches attended.
    pub appearances: i64,
}

impl From<PlayerEntity> for PlayerSummary {
    fn from(entity: PlayerEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            photo_url: entity.photo_url,
            goals: entity.total_goals,
            assists: entity.total_assists,
            saves: entity.total_saves,
            mvp: entity.total_mvp,
            appearances: entity.total_appearances,
        }
    }
}

/// Five independently sorted projections of the same player set.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    /// Players sorted by goals, descending.
    pub goals: Vec<PlayerSummary>,
    /// Players sorted by assists, descending.
    pub assists: Vec<PlayerSummary>,
    /// Players sorted by saves, descending.
    pub saves: Vec<PlayerSummary>,
    /// Players sorted by MVP titles, descending.
    pub mvp: Vec<PlayerSummary>,
    /// Players sorted by appearances, descending.
    pub appearances: Vec<PlayerSummary>,
}

/// Request to cast an MVP ballot.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct VoteRequest {
    /// Match whose poll the ballot targets.
    pub match_id: Uuid,
    /// Free-form voter name; normalized before any comparison.
    #[validate(length(min = 1, max = 64))]
    pub voter_name: String,
    /// Candidate the ballot is cast for.
    pub player_id: Uuid,
}

/// Confirmation payload for a simple mutation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human-readable confirmation.
    pub message: String,
}

impl ActionResponse {
    /// Build a confirmation payload from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Live tally line for one candidate in an open poll.
#[derive(Debug, Serialize, ToSchema)]
pub struct CandidateTally {
    /// The candidate.
    pub player: PlayerSummary,
    /// Ballots cast for the candidate so far.
    pub votes: u64,
}

/// Public snapshot of the group's currently-open poll, if any.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoteStatusResponse {
    /// True when a poll is currently accepting ballots.
    pub active: bool,
    /// The match with the open poll.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
    /// Live per-candidate counts, insertion-ordered by first ballot.
    pub counts: Vec<CandidateTally>,
    /// Total ballots cast so far.
    pub total_votes: u64,
}

impl VoteStatusResponse {
    /// Snapshot representing "no poll is open right now".
    pub fn inactive() -> Self {
        Self {
            active: false,
            match_id: None,
            counts: Vec::new(),
            total_votes: 0,
        }
    }
}

/// Enriched view of a recently played match.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecentMatchResponse {
    /// Match identifier.
    pub id: Uuid,
    /// Scheduled date, RFC3339.
    pub date: String,
    /// Lifecycle phase of the match.
    pub phase: MatchPhase,
    /// Players who attended, with their aggregates.
    pub attendees: Vec<PlayerSummary>,
    /// MVP winner once voting closed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mvp_winner: Option<PlayerSummary>,
    /// Free-text objective, when one was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_goal: Option<String>,
    /// Video reference, when one was set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
}

impl RecentMatchResponse {
    /// Assemble the enriched view from the match and its resolved players.
    pub fn assemble(
        entity: &MatchEntity,
        attendees: Vec<PlayerSummary>,
        mvp_winner: Option<PlayerSummary>,
    ) -> Self {
        Self {
            id: entity.id,
            date: format_timestamp(entity.date),
            phase: entity.phase(),
            attendees,
            mvp_winner,
            match_goal: entity.match_goal.clone(),
            video_url: entity.video_url.clone(),
        }
    }
}

/// Public view of a captured player identity inside a team record.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamMember {
    /// Player id at capture time.
    pub id: Uuid,
    /// Name at capture time.
    pub name: String,
    /// Photo reference at capture time.
    pub photo_url: String,
}

impl From<PlayerSnapshot> for TeamMember {
    fn from(snapshot: PlayerSnapshot) -> Self {
        Self {
            id: snapshot.id,
            name: snapshot.name,
            photo_url: snapshot.photo_url,
        }
    }
}

/// Public view of a team-randomization record.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShuffleResponse {
    /// Record identifier.
    pub id: Uuid,
    /// Ordered teams of captured player identities.
    pub teams: Vec<Vec<TeamMember>>,
    /// Creation timestamp, RFC3339.
    pub created_at: String,
    /// Email of the admin who created the record.
    pub created_by: String,
}

impl From<TeamShuffleEntity> for ShuffleResponse {
    fn from(entity: TeamShuffleEntity) -> Self {
        Self {
            id: entity.id,
            teams: entity
                .teams
                .into_iter()
                .map(|team| team.into_iter().map(TeamMember::from).collect())
                .collect(),
            created_at: format_timestamp(entity.created_at),
            created_by: entity.created_by,
        }
    }
}
