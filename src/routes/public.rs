use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        admin::{LoginRequest, LoginResponse},
        public::{
            ActionResponse, GroupSummary, JoinGroupRequest, LeaderboardResponse, PlayerSummary,
            RecentMatchResponse, ShuffleResponse, VoteRequest, VoteStatusResponse,
        },
    },
    error::AppError,
    services::{auth_service, group_service, match_service, player_service, team_service,
        voting_service},
    state::SharedState,
};

/// Query parameter selecting the group a public view is scoped to.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct GroupQuery {
    /// Identifier of the group to read.
    pub group_id: Uuid,
}

/// Unauthenticated endpoints: discovery, read views, voting and login.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/groups", get(list_groups))
        .route("/groups/join", post(join_group))
        .route("/groups/{id}", get(get_group))
        .route("/players", get(list_players))
        .route("/leaderboard", get(leaderboard))
        .route("/teams", get(latest_teams))
        .route("/matches/recent", get(recent_matches))
        .route("/vote", post(cast_vote))
        .route("/vote-status", get(vote_status))
        .route("/admin/login", post(login))
}

/// List every group, sorted by name.
#[utoipa::path(
    get,
    path = "/api/groups",
    tag = "public",
    responses((status = 200, description = "All groups", body = [GroupSummary]))
)]
pub async fn list_groups(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GroupSummary>>, AppError> {
    Ok(Json(group_service::list_groups(&state).await?))
}

/// Retrieve one group by its identifier.
#[utoipa::path(
    get,
    path = "/api/groups/{id}",
    tag = "public",
    params(("id" = Uuid, Path, description = "Identifier of the group")),
    responses((status = 200, description = "Group", body = GroupSummary))
)]
pub async fn get_group(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GroupSummary>, AppError> {
    Ok(Json(group_service::get_group(&state, id).await?))
}

/// Resolve a 6-character join code to its group.
#[utoipa::path(
    post,
    path = "/api/groups/join",
    tag = "public",
    request_body = JoinGroupRequest,
    responses((status = 200, description = "Matching group", body = GroupSummary))
)]
pub async fn join_group(
    State(state): State<SharedState>,
    Json(payload): Json<JoinGroupRequest>,
) -> Result<Json<GroupSummary>, AppError> {
    payload.validate()?;
    Ok(Json(group_service::join_group(&state, payload).await?))
}

/// List a group's players, sorted by name.
#[utoipa::path(
    get,
    path = "/api/players",
    tag = "public",
    params(GroupQuery),
    responses((status = 200, description = "Group players", body = [PlayerSummary]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<Vec<PlayerSummary>>, AppError> {
    Ok(Json(
        player_service::list_players(&state, query.group_id).await?,
    ))
}

/// Five independently sorted leaderboard projections for a group.
#[utoipa::path(
    get,
    path = "/api/leaderboard",
    tag = "public",
    params(GroupQuery),
    responses((status = 200, description = "Leaderboard projections", body = LeaderboardResponse))
)]
pub async fn leaderboard(
    State(state): State<SharedState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    Ok(Json(
        player_service::leaderboard(&state, query.group_id).await?,
    ))
}

/// The group's newest team randomization, or null when none exists.
#[utoipa::path(
    get,
    path = "/api/teams",
    tag = "public",
    params(GroupQuery),
    responses((status = 200, description = "Latest team split, or null when none exists", body = ShuffleResponse))
)]
pub async fn latest_teams(
    State(state): State<SharedState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<Option<ShuffleResponse>>, AppError> {
    Ok(Json(
        team_service::latest_shuffle(&state, query.group_id).await?,
    ))
}

/// The group's five most recent matches with player details resolved.
#[utoipa::path(
    get,
    path = "/api/matches/recent",
    tag = "public",
    params(GroupQuery),
    responses((status = 200, description = "Recent matches", body = [RecentMatchResponse]))
)]
pub async fn recent_matches(
    State(state): State<SharedState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<Vec<RecentMatchResponse>>, AppError> {
    Ok(Json(
        match_service::recent_matches(&state, query.group_id).await?,
    ))
}

/// Cast an MVP ballot for an open poll.
#[utoipa::path(
    post,
    path = "/api/vote",
    tag = "public",
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Ballot accepted", body = ActionResponse),
        (status = 409, description = "A ballot under that name was already cast")
    )
)]
pub async fn cast_vote(
    State(state): State<SharedState>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    voting_service::cast_vote(&state, payload).await?;
    Ok(Json(ActionResponse::new("vote recorded")))
}

/// Live status of the group's currently-open poll.
#[utoipa::path(
    get,
    path = "/api/vote-status",
    tag = "public",
    params(GroupQuery),
    responses((status = 200, description = "Poll status", body = VoteStatusResponse))
)]
pub async fn vote_status(
    State(state): State<SharedState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<VoteStatusResponse>, AppError> {
    Ok(Json(
        voting_service::vote_status(&state, query.group_id).await?,
    ))
}

/// Authenticate an admin and receive a bearer token for their group.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    tag = "public",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    payload.validate()?;
    Ok(Json(auth_service::login(&state, payload).await?))
}
