use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    routing::{delete, post, put},
};
use validator::Validate;

use crate::{
    auth::{AdminContext, require_admin},
    dto::{
        admin::{
            AddPlayerRequest, AttendanceRequest, BulkAddPlayersRequest, BulkAddPlayersResponse,
            CloseVotingRequest, CloseVotingResponse, CreateMatchRequest, CreateShuffleRequest,
            DeleteMatchRequest, DeletePlayerRequest, DeleteShuffleRequest, EditPlayerRequest,
            EndMatchRequest, MatchResponse, StartVotingRequest, StatsUpdateRequest,
            UpdateMatchRequest,
        },
        public::{PlayerSummary, ShuffleResponse},
    },
    error::AppError,
    services::{match_service, player_service, team_service, voting_service},
    state::SharedState,
};

/// Bearer-gated management endpoints for the admin's own group.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/match/create", post(create_match))
        .route("/admin/match/attendance", post(set_attendance))
        .route("/admin/match/update", post(update_match))
        .route("/admin/match/end", post(end_match))
        .route("/admin/match/delete", delete(delete_match))
        .route("/admin/stats/update", post(update_stats))
        .route("/admin/voting/start", post(start_voting))
        .route("/admin/voting/close", post(close_voting))
        .route("/admin/players/add", post(add_player))
        .route("/admin/players/edit", put(edit_player))
        .route("/admin/players/delete", delete(delete_player))
        .route("/admin/players/bulk-add", post(bulk_add_players))
        .route("/admin/teams/create", post(create_teams))
        .route("/admin/teams/delete", delete(delete_teams))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}

/// Log a new match for the admin's group.
#[utoipa::path(
    post,
    path = "/api/admin/match/create",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = CreateMatchRequest,
    responses((status = 200, description = "Match created", body = MatchResponse))
)]
pub async fn create_match(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<CreateMatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        match_service::create_match(&state, &admin, payload).await?,
    ))
}

/// Replace a match's attendee list and reconcile appearance counters.
#[utoipa::path(
    post,
    path = "/api/admin/match/attendance",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = AttendanceRequest,
    responses(
        (status = 200, description = "Attendance updated", body = MatchResponse),
        (status = 409, description = "Match ended or concurrently modified")
    )
)]
pub async fn set_attendance(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<AttendanceRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(
        match_service::set_attendance(&state, &admin, payload).await?,
    ))
}

/// Replace a match's stat maps and reconcile cumulative counters.
#[utoipa::path(
    post,
    path = "/api/admin/stats/update",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = StatsUpdateRequest,
    responses(
        (status = 200, description = "Stats updated", body = MatchResponse),
        (status = 409, description = "Match ended or concurrently modified")
    )
)]
pub async fn update_stats(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<StatsUpdateRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(
        match_service::update_stats(&state, &admin, payload).await?,
    ))
}

/// Update a match's objective text or video reference.
#[utoipa::path(
    post,
    path = "/api/admin/match/update",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = UpdateMatchRequest,
    responses((status = 200, description = "Match updated", body = MatchResponse))
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<UpdateMatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(
        match_service::update_match(&state, &admin, payload).await?,
    ))
}

/// Open the MVP poll with a candidate list.
#[utoipa::path(
    post,
    path = "/api/admin/voting/start",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = StartVotingRequest,
    responses(
        (status = 200, description = "Voting opened", body = MatchResponse),
        (status = 409, description = "Poll already opened or match ended")
    )
)]
pub async fn start_voting(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<StartVotingRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(
        voting_service::start_voting(&state, &admin, payload).await?,
    ))
}

/// Close the MVP poll, record the winner and credit their title.
#[utoipa::path(
    post,
    path = "/api/admin/voting/close",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = CloseVotingRequest,
    responses(
        (status = 200, description = "Voting closed", body = CloseVotingResponse),
        (status = 409, description = "No ballots cast or poll not open")
    )
)]
pub async fn close_voting(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<CloseVotingRequest>,
) -> Result<Json<CloseVotingResponse>, AppError> {
    Ok(Json(
        voting_service::close_voting(&state, &admin, payload).await?,
    ))
}

/// End a match, freezing attendance, stats and voting for good.
#[utoipa::path(
    post,
    path = "/api/admin/match/end",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = EndMatchRequest,
    responses(
        (status = 200, description = "Match ended", body = MatchResponse),
        (status = 409, description = "Ending is not allowed while voting is open")
    )
)]
pub async fn end_match(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<EndMatchRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    Ok(Json(
        match_service::end_match(&state, &admin, payload).await?,
    ))
}

/// Delete a match after password confirmation, reversing its aggregates.
#[utoipa::path(
    delete,
    path = "/api/admin/match/delete",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = DeleteMatchRequest,
    responses((status = 204, description = "Match deleted and aggregates reversed"))
)]
pub async fn delete_match(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<DeleteMatchRequest>,
) -> Result<StatusCode, AppError> {
    payload.validate()?;
    match_service::delete_match(&state, &admin, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Register a new player with zeroed counters.
#[utoipa::path(
    post,
    path = "/api/admin/players/add",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = AddPlayerRequest,
    responses(
        (status = 200, description = "Player registered", body = PlayerSummary),
        (status = 409, description = "Name already taken in this group")
    )
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<AddPlayerRequest>,
) -> Result<Json<PlayerSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        player_service::add_player(&state, &admin, payload).await?,
    ))
}

/// Rename a player or replace their photo.
#[utoipa::path(
    put,
    path = "/api/admin/players/edit",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = EditPlayerRequest,
    responses((status = 200, description = "Player updated", body = PlayerSummary))
)]
pub async fn edit_player(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<EditPlayerRequest>,
) -> Result<Json<PlayerSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        player_service::edit_player(&state, &admin, payload).await?,
    ))
}

/// Remove a player without attendance history.
#[utoipa::path(
    delete,
    path = "/api/admin/players/delete",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = DeletePlayerRequest,
    responses(
        (status = 204, description = "Player removed"),
        (status = 409, description = "Player has attendance history")
    )
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<DeletePlayerRequest>,
) -> Result<StatusCode, AppError> {
    player_service::delete_player(&state, &admin, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Register several players at once; invalid names are reported, not fatal.
#[utoipa::path(
    post,
    path = "/api/admin/players/bulk-add",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = BulkAddPlayersRequest,
    responses((status = 200, description = "Partial-success outcome", body = BulkAddPlayersResponse))
)]
pub async fn bulk_add_players(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<BulkAddPlayersRequest>,
) -> Result<Json<BulkAddPlayersResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        player_service::bulk_add_players(&state, &admin, payload).await?,
    ))
}

/// Create a random team split over the selected players.
#[utoipa::path(
    post,
    path = "/api/admin/teams/create",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = CreateShuffleRequest,
    responses((status = 200, description = "Team split created", body = ShuffleResponse))
)]
pub async fn create_teams(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<CreateShuffleRequest>,
) -> Result<Json<ShuffleResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        team_service::create_shuffle(&state, &admin, payload).await?,
    ))
}

/// Remove a team split belonging to the admin's group.
#[utoipa::path(
    delete,
    path = "/api/admin/teams/delete",
    tag = "admin",
    params(("Authorization" = String, Header, description = "Bearer token from /api/admin/login")),
    request_body = DeleteShuffleRequest,
    responses((status = 204, description = "Team split removed"))
)]
pub async fn delete_teams(
    State(state): State<SharedState>,
    Extension(admin): Extension<AdminContext>,
    Json(payload): Json<DeleteShuffleRequest>,
) -> Result<StatusCode, AppError> {
    team_service::delete_shuffle(&state, &admin, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
