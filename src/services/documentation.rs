use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the matchday backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::list_groups,
        crate::routes::public::get_group,
        crate::routes::public::join_group,
        crate::routes::public::list_players,
        crate::routes::public::leaderboard,
        crate::routes::public::latest_teams,
        crate::routes::public::recent_matches,
        crate::routes::public::cast_vote,
        crate::routes::public::vote_status,
        crate::routes::public::login,
        crate::routes::admin::create_match,
        crate::routes::admin::set_attendance,
        crate::routes::admin::update_stats,
        crate::routes::admin::update_match,
        crate::routes::admin::start_voting,
        crate::routes::admin::close_voting,
        crate::routes::admin::end_match,
        crate::routes::admin::delete_match,
        crate::routes::admin::add_player,
        crate::routes::admin::edit_player,
        crate::routes::admin::delete_player,
        crate::routes::admin::bulk_add_players,
        crate::routes::admin::create_teams,
        crate::routes::admin::delete_teams,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::public::GroupSummary,
            crate::dto::public::JoinGroupRequest,
            crate::dto::public::PlayerSummary,
            crate::dto::public::LeaderboardResponse,
            crate::dto::public::VoteRequest,
            crate::dto::public::ActionResponse,
            crate::dto::public::CandidateTally,
            crate::dto::public::VoteStatusResponse,
            crate::dto::public::RecentMatchResponse,
            crate::dto::public::TeamMember,
            crate::dto::public::ShuffleResponse,
            crate::dto::admin::LoginRequest,
            crate::dto::admin::LoginResponse,
            crate::dto::admin::CreateMatchRequest,
            crate::dto::admin::MatchResponse,
            crate::dto::admin::AttendanceRequest,
            crate::dto::admin::StatsUpdateRequest,
            crate::dto::admin::UpdateMatchRequest,
            crate::dto::admin::StartVotingRequest,
            crate::dto::admin::CloseVotingRequest,
            crate::dto::admin::CloseVotingResponse,
            crate::dto::admin::EndMatchRequest,
            crate::dto::admin::DeleteMatchRequest,
            crate::dto::admin::AddPlayerRequest,
            crate::dto::admin::EditPlayerRequest,
            crate::dto::admin::DeletePlayerRequest,
            crate::dto::admin::BulkAddPlayersRequest,
            crate::dto::admin::SkippedPlayer,
            crate::dto::admin::BulkAddPlayersResponse,
            crate::dto::admin::CreateShuffleRequest,
            crate::dto::admin::DeleteShuffleRequest,
            crate::state::lifecycle::MatchPhase,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Group discovery, read views and MVP voting"),
        (name = "admin", description = "Bearer-gated group management"),
    )
)]
pub struct ApiDoc;
