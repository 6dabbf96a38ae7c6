/// Admin authentication against stored credentials.
pub mod auth_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Group discovery and join-code resolution.
pub mod group_service;
/// Health check service.
pub mod health_service;
/// Match logging, edits and deletion.
pub mod match_service;
/// Player roster management and leaderboards.
pub mod player_service;
/// Pure aggregate-delta computation.
pub mod reconcile;
/// Pure vote counting with the deterministic tie-break.
pub mod tally;
/// Random team splits.
pub mod team_service;
/// MVP poll lifecycle and ballots.
pub mod voting_service;
