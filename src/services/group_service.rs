//! Group discovery and join-code resolution.

use uuid::Uuid;

use crate::{
    dto::public::{GroupSummary, JoinGroupRequest},
    error::ServiceError,
    state::SharedState,
};

/// All groups, sorted by name.
pub async fn list_groups(state: &SharedState) -> Result<Vec<GroupSummary>, ServiceError> {
    let store = state.store().await?;
    let groups = store.list_groups().await?;
    Ok(groups.into_iter().map(GroupSummary::from).collect())
}

/// One group by id.
pub async fn get_group(state: &SharedState, id: Uuid) -> Result<GroupSummary, ServiceError> {
    let store = state.store().await?;
    store
        .find_group(id)
        .await?
        .map(GroupSummary::from)
        .ok_or_else(|| ServiceError::NotFound(format!("group {id}")))
}

/// Resolve a join code (case-insensitive) to its group.
pub async fn join_group(
    state: &SharedState,
    payload: JoinGroupRequest,
) -> Result<GroupSummary, ServiceError> {
    let store = state.store().await?;
    let code = payload.code.trim().to_uppercase();

    store
        .find_group_by_code(&code)
        .await?
        .map(GroupSummary::from)
        .ok_or_else(|| ServiceError::NotFound("no group matches that join code".into()))
}
