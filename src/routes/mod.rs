use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod docs;
pub mod health;
pub mod public;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = public::router().merge(admin::router(state.clone()));

    let root_router = health::router()
        .nest("/api", api_router)
        .merge(docs::router(state.clone()));

    root_router.with_state(state)
}
