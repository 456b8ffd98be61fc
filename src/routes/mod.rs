//! Router assembly.

mod auth;
mod common;
mod entity;

pub use auth::auth_routes;
pub use common::common_routes;
pub use entity::entity_routes;

use crate::state::AppState;
use axum::Router;

/// Every route of the service: common, login, and one router per entity under `api_prefix`.
pub fn app_router(state: AppState, api_prefix: &str) -> Router {
    common_routes(state.clone())
        .merge(auth_routes(state.clone()))
        .merge(entity_routes(state, api_prefix))
}
