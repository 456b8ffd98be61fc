use crate::handlers::login;
use crate::state::AppState;
use axum::{routing::post, Router};

pub fn auth_routes(state: AppState) -> Router {
    Router::new().route("/login", post(login)).with_state(state)
}
