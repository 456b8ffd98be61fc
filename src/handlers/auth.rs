//! POST /login.

use crate::error::AppError;
use crate::service::{AuthService, LoginRequest, LoginResponse};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    // A missing or malformed body is treated as missing credentials.
    let req = payload.map(|Json(r)| r).unwrap_or_default();
    let resp = AuthService::login(state.store.as_ref(), &state.model, &req).await?;
    Ok(Json(resp))
}
