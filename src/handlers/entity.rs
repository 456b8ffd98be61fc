//! Entity CRUD handlers: list, get, create, update, delete, composite find/delete, selectors.

use crate::error::AppError;
use crate::response::{self, Mutation};
use crate::service::CrudService;
use crate::state::EntityState;
use crate::store::Record;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e.body_text())))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    params
        .map(|Query(p)| p)
        .map_err(|e| AppError::BadRequest(format!("Invalid query string: {}", e.body_text())))
}

fn object(value: Value) -> Result<Record, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("Request body must be a JSON object".into())),
    }
}

pub async fn list(State(s): State<EntityState>) -> Result<Json<Value>, AppError> {
    let rows = CrudService::list(s.app.store.as_ref(), &s.entity).await?;
    Ok(Json(response::list_body(&s.entity, rows)))
}

/// Same rows as `list`, always a bare array.
pub async fn list_bare(State(s): State<EntityState>) -> Result<Json<Value>, AppError> {
    let rows = CrudService::list(s.app.store.as_ref(), &s.entity).await?;
    Ok(Json(response::bare_list(rows)))
}

pub async fn select_column(s: EntityState, column: String) -> Result<Json<Value>, AppError> {
    let rows = CrudService::select_column(s.app.store.as_ref(), &s.entity, &column).await?;
    Ok(Json(response::bare_list(rows)))
}

pub async fn read(State(s): State<EntityState>, Path(id): Path<String>) -> Result<Json<Value>, AppError> {
    let row = CrudService::get(s.app.store.as_ref(), &s.entity, &id).await?;
    Ok(Json(response::item_body(&s.entity, row)))
}

pub async fn create(
    State(s): State<EntityState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let payload = body(payload)?;
    let row = CrudService::create(s.app.store.as_ref(), &s.entity, &payload).await?;
    Ok(response::mutation(&s.entity, Mutation::Added, row))
}

pub async fn update(
    State(s): State<EntityState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let payload = body(payload)?;
    let row = CrudService::update(s.app.store.as_ref(), &s.entity, &id, &payload).await?;
    Ok(response::mutation(&s.entity, Mutation::Updated, row))
}

pub async fn delete(
    State(s): State<EntityState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let row = CrudService::delete(s.app.store.as_ref(), &s.entity, &id).await?;
    Ok(response::mutation(&s.entity, Mutation::Deleted, row))
}

/// GET /find?field=value&...; absent lookup fields are null.
pub async fn find(
    State(s): State<EntityState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Value>, AppError> {
    let input: Record = query(params)?
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    let row = CrudService::find_by_composite(s.app.store.as_ref(), &s.entity, &input).await?;
    Ok(Json(response::item_body(&s.entity, row)))
}

/// DELETE /delete with the lookup fields in the JSON body.
pub async fn delete_composite(
    State(s): State<EntityState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let input = object(body(payload)?)?;
    let n = CrudService::delete_by_composite(s.app.store.as_ref(), &s.entity, &input).await?;
    Ok(response::deleted_count(&s.entity, n))
}
