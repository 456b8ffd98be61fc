//! Response envelope helpers. Shape is decided per entity by its descriptor.

use crate::config::ResolvedEntity;
use crate::store::Record;
use axum::{http::StatusCode, Json};
use serde_json::{Map, Value};

/// `{<list key>: rows}` or a bare array when the entity has no list key.
pub fn list_body(entity: &ResolvedEntity, rows: Vec<Record>) -> Value {
    let rows = Value::Array(rows.into_iter().map(Value::Object).collect());
    match &entity.list_key {
        Some(k) => wrap(k, rows),
        None => rows,
    }
}

/// Rows as a bare array regardless of envelope (legacy list and selector routes).
pub fn bare_list(rows: Vec<Record>) -> Value {
    Value::Array(rows.into_iter().map(Value::Object).collect())
}

/// `{<item key>: row}` or the bare row.
pub fn item_body(entity: &ResolvedEntity, row: Record) -> Value {
    match &entity.item_key {
        Some(k) => wrap(k, Value::Object(row)),
        None => Value::Object(row),
    }
}

#[derive(Clone, Copy, Debug)]
pub enum Mutation {
    Added,
    Updated,
    Deleted,
}

impl Mutation {
    fn verb(self) -> &'static str {
        match self {
            Mutation::Added => "added",
            Mutation::Updated => "updated",
            Mutation::Deleted => "deleted",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            Mutation::Added => StatusCode::CREATED,
            Mutation::Updated | Mutation::Deleted => StatusCode::OK,
        }
    }
}

pub fn message(entity: &ResolvedEntity, m: Mutation) -> String {
    format!("{} {} successfully", entity.label, m.verb())
}

/// `{message, <key column>: key, <item key>: row}`; the row is omitted without an item key.
pub fn mutation(entity: &ResolvedEntity, m: Mutation, row: Record) -> (StatusCode, Json<Value>) {
    let mut body = Map::new();
    body.insert("message".into(), Value::String(message(entity, m)));
    let key = row.get(entity.key_column()).cloned().unwrap_or(Value::Null);
    body.insert(entity.key_column().to_string(), key);
    if let Some(k) = &entity.item_key {
        body.insert(k.clone(), Value::Object(row));
    }
    (m.status(), Json(Value::Object(body)))
}

/// `{message, deleted: n}` for composite deletes.
pub fn deleted_count(entity: &ResolvedEntity, n: usize) -> Json<Value> {
    Json(serde_json::json!({
        "message": message(entity, Mutation::Deleted),
        "deleted": n,
    }))
}

fn wrap(key: &str, v: Value) -> Value {
    let mut m = Map::new();
    m.insert(key.to_string(), v);
    Value::Object(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_catalog, resolve};
    use serde_json::json;

    #[test]
    fn envelopes_follow_descriptor() {
        let m = resolve(&builtin_catalog().unwrap()).unwrap();
        let row = json!({"teacherid": "T1"}).as_object().cloned().unwrap();
        assert_eq!(list_body(m.entity("teacher").unwrap(), vec![row.clone()]), json!([{"teacherid": "T1"}]));

        let course_row = json!({"courseid": "C1"}).as_object().cloned().unwrap();
        let course = m.entity("course").unwrap();
        assert_eq!(list_body(course, vec![course_row.clone()]), json!({"courses": [{"courseid": "C1"}]}));
        let (status, Json(body)) = mutation(course, Mutation::Added, course_row);
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["courseid"], json!("C1"));
        assert_eq!(body["course"], json!({"courseid": "C1"}));
        assert_eq!(body["message"], json!(format!("{} added successfully", course.label)));

        let (_, Json(body)) = mutation(m.entity("teacher").unwrap(), Mutation::Deleted, row);
        assert_eq!(body.as_object().map(|o| o.len()), Some(2));
    }
}
