//! In-process DataStore. Used by the HTTP tests and `STORE=memory`.

use crate::config::{AccountTables, KeyKind, ResolvedEntity, TableRef};
use crate::error::AppError;
use crate::store::{account, Account, DataStore, Record, RecordKey};
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Table {
    /// Insertion order.
    rows: Vec<Record>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a raw row into `schema.table` without descriptor checks (seeding login data).
    pub async fn seed(&self, schema: &str, table: &str, row: Record) {
        let mut tables = self.tables.write().await;
        tables.entry(format!("{}.{}", schema, table)).or_default().rows.push(row);
    }
}

fn table_key(entity: &ResolvedEntity) -> String {
    format!("{}.{}", entity.schema_name, entity.table_name)
}

/// Project onto the entity's columns; absent columns read as null.
fn project(entity: &ResolvedEntity, row: &Record) -> Record {
    entity
        .columns
        .iter()
        .map(|c| (c.name.clone(), row.get(&c.name).cloned().unwrap_or(Value::Null)))
        .collect()
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => s == &n.to_string(),
        _ => a == b,
    }
}

fn matches(entity: &ResolvedEntity, row: &Record, key: &RecordKey) -> bool {
    let get = |c: &str| row.get(c).unwrap_or(&Value::Null);
    match key {
        RecordKey::Surrogate(id) => !id.is_null() && scalar_eq(get(entity.key_column()), id),
        RecordKey::Composite(parts) => parts
            .iter()
            .all(|(c, v)| (!v.is_null() || entity.null_safe(c)) && scalar_eq(get(c), v)),
    }
}

/// Ascending comparison; nulls sort last like PostgreSQL.
fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Number(n), Value::Number(m)) => n
            .as_f64()
            .partial_cmp(&m.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(s), Value::String(t)) => s.cmp(t),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn list(&self, entity: &ResolvedEntity) -> Result<Vec<Record>, AppError> {
        let tables = self.tables.read().await;
        let Some(t) = tables.get(&table_key(entity)) else {
            return Ok(Vec::new());
        };
        let col = &entity.order.column;
        let mut rows: Vec<Record> = t.rows.iter().map(|r| project(entity, r)).collect();
        if entity.order.descending {
            // Later inserts first on ties.
            rows.reverse();
            rows.sort_by(|a, b| {
                let (x, y) = (a.get(col).unwrap_or(&Value::Null), b.get(col).unwrap_or(&Value::Null));
                match (x.is_null(), y.is_null()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => compare(y, x),
                }
            });
        } else {
            rows.sort_by(|a, b| compare(a.get(col).unwrap_or(&Value::Null), b.get(col).unwrap_or(&Value::Null)));
        }
        Ok(rows)
    }

    async fn list_column(&self, entity: &ResolvedEntity, column: &str) -> Result<Vec<Record>, AppError> {
        let tables = self.tables.read().await;
        let mut out: Vec<Record> = tables
            .get(&table_key(entity))
            .map(|t| {
                t.rows
                    .iter()
                    .map(|r| {
                        let mut m = Record::new();
                        m.insert(column.to_string(), r.get(column).cloned().unwrap_or(Value::Null));
                        m
                    })
                    .collect()
            })
            .unwrap_or_default();
        out.sort_by(|a, b| compare(a.get(column).unwrap_or(&Value::Null), b.get(column).unwrap_or(&Value::Null)));
        Ok(out)
    }

    async fn fetch(&self, entity: &ResolvedEntity, key: &RecordKey) -> Result<Option<Record>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&table_key(entity))
            .and_then(|t| t.rows.iter().find(|r| matches(entity, r, key)))
            .map(|r| project(entity, r)))
    }

    async fn insert(&self, entity: &ResolvedEntity, record: &Record) -> Result<Record, AppError> {
        let mut tables = self.tables.write().await;
        let t = tables.entry(table_key(entity)).or_default();
        let mut row = project(entity, record);
        let key_col = entity.key_column().to_string();
        let key_missing = row.get(&key_col).map(Value::is_null).unwrap_or(true);
        if key_missing && entity.key.generated && entity.key.kind == KeyKind::Integer {
            t.next_id += 1;
            row.insert(key_col.clone(), Value::from(t.next_id));
        } else if let Some(Value::Number(n)) = row.get(&key_col) {
            if let Some(i) = n.as_i64() {
                t.next_id = t.next_id.max(i);
            }
        }
        let key = row.get(&key_col).cloned().unwrap_or(Value::Null);
        if key.is_null() {
            return Err(AppError::Store(format!("null value in column \"{}\"", key_col)));
        }
        let probe = RecordKey::Surrogate(key);
        if t.rows.iter().any(|r| matches(entity, r, &probe)) {
            return Err(AppError::Store(format!(
                "duplicate key value violates unique constraint on {}",
                key_col
            )));
        }
        t.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, entity: &ResolvedEntity, key: &Value, record: &Record) -> Result<Option<Record>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(t) = tables.get_mut(&table_key(entity)) else {
            return Ok(None);
        };
        let probe = RecordKey::Surrogate(key.clone());
        let Some(row) = t.rows.iter_mut().find(|r| matches(entity, r, &probe)) else {
            return Ok(None);
        };
        for c in &entity.columns {
            if c.name == entity.key_column() || c.name == crate::config::CREATED_AT {
                continue;
            }
            if let Some(v) = record.get(&c.name) {
                row.insert(c.name.clone(), v.clone());
            }
        }
        Ok(Some(project(entity, row)))
    }

    async fn delete(&self, entity: &ResolvedEntity, key: &RecordKey) -> Result<Vec<Record>, AppError> {
        let mut tables = self.tables.write().await;
        let Some(t) = tables.get_mut(&table_key(entity)) else {
            return Ok(Vec::new());
        };
        let (removed, kept): (Vec<Record>, Vec<Record>) =
            t.rows.drain(..).partition(|r| matches(entity, r, key));
        t.rows = kept;
        Ok(removed.iter().map(|r| project(entity, r)).collect())
    }

    async fn find_account(&self, accounts: &AccountTables, username: &str) -> Result<Option<Account>, AppError> {
        let tables = self.tables.read().await;
        let lookup = |table: &TableRef, column: &str| -> Option<Record> {
            tables.get(&format!("{}.{}", table.schema, table.table)).and_then(|t| {
                t.rows
                    .iter()
                    .find(|r| r.get(column).and_then(Value::as_str) == Some(username))
                    .cloned()
            })
        };
        let Some(mut joined) = lookup(&accounts.users, account::USERID) else {
            return Ok(None);
        };
        let student = lookup(&accounts.students, account::STUDENT_USERID);
        let teacher = lookup(&accounts.teachers, account::TEACHER_USERID);
        let joins: [(Option<Record>, &[&str]); 2] = [
            (
                student,
                &[account::STUDENT_USERID, account::STUDENT_SEMESTER, account::STUDENT_SECTION],
            ),
            (teacher, &[account::TEACHER_USERID, account::TEACHER_ID]),
        ];
        for (src, cols) in joins {
            for &c in cols {
                let v = src.as_ref().and_then(|r| r.get(c)).cloned().unwrap_or(Value::Null);
                joined.insert(c.to_string(), v);
            }
        }
        Ok(Some(Account::from_record(&joined)))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_catalog, resolve, ResolvedModel};
    use serde_json::json;

    fn model() -> ResolvedModel {
        resolve(&builtin_catalog().unwrap()).unwrap()
    }

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn generated_keys_increment() {
        let m = model();
        let routine = m.entity("daily_routine").unwrap();
        let store = MemoryStore::new();
        let a = store.insert(routine, &rec(json!({"drslot": "1"}))).await.unwrap();
        let b = store.insert(routine, &rec(json!({"drslot": "2"}))).await.unwrap();
        assert_eq!(a["routineid"], json!(1));
        assert_eq!(b["routineid"], json!(2));
    }

    #[tokio::test]
    async fn duplicate_key_is_a_store_error() {
        let m = model();
        let course = m.entity("course").unwrap();
        let store = MemoryStore::new();
        store.insert(course, &rec(json!({"courseid": "C1"}))).await.unwrap();
        let err = store.insert(course, &rec(json!({"courseid": "C1"}))).await.unwrap_err();
        assert!(matches!(err, AppError::Store(_)));
    }

    #[tokio::test]
    async fn composite_null_matches_only_on_nullable_columns() {
        let m = model();
        let routine = m.entity("daily_routine").unwrap();
        let store = MemoryStore::new();
        store
            .insert(routine, &rec(json!({"drslot": "1", "drdate": "2024-01-01"})))
            .await
            .unwrap();
        store.insert(routine, &rec(json!({"drslot": "1", "drdate": null}))).await.unwrap();

        // drdayofweek is null in both rows but is compared with plain equality.
        let strict = RecordKey::Composite(vec![
            ("drdayofweek".into(), Value::Null),
            ("drslot".into(), json!("1")),
            ("drdate".into(), Value::Null),
        ]);
        assert!(store.delete(routine, &strict).await.unwrap().is_empty());

        let key = RecordKey::Composite(vec![("drslot".into(), json!("1")), ("drdate".into(), Value::Null)]);
        let removed = store.delete(routine, &key).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0]["drdate"], Value::Null);
        assert_eq!(store.list(routine).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn account_joins_student_and_teacher() {
        let store = MemoryStore::new();
        store
            .seed("public", "master_user", rec(json!({"userid": "amy", "userpwd": "pw", "userroles": "TEACHER", "useractive": true})))
            .await;
        store
            .seed("public", "master_teacher", rec(json!({"teacherid": "T9", "teacheruserid": "amy"})))
            .await;
        let tables = AccountTables::default();
        let acct = store.find_account(&tables, "amy").await.unwrap().unwrap();
        assert!(acct.active);
        assert_eq!(acct.teacher_id, json!("T9"));
        assert_eq!(acct.student_userid, Value::Null);
        assert!(store.find_account(&tables, "bob").await.unwrap().is_none());
    }
}
