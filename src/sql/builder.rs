//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from a resolved entity.
//! Identifiers come from descriptors only; every value is a `$n` parameter.

use crate::config::{AccountTables, ColumnKind, ResolvedEntity, TableRef, CREATED_AT};
use crate::store::{account, Record, RecordKey};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from config).
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    /// Push a value bound for `column` and return its cast placeholder (e.g. `$3::date`).
    fn placeholder(&mut self, entity: &ResolvedEntity, column: &str, v: Value) -> String {
        let n = self.push_param(v);
        match entity.column(column) {
            Some(c) => format!("${}::{}", n, c.pg_type()),
            None => format!("${}", n),
        }
    }
}

fn table(entity: &ResolvedEntity) -> String {
    qualified_table(&entity.schema_name, &entity.table_name)
}

fn table_ref(t: &TableRef) -> String {
    qualified_table(&t.schema, &t.table)
}

/// SELECT list: numeric as float8 so rows decode to JSON numbers.
fn select_column_list(entity: &ResolvedEntity) -> String {
    entity
        .columns
        .iter()
        .map(|c| {
            let q = quoted(&c.name);
            if c.kind == ColumnKind::Numeric {
                format!("{}::float8 AS {}", q, q)
            } else {
                q
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// WHERE predicate for a key. Composite parts use plain equality, except the
/// entity's nullable lookup columns where null also matches null.
fn key_predicate(q: &mut QueryBuf, entity: &ResolvedEntity, key: &RecordKey) -> String {
    match key {
        RecordKey::Surrogate(id) => {
            let ph = q.placeholder(entity, entity.key_column(), id.clone());
            format!("{} = {}", quoted(entity.key_column()), ph)
        }
        RecordKey::Composite(parts) => parts
            .iter()
            .map(|(col, v)| {
                let ph = q.placeholder(entity, col, v.clone());
                let c = quoted(col);
                if entity.null_safe(col) {
                    format!("({c} = {ph} OR ({ph} IS NULL AND {c} IS NULL))")
                } else {
                    format!("{c} = {ph}")
                }
            })
            .collect::<Vec<_>>()
            .join(" AND "),
    }
}

/// SELECT all rows ordered by the entity's list order.
pub fn select_list(entity: &ResolvedEntity) -> QueryBuf {
    let mut q = QueryBuf::new();
    let dir = if entity.order.descending { "DESC" } else { "ASC" };
    q.sql = format!(
        "SELECT {} FROM {} ORDER BY {} {}",
        select_column_list(entity),
        table(entity),
        quoted(&entity.order.column),
        dir
    );
    q
}

/// SELECT one column of every row, ascending (dropdown selectors).
pub fn select_column(entity: &ResolvedEntity, column: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let c = quoted(column);
    q.sql = format!("SELECT {} FROM {} ORDER BY {} ASC", c, table(entity), c);
    q
}

/// SELECT first row matching the key.
pub fn select_by_key(entity: &ResolvedEntity, key: &RecordKey) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pred = key_predicate(&mut q, entity, key);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} LIMIT 1",
        select_column_list(entity),
        table(entity),
        pred
    );
    q
}

/// INSERT every column present in the record, in declared order. RETURNING the stored row.
pub fn insert(entity: &ResolvedEntity, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in &entity.columns {
        let Some(v) = record.get(&c.name) else { continue };
        placeholders.push(q.placeholder(entity, &c.name, v.clone()));
        cols.push(quoted(&c.name));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        table(entity),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(entity)
    );
    q
}

/// UPDATE by key: SET every record column except the key and the creation stamp.
pub fn update(entity: &ResolvedEntity, id: &Value, record: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        if c.name == entity.key_column() || c.name == CREATED_AT {
            continue;
        }
        let Some(v) = record.get(&c.name) else { continue };
        let ph = q.placeholder(entity, &c.name, v.clone());
        sets.push(format!("{} = {}", quoted(&c.name), ph));
    }
    if sets.is_empty() {
        return select_by_key(entity, &RecordKey::Surrogate(id.clone()));
    }
    let pred = key_predicate(&mut q, entity, &RecordKey::Surrogate(id.clone()));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} RETURNING {}",
        table(entity),
        sets.join(", "),
        pred,
        select_column_list(entity)
    );
    q
}

/// DELETE by key. RETURNING the removed rows.
pub fn delete(entity: &ResolvedEntity, key: &RecordKey) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pred = key_predicate(&mut q, entity, key);
    q.sql = format!(
        "DELETE FROM {} WHERE {} RETURNING {}",
        table(entity),
        pred,
        select_column_list(entity)
    );
    q
}

/// User plus optional student and teacher context in one query.
pub fn account_lookup(tables: &AccountTables, username: &str) -> QueryBuf {
    use account::*;
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::String(username.to_string()));
    q.sql = format!(
        "SELECT mu.{pwd}, mu.{roles}, mu.{active}, sm.{stu_uid}, sm.{stu_sem}, sm.{stu_sec}, mt.{t_uid}, mt.{t_id} \
         FROM {users} mu \
         LEFT JOIN {students} sm ON sm.{stu_uid} = mu.{uid} \
         LEFT JOIN {teachers} mt ON mt.{t_uid} = mu.{uid} \
         WHERE mu.{uid} = ${n}::text LIMIT 1",
        uid = quoted(USERID),
        pwd = quoted(PASSWORD),
        roles = quoted(ROLES),
        active = quoted(ACTIVE),
        stu_uid = quoted(STUDENT_USERID),
        stu_sem = quoted(STUDENT_SEMESTER),
        stu_sec = quoted(STUDENT_SECTION),
        t_uid = quoted(TEACHER_USERID),
        t_id = quoted(TEACHER_ID),
        users = table_ref(&tables.users),
        students = table_ref(&tables.students),
        teachers = table_ref(&tables.teachers),
    );
    q
}
