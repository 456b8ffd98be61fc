//! DataStore abstraction: the only component that talks to the relational backend.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::config::{AccountTables, ResolvedEntity};
use crate::error::AppError;
use async_trait::async_trait;
use serde_json::Value;

/// One row: column name to scalar (string, number, boolean or null).
pub type Record = serde_json::Map<String, Value>;

/// How a single row (or set of rows) is addressed.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordKey {
    /// Value of the entity's key column.
    Surrogate(Value),
    /// Column/value pairs. Null matches null only on the entity's nullable lookup columns.
    Composite(Vec<(String, Value)>),
}

/// Columns the account lookup returns, joined from the user, student and teacher tables.
pub mod account {
    pub const USERID: &str = "userid";
    pub const PASSWORD: &str = "userpwd";
    pub const ROLES: &str = "userroles";
    pub const ACTIVE: &str = "useractive";
    pub const STUDENT_USERID: &str = "stuuserid";
    pub const STUDENT_SEMESTER: &str = "stu_curr_semester";
    pub const STUDENT_SECTION: &str = "stu_section";
    pub const TEACHER_USERID: &str = "teacheruserid";
    pub const TEACHER_ID: &str = "teacherid";
}

/// User row plus optional student/teacher context, as read for login.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Account {
    pub password: Option<String>,
    pub roles: Option<String>,
    pub active: bool,
    pub student_userid: Value,
    pub student_semester: Value,
    pub student_section: Value,
    pub teacher_userid: Value,
    pub teacher_id: Value,
}

impl Account {
    pub fn from_record(r: &Record) -> Self {
        let field = |k: &str| r.get(k).cloned().unwrap_or(Value::Null);
        Account {
            password: r.get(account::PASSWORD).and_then(Value::as_str).map(String::from),
            roles: r.get(account::ROLES).and_then(Value::as_str).map(String::from),
            active: r.get(account::ACTIVE).map(truthy).unwrap_or(false),
            student_userid: field(account::STUDENT_USERID),
            student_semester: field(account::STUDENT_SEMESTER),
            student_section: field(account::STUDENT_SECTION),
            teacher_userid: field(account::TEACHER_USERID),
            teacher_id: field(account::TEACHER_ID),
        }
    }
}

/// Boolean reading of a stored flag; strings and numbers count when they spell true.
pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "t" | "1" | "yes" | "y" | "on"),
        _ => false,
    }
}

/// Backend operations. Every value reaches the backend as a bound parameter.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// All rows in the entity's list order.
    async fn list(&self, entity: &ResolvedEntity) -> Result<Vec<Record>, AppError>;

    /// One column of every row, ascending by that column.
    async fn list_column(&self, entity: &ResolvedEntity, column: &str) -> Result<Vec<Record>, AppError>;

    /// First row matching the key.
    async fn fetch(&self, entity: &ResolvedEntity, key: &RecordKey) -> Result<Option<Record>, AppError>;

    /// Insert one row; returns the stored row (with any generated key).
    async fn insert(&self, entity: &ResolvedEntity, record: &Record) -> Result<Record, AppError>;

    /// Overwrite the given columns of the row with this key. None when no row matched.
    async fn update(&self, entity: &ResolvedEntity, key: &Value, record: &Record) -> Result<Option<Record>, AppError>;

    /// Hard delete; returns the removed rows.
    async fn delete(&self, entity: &ResolvedEntity, key: &RecordKey) -> Result<Vec<Record>, AppError>;

    /// User row with its student and teacher context, matched on the exact user id.
    async fn find_account(&self, tables: &AccountTables, username: &str) -> Result<Option<Account>, AppError>;

    async fn ping(&self) -> Result<(), AppError>;
}
