//! Resolved entity model: descriptors validated and flattened for runtime use.

use crate::config::{ColumnKind, KeyKind, RoleConfig, ValidationRule};
use std::collections::HashMap;

/// Audit column stamped on insert.
pub const CREATED_AT: &str = "createdat";
/// Audit column stamped on every write.
pub const UPDATED_AT: &str = "updatedat";

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnInfo {
    /// PostgreSQL type used for parameter casts and DDL.
    pub fn pg_type(&self) -> &'static str {
        match self.kind {
            ColumnKind::Text => "text",
            ColumnKind::Integer => "bigint",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Boolean => "boolean",
            ColumnKind::Date => "date",
            ColumnKind::Timestamp => "timestamptz",
        }
    }

    pub fn is_audit(&self) -> bool {
        self.name == CREATED_AT || self.name == UPDATED_AT
    }
}

#[derive(Clone, Debug)]
pub struct KeySpec {
    pub column: String,
    pub kind: KeyKind,
    pub generated: bool,
}

#[derive(Clone, Debug)]
pub struct ListOrder {
    pub column: String,
    pub descending: bool,
}

#[derive(Clone, Debug)]
pub struct Selector {
    pub path: String,
    pub column: String,
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub name: String,
    pub label: String,
    pub schema_name: String,
    pub table_name: String,
    pub path_segment: String,
    pub aliases: Vec<String>,
    pub key: KeySpec,
    pub lookup: Vec<String>,
    pub lookup_nullable: Vec<String>,
    /// Declared columns followed by the audit columns when audited.
    pub columns: Vec<ColumnInfo>,
    pub required: Vec<String>,
    pub validation: HashMap<String, ValidationRule>,
    pub audit: bool,
    pub order: ListOrder,
    pub list_key: Option<String>,
    pub item_key: Option<String>,
    pub legacy_list_path: Option<String>,
    pub selectors: Vec<Selector>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn key_column(&self) -> &str {
        &self.key.column
    }

    /// Composite lookup on this column treats null as a matchable value.
    pub fn null_safe(&self, column: &str) -> bool {
        self.lookup_nullable.iter().any(|c| c == column)
    }

    /// Every path this entity is mounted under.
    pub fn mount_paths(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.path_segment.as_str()).chain(self.aliases.iter().map(String::as_str))
    }
}

/// Schema-qualified table name.
#[derive(Clone, Debug, PartialEq)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    fn public(table: &str) -> Self {
        TableRef {
            schema: "public".into(),
            table: table.into(),
        }
    }
}

/// Tables joined at login. Taken from the `user`, `student` and `teacher` entities
/// when the catalog declares them.
#[derive(Clone, Debug, PartialEq)]
pub struct AccountTables {
    pub users: TableRef,
    pub students: TableRef,
    pub teachers: TableRef,
}

impl Default for AccountTables {
    fn default() -> Self {
        AccountTables {
            users: TableRef::public("master_user"),
            students: TableRef::public("student_master"),
            teachers: TableRef::public("master_teacher"),
        }
    }
}

/// Ordered role-priority table consulted once per login.
#[derive(Clone, Debug, Default)]
pub struct RoleTable {
    pub entries: Vec<RoleConfig>,
}

impl RoleTable {
    /// First entry (in priority order) whose code is in the user's role set.
    pub fn resolve(&self, roles: &[String]) -> Option<&RoleConfig> {
        self.entries.iter().find(|e| roles.iter().any(|r| *r == e.code))
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedModel {
    pub entities: Vec<ResolvedEntity>,
    pub entity_by_name: HashMap<String, ResolvedEntity>,
    pub roles: RoleTable,
    pub accounts: AccountTables,
}

impl ResolvedModel {
    pub fn entity(&self, name: &str) -> Option<&ResolvedEntity> {
        self.entity_by_name.get(name)
    }
}
