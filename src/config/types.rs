//! Raw descriptor types matching the catalog JSON (entities + role table).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scalar kind of a column. Drives coercion, SQL casts and DDL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Text,
    Integer,
    Numeric,
    Boolean,
    Date,
    Timestamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Integer,
    Text,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyConfig {
    pub column: String,
    pub kind: KeyKind,
    /// Server assigns the key when the client omits it (identity column).
    #[serde(default)]
    pub generated: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: ColumnKind,
}

fn default_kind() -> ColumnKind {
    ColumnKind::Text
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
}

/// JSON wrapper keys. Both absent means bare arrays/records.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EnvelopeConfig {
    #[serde(default)]
    pub list: Option<String>,
    #[serde(default)]
    pub item: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub path: String,
    pub column: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    pub name: String,
    pub label: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    pub table: String,
    pub path_segment: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub key: KeyConfig,
    /// Composite lookup columns for the legacy find/delete routes.
    #[serde(default)]
    pub lookup: Vec<String>,
    /// Lookup columns where null matches null. The rest use plain equality.
    #[serde(default)]
    pub lookup_nullable: Vec<String>,
    pub columns: Vec<ColumnConfig>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub validation: HashMap<String, ValidationRule>,
    #[serde(default = "default_true")]
    pub audit: bool,
    #[serde(default)]
    pub envelope: EnvelopeConfig,
    #[serde(default)]
    pub legacy_list_path: Option<String>,
    #[serde(default)]
    pub selectors: Vec<SelectorConfig>,
}

fn default_schema() -> String {
    "public".into()
}

fn default_true() -> bool {
    true
}

/// One row of the login role-priority table. Order in the catalog is priority order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleConfig {
    pub code: String,
    pub user_role: String,
    pub description: String,
    pub message: String,
}

/// Whole catalog as loaded from JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SchoolConfig {
    pub entities: Vec<EntityConfig>,
    #[serde(default)]
    pub roles: Vec<RoleConfig>,
}
