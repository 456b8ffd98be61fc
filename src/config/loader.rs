//! Load the entity catalog (built-in or from a JSON file) and resolve it for runtime use.

use crate::config::resolved::{
    AccountTables, ColumnInfo, KeySpec, ListOrder, ResolvedEntity, ResolvedModel, RoleTable, Selector, TableRef,
    CREATED_AT, UPDATED_AT,
};
use crate::config::types::*;
use crate::config::validate;
use crate::error::ConfigError;
use std::collections::HashMap;
use std::path::Path;

/// Catalog shipped with the crate: every school entity plus the login role table.
const BUILTIN_CATALOG: &str = include_str!("../../config/school.json");

pub fn builtin_catalog() -> Result<SchoolConfig, ConfigError> {
    parse_catalog(BUILTIN_CATALOG)
}

pub fn parse_catalog(json: &str) -> Result<SchoolConfig, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read a catalog from disk, replacing the built-in one entirely.
pub async fn load_catalog_file(path: &Path) -> Result<SchoolConfig, ConfigError> {
    tracing::info!(path = %path.display(), "loading entity catalog");
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    parse_catalog(&raw)
}

/// Build resolved model from the catalog (validates first).
pub fn resolve(config: &SchoolConfig) -> Result<ResolvedModel, ConfigError> {
    validate(config)?;

    let mut entities = Vec::with_capacity(config.entities.len());
    let mut entity_by_name = HashMap::new();
    for e in &config.entities {
        let entity = resolve_entity(e);
        entity_by_name.insert(entity.name.clone(), entity.clone());
        entities.push(entity);
    }

    let accounts = account_tables(&entity_by_name);
    Ok(ResolvedModel {
        entities,
        entity_by_name,
        roles: RoleTable {
            entries: config.roles.clone(),
        },
        accounts,
    })
}

/// Login reads the same tables the user, student and teacher entities are served from.
fn account_tables(entities: &HashMap<String, ResolvedEntity>) -> AccountTables {
    let mut tables = AccountTables::default();
    for (name, slot) in [
        ("user", &mut tables.users),
        ("student", &mut tables.students),
        ("teacher", &mut tables.teachers),
    ] {
        if let Some(e) = entities.get(name) {
            *slot = TableRef {
                schema: e.schema_name.clone(),
                table: e.table_name.clone(),
            };
        }
    }
    tables
}

fn resolve_entity(e: &EntityConfig) -> ResolvedEntity {
    let mut columns: Vec<ColumnInfo> = e
        .columns
        .iter()
        .map(|c| ColumnInfo {
            name: c.name.clone(),
            kind: c.kind,
        })
        .collect();
    if e.audit {
        for name in [CREATED_AT, UPDATED_AT] {
            columns.push(ColumnInfo {
                name: name.to_string(),
                kind: ColumnKind::Timestamp,
            });
        }
    }

    let order = if e.audit {
        ListOrder {
            column: CREATED_AT.to_string(),
            descending: true,
        }
    } else {
        ListOrder {
            column: e.key.column.clone(),
            descending: false,
        }
    };

    ResolvedEntity {
        name: e.name.clone(),
        label: e.label.clone(),
        schema_name: e.schema.clone(),
        table_name: e.table.clone(),
        path_segment: e.path_segment.clone(),
        aliases: e.aliases.clone(),
        key: KeySpec {
            column: e.key.column.clone(),
            kind: e.key.kind,
            generated: e.key.generated,
        },
        lookup: e.lookup.clone(),
        lookup_nullable: e.lookup_nullable.clone(),
        columns,
        required: e.required.clone(),
        validation: e.validation.clone(),
        audit: e.audit,
        order,
        list_key: e.envelope.list.clone(),
        item_key: e.envelope.item.clone(),
        legacy_list_path: e.legacy_list_path.as_ref().map(|p| p.trim_matches('/').to_string()),
        selectors: e
            .selectors
            .iter()
            .map(|s| Selector {
                path: s.path.trim_matches('/').to_string(),
                column: s.column.clone(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_resolves() {
        let model = resolve(&builtin_catalog().unwrap()).unwrap();
        for name in [
            "course",
            "subject",
            "subject_course",
            "subject_teacher",
            "subject_elective",
            "student",
            "teacher",
            "classroom",
            "academic_year",
            "department",
            "college",
            "course_offering",
            "course_registration",
            "daily_routine",
            "teacher_availability",
            "attendance",
            "role",
            "menu",
            "user",
        ] {
            assert!(model.entity(name).is_some(), "missing entity {}", name);
        }
        assert_eq!(model.roles.entries.first().map(|r| r.code.as_str()), Some("SMS_SUPERADM"));
    }

    #[test]
    fn audited_entities_order_by_creation_descending() {
        let model = resolve(&builtin_catalog().unwrap()).unwrap();
        let course = model.entity("course").unwrap();
        assert_eq!(course.order.column, CREATED_AT);
        assert!(course.order.descending);
        assert!(course.column(UPDATED_AT).is_some());
    }

    #[test]
    fn unaudited_entities_order_by_key_ascending() {
        let model = resolve(&builtin_catalog().unwrap()).unwrap();
        let role = model.entity("role").unwrap();
        assert_eq!(role.order.column, "role_id");
        assert!(!role.order.descending);
        assert!(role.column(CREATED_AT).is_none());
    }

    #[test]
    fn account_tables_follow_entity_tables() {
        let mut catalog = builtin_catalog().unwrap();
        let model = resolve(&catalog).unwrap();
        assert_eq!(model.accounts, AccountTables::default());

        for e in catalog.entities.iter_mut().filter(|e| e.name == "user") {
            e.schema = "auth".into();
            e.table = "app_users".into();
        }
        let model = resolve(&catalog).unwrap();
        assert_eq!(
            model.accounts.users,
            TableRef {
                schema: "auth".into(),
                table: "app_users".into()
            }
        );
        assert_eq!(model.accounts.students.table, "student_master");
    }

    #[test]
    fn daily_routine_has_composite_lookup_and_alias() {
        let model = resolve(&builtin_catalog().unwrap()).unwrap();
        let routine = model.entity("daily_routine").unwrap();
        assert_eq!(routine.lookup.len(), 8);
        assert_eq!(routine.lookup.last().map(String::as_str), Some("drdate"));
        assert!(routine.null_safe("drdate"));
        assert!(!routine.null_safe("drslot"));
        assert!(routine.mount_paths().any(|p| p == "college-daily-routine"));
    }
}
