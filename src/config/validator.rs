//! Descriptor validation: column references and route consistency.

use crate::config::resolved::{CREATED_AT, UPDATED_AT};
use crate::config::SchoolConfig;
use crate::error::ConfigError;
use std::collections::HashSet;

/// Literal segments every entity router registers itself.
pub const RESERVED_PATHS: &[&str] = &["list", "add", "find", "delete", "update"];

pub fn validate(config: &SchoolConfig) -> Result<(), ConfigError> {
    if config.roles.is_empty() {
        return Err(ConfigError::Validation("role table must not be empty".into()));
    }

    let mut mounts = HashSet::new();
    let mut names = HashSet::new();
    for e in &config.entities {
        if !names.insert(e.name.as_str()) {
            return Err(ConfigError::Validation(format!("duplicate entity name: {}", e.name)));
        }
        for path in std::iter::once(&e.path_segment).chain(e.aliases.iter()) {
            if !mounts.insert(path.as_str()) {
                return Err(ConfigError::DuplicatePath(path.clone()));
            }
        }

        let declared: HashSet<&str> = e.columns.iter().map(|c| c.name.as_str()).collect();
        let missing = |kind: &'static str, name: &str| ConfigError::MissingReference {
            entity: e.name.clone(),
            kind,
            name: name.to_string(),
        };

        for audit in [CREATED_AT, UPDATED_AT] {
            if declared.contains(audit) {
                return Err(ConfigError::Validation(format!(
                    "{}: audit column {} is managed by the handler and must not be declared",
                    e.name, audit
                )));
            }
        }
        if !declared.contains(e.key.column.as_str()) {
            return Err(missing("key column", &e.key.column));
        }
        for col in &e.lookup {
            if !declared.contains(col.as_str()) {
                return Err(missing("lookup column", col));
            }
        }
        for col in &e.lookup_nullable {
            if !e.lookup.contains(col) {
                return Err(missing("nullable lookup column", col));
            }
        }
        for col in &e.required {
            if !declared.contains(col.as_str()) {
                return Err(missing("required column", col));
            }
        }
        for col in e.validation.keys() {
            if !declared.contains(col.as_str()) {
                return Err(missing("validation column", col));
            }
        }

        let mut literal_paths: Vec<&str> = e.selectors.iter().map(|s| s.path.as_str()).collect();
        for s in &e.selectors {
            if !declared.contains(s.column.as_str()) {
                return Err(missing("selector column", &s.column));
            }
        }
        if let Some(p) = &e.legacy_list_path {
            literal_paths.push(p.as_str());
        }
        let mut seen = HashSet::new();
        for p in literal_paths {
            let first = p.trim_matches('/').split('/').next().unwrap_or("");
            if first.is_empty() || RESERVED_PATHS.contains(&first) || !seen.insert(p) {
                return Err(ConfigError::ReservedPath {
                    entity: e.name.clone(),
                    path: p.to_string(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ColumnConfig, ColumnKind, EntityConfig, KeyConfig, KeyKind, RoleConfig, SelectorConfig};

    fn entity(name: &str, path: &str) -> EntityConfig {
        EntityConfig {
            name: name.into(),
            label: name.into(),
            schema: "public".into(),
            table: name.into(),
            path_segment: path.into(),
            aliases: vec![],
            key: KeyConfig {
                column: "id".into(),
                kind: KeyKind::Text,
                generated: false,
            },
            lookup: vec![],
            lookup_nullable: vec![],
            columns: vec![ColumnConfig {
                name: "id".into(),
                kind: ColumnKind::Text,
            }],
            required: vec!["id".into()],
            validation: Default::default(),
            audit: true,
            envelope: Default::default(),
            legacy_list_path: None,
            selectors: vec![],
        }
    }

    fn config(entities: Vec<EntityConfig>) -> SchoolConfig {
        SchoolConfig {
            entities,
            roles: vec![RoleConfig {
                code: "USER".into(),
                user_role: "user".into(),
                description: "Normal User".into(),
                message: "User login successful".into(),
            }],
        }
    }

    #[test]
    fn rejects_duplicate_mount_paths() {
        let mut b = entity("b", "other");
        b.aliases.push("a".into());
        let err = validate(&config(vec![entity("a", "a"), b])).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePath(p) if p == "a"));
    }

    #[test]
    fn rejects_selector_shadowing_fixed_route() {
        let mut e = entity("a", "a");
        e.selectors.push(SelectorConfig {
            path: "list".into(),
            column: "id".into(),
        });
        assert!(matches!(validate(&config(vec![e])), Err(ConfigError::ReservedPath { .. })));
    }

    #[test]
    fn rejects_undeclared_required_column() {
        let mut e = entity("a", "a");
        e.required.push("nope".into());
        assert!(matches!(validate(&config(vec![e])), Err(ConfigError::MissingReference { .. })));
    }

    #[test]
    fn rejects_nullable_column_outside_lookup() {
        let mut e = entity("a", "a");
        e.lookup_nullable.push("id".into());
        assert!(matches!(
            validate(&config(vec![e])),
            Err(ConfigError::MissingReference { kind: "nullable lookup column", .. })
        ));
    }

    #[test]
    fn rejects_declared_audit_column() {
        let mut e = entity("a", "a");
        e.columns.push(ColumnConfig {
            name: "createdat".into(),
            kind: ColumnKind::Timestamp,
        });
        assert!(matches!(validate(&config(vec![e])), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn rejects_empty_role_table() {
        let mut c = config(vec![entity("a", "a")]);
        c.roles.clear();
        assert!(validate(&c).is_err());
    }
}
