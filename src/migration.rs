//! Apply the entity catalog to the database: CREATE SCHEMA and CREATE TABLE, both IF NOT EXISTS.
//! Existing tables are never altered.

use crate::config::{KeyKind, ResolvedEntity, ResolvedModel, CREATED_AT, UPDATED_AT};
use crate::error::AppError;
use crate::sql::{qualified_table, quoted};
use sqlx::PgPool;
use std::collections::BTreeSet;

/// DDL for one entity's table.
pub fn create_table_sql(entity: &ResolvedEntity) -> String {
    let mut col_defs = Vec::with_capacity(entity.columns.len());
    for c in &entity.columns {
        let name = quoted(&c.name);
        let def = if c.name == entity.key_column() {
            match (entity.key.kind, entity.key.generated) {
                (KeyKind::Integer, true) => format!("{} BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY", name),
                (KeyKind::Integer, false) => format!("{} BIGINT PRIMARY KEY", name),
                (KeyKind::Text, _) => format!("{} TEXT PRIMARY KEY", name),
            }
        } else if c.name == CREATED_AT || c.name == UPDATED_AT {
            format!("{} TIMESTAMPTZ NOT NULL DEFAULT NOW()", name)
        } else {
            format!("{} {}", name, c.pg_type().to_uppercase())
        };
        col_defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        qualified_table(&entity.schema_name, &entity.table_name),
        col_defs.join(",\n  ")
    )
}

/// Create every schema and table the model needs. Idempotent.
pub async fn apply_migrations(pool: &PgPool, model: &ResolvedModel) -> Result<(), AppError> {
    let schemas: BTreeSet<&str> = model.entities.iter().map(|e| e.schema_name.as_str()).collect();
    for s in schemas {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(s)))
            .execute(pool)
            .await?;
    }
    for e in &model.entities {
        let sql = create_table_sql(e);
        tracing::debug!(sql = %sql, "migration");
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!(tables = model.entities.len(), "migrations applied");
    Ok(())
}
