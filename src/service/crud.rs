//! Generic CRUD engine: one implementation of list/get/create/update/delete for every entity.

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::service::validation::{RequestValidator, WriteMode};
use crate::store::{DataStore, Record, RecordKey};
use serde_json::Value;

pub struct CrudService;

impl CrudService {
    /// All rows in the entity's list order.
    pub async fn list(store: &dyn DataStore, entity: &ResolvedEntity) -> Result<Vec<Record>, AppError> {
        store.list(entity).await
    }

    /// One column of every row (dropdown selectors).
    pub async fn select_column(
        store: &dyn DataStore,
        entity: &ResolvedEntity,
        column: &str,
    ) -> Result<Vec<Record>, AppError> {
        store.list_column(entity, column).await
    }

    /// Fetch one row by its key as given in the path.
    pub async fn get(store: &dyn DataStore, entity: &ResolvedEntity, raw_key: &str) -> Result<Record, AppError> {
        let key = RequestValidator::parse_key(entity, raw_key)?;
        store
            .fetch(entity, &RecordKey::Surrogate(key))
            .await?
            .ok_or_else(|| not_found(entity))
    }

    /// Validate then insert. Nothing reaches the store when validation fails.
    pub async fn create(store: &dyn DataStore, entity: &ResolvedEntity, body: &Value) -> Result<Record, AppError> {
        let record = RequestValidator::prepare(entity, body, WriteMode::Create)?;
        store.insert(entity, &record).await
    }

    /// Coerce then overwrite every non-key column of the row.
    pub async fn update(
        store: &dyn DataStore,
        entity: &ResolvedEntity,
        raw_key: &str,
        body: &Value,
    ) -> Result<Record, AppError> {
        let key = RequestValidator::parse_key(entity, raw_key)?;
        let record = RequestValidator::prepare(entity, body, WriteMode::Update)?;
        store
            .update(entity, &key, &record)
            .await?
            .ok_or_else(|| not_found(entity))
    }

    /// Hard delete by key. Returns the removed row.
    pub async fn delete(store: &dyn DataStore, entity: &ResolvedEntity, raw_key: &str) -> Result<Record, AppError> {
        let key = RequestValidator::parse_key(entity, raw_key)?;
        store
            .delete(entity, &RecordKey::Surrogate(key))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(entity))
    }

    /// First row matching every lookup column.
    pub async fn find_by_composite(
        store: &dyn DataStore,
        entity: &ResolvedEntity,
        input: &Record,
    ) -> Result<Record, AppError> {
        let key = RequestValidator::composite_key(entity, input)?;
        store.fetch(entity, &key).await?.ok_or_else(|| not_found(entity))
    }

    /// Delete every row matching the lookup columns. Returns the number removed.
    pub async fn delete_by_composite(
        store: &dyn DataStore,
        entity: &ResolvedEntity,
        input: &Record,
    ) -> Result<usize, AppError> {
        let key = RequestValidator::composite_key(entity, input)?;
        let removed = store.delete(entity, &key).await?;
        if removed.is_empty() {
            return Err(not_found(entity));
        }
        Ok(removed.len())
    }
}

fn not_found(entity: &ResolvedEntity) -> AppError {
    AppError::NotFound(format!("{} not found", entity.label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{builtin_catalog, resolve, ResolvedModel};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn model() -> ResolvedModel {
        resolve(&builtin_catalog().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn failed_validation_writes_nothing() {
        let m = model();
        let course = m.entity("course").unwrap();
        let store = MemoryStore::new();
        let err = CrudService::create(&store, course, &json!({"courseid": "C1"})).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(CrudService::list(&store, course).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_missing_row_is_not_found() {
        let m = model();
        let course = m.entity("course").unwrap();
        let store = MemoryStore::new();
        let err = CrudService::update(&store, course, "NOPE", &json!({"collegedept": "D1"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), format!("{} not found", course.label));
    }

    #[tokio::test]
    async fn update_keeps_key_and_creation_stamp() {
        let m = model();
        let course = m.entity("course").unwrap();
        let store = MemoryStore::new();
        let created = CrudService::create(&store, course, &json!({"courseid": "C1", "coursedesc": "A"}))
            .await
            .unwrap();
        let updated = CrudService::update(&store, course, "C1", &json!({"courseid": "C9", "coursedesc": "B"}))
            .await
            .unwrap();
        assert_eq!(updated["courseid"], json!("C1"));
        assert_eq!(updated["coursedesc"], json!("B"));
        assert_eq!(updated["createdat"], created["createdat"]);
    }

    fn routine(date: &str) -> Value {
        json!({
            "drdayofweek": "MON", "drslot": "1", "drsubjid": "S1", "drclassroomid": "R1",
            "stu_curr_semester": 3, "stu_section": "A", "acad_year": "2024", "drdate": date
        })
    }

    #[tokio::test]
    async fn composite_delete_counts_rows() {
        let m = model();
        let routine_entity = m.entity("daily_routine").unwrap();
        let store = MemoryStore::new();
        for date in ["2024-01-01", "2024-01-02"] {
            CrudService::create(&store, routine_entity, &routine(date)).await.unwrap();
        }
        let input = routine("2024-01-02");
        let n = CrudService::delete_by_composite(&store, routine_entity, input.as_object().unwrap())
            .await
            .unwrap();
        assert_eq!(n, 1);
        let err = CrudService::delete_by_composite(&store, routine_entity, input.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn partial_composite_key_matches_nothing() {
        let m = model();
        let routine_entity = m.entity("daily_routine").unwrap();
        let store = MemoryStore::new();
        let body = json!({"drsubjid": "S1", "drclassroomid": "R1", "acad_year": "2024", "drdate": "2024-01-10"});
        CrudService::create(&store, routine_entity, &body).await.unwrap();

        let err = CrudService::find_by_composite(&store, routine_entity, body.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        let err = CrudService::delete_by_composite(&store, routine_entity, body.as_object().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(CrudService::list(&store, routine_entity).await.unwrap().len(), 1);
    }
}
