//! Shared application state for all routes.

use crate::config::{ResolvedEntity, ResolvedModel};
use crate::store::DataStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub model: Arc<ResolvedModel>,
}

impl AppState {
    pub fn new(store: Arc<dyn DataStore>, model: ResolvedModel) -> Self {
        AppState {
            store,
            model: Arc::new(model),
        }
    }
}

/// State of one entity's router: the shared state plus the entity it serves.
#[derive(Clone)]
pub struct EntityState {
    pub app: AppState,
    pub entity: Arc<ResolvedEntity>,
}
