//! Entity CRUD routes built from the resolved model.
//! Each entity gets its own router, nested at `<prefix>/<path_segment>` and at every alias.
//! Literal sub-paths are static segments, so `/list` or `/find` never reach `/:id`.

use crate::handlers::entity::{
    create, delete as delete_handler, delete_composite, find, list, list_bare, read, select_column, update,
};
use crate::state::{AppState, EntityState};
use axum::{
    extract::State,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

pub fn entity_routes(state: AppState, prefix: &str) -> Router {
    let mut router = Router::new();
    for entity in &state.model.entities {
        let sub = entity_router(EntityState {
            app: state.clone(),
            entity: Arc::new(entity.clone()),
        });
        for mount in entity.mount_paths() {
            router = router.nest(&format!("{}/{}", prefix, mount), sub.clone());
        }
    }
    router
}

fn entity_router(state: EntityState) -> Router {
    let entity = state.entity.clone();
    let mut r: Router<EntityState> = Router::new()
        .route("/", get(list).post(create))
        .route("/list", get(list))
        .route("/add", post(create));
    if let Some(path) = &entity.legacy_list_path {
        r = r.route(&format!("/{}", path), get(list_bare));
    }
    for sel in &entity.selectors {
        let column = sel.column.clone();
        r = r.route(
            &format!("/{}", sel.path),
            get(move |State(s): State<EntityState>| select_column(s, column.clone())),
        );
    }
    if !entity.lookup.is_empty() {
        r = r
            .route("/find", get(find))
            .route("/delete", delete(delete_composite));
    }
    r.route("/update/:id", put(update))
        .route("/delete/:id", delete(delete_handler))
        .route("/:id", get(read).put(update).delete(delete_handler))
        .with_state(state)
}
