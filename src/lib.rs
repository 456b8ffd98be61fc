//! School administration backend: descriptor-driven CRUD REST service plus login.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{builtin_catalog, load_catalog_file, resolve, ResolvedEntity, ResolvedModel, SchoolConfig, Settings, StoreKind};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use routes::{app_router, auth_routes, common_routes, entity_routes};
pub use service::{AuthService, CrudService};
pub use state::AppState;
pub use store::{ensure_database_exists, DataStore, MemoryStore, PgStore};
