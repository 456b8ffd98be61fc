//! School administration server.
//!
//! Run from repo root: `cargo run -p school-admin-server`

use school_admin::{
    app_router, apply_migrations, builtin_catalog, ensure_database_exists, load_catalog_file, resolve, AppState,
    DataStore, MemoryStore, PgStore, Settings, StoreKind,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("school_admin=info,tower_http=info")),
        )
        .init();

    let catalog = match &settings.catalog_path {
        Some(path) => load_catalog_file(path).await?,
        None => builtin_catalog()?,
    };
    let model = resolve(&catalog)?;
    tracing::info!(entities = model.entities.len(), roles = model.roles.entries.len(), "catalog resolved");

    let store: Arc<dyn DataStore> = match settings.store {
        StoreKind::Postgres => {
            ensure_database_exists(&settings.database_url).await?;
            let pool = sqlx::postgres::PgPoolOptions::new()
                .max_connections(settings.max_connections)
                .connect(&settings.database_url)
                .await?;
            if settings.auto_migrate {
                apply_migrations(&pool, &model).await?;
            }
            Arc::new(PgStore::new(pool))
        }
        StoreKind::Memory => {
            tracing::info!("using in-memory store; data is lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, model);
    let app = app_router(state, &settings.api_prefix)
        .layer(RequestBodyLimitLayer::new(settings.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(settings.socket_addr()).await?;
    let addr = listener.local_addr()?;
    tracing::info!("school admin listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
