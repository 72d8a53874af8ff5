pub mod api;
pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod notify;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export core types
pub use error::{OrchestratorError, OrchestratorResult};
pub use logic::{BranchResolver, NamespaceLocks, ReleaseOrchestrator};
pub use notify::{LogEmitter, NotificationEmitter, RecordingEmitter};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryStore, PostgresStore, Store};

// Function for integration testing
pub async fn run_server() -> anyhow::Result<()> {
    use axum::serve;
    use std::sync::Arc;
    use tokio::net::TcpListener;

    // Load environment variables from .env file if it exists
    dotenvy::dotenv().ok();

    // Initialize logging with INFO level only (suppress DEBUG logs)
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();

    // Load configuration
    let config = crate::config::AppConfig::load()?;

    // Connect to PostgreSQL
    let database_url = config.database_url()?;
    let postgres_store = crate::store::PostgresStore::new(&database_url).await?;

    // Run migrations
    postgres_store.migrate().await?;

    let orchestrator = Arc::new(ReleaseOrchestrator::new(
        Arc::new(postgres_store),
        Arc::new(LogEmitter),
        config.release.emergency_publish_envs.clone(),
    ));

    // Create router with state
    let app = crate::api::routes::create_router().with_state(orchestrator);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;

    serve(listener, app).await?;

    Ok(())
}
