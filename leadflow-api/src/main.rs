//! # LeadFlow API Server
//!
//! This is the main API server for LeadFlow, handling lead submission,
//! the admin approval workflow, CRM mirroring, and notification fan-out.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - Public lead submission with validation
//! - Admin approval and rejection with conditional state transitions
//! - Best-effort CRM mirroring on approval
//! - Per-user notification feeds with real-time publishing over Redis
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p leadflow-api
//! ```

use leadflow_api::{
    app::{build_router, AppState},
    config::Config,
    crm::{CrmConnector, DisabledCrmConnector, HttpCrmConnector},
    lifecycle::LifecycleManager,
    publish::{EventPublisher, NoopEventPublisher, RedisEventPublisher},
};
use leadflow_shared::db::{
    migrations::run_migrations,
    pool::{create_pool, DatabaseConfig},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leadflow_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "LeadFlow API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration
    let config = Config::from_env()?;

    // Initialize database pool and run migrations
    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await?;
    run_migrations(&pool).await?;

    // CRM connector: live HTTP client when configured, disabled otherwise
    let crm: Arc<dyn CrmConnector> = match &config.crm {
        Some(crm_config) => {
            tracing::info!(base_url = %crm_config.base_url, "CRM mirroring enabled");
            Arc::new(HttpCrmConnector::new(crm_config)?)
        }
        None => {
            tracing::info!("CRM mirroring disabled (CRM_BASE_URL not set)");
            Arc::new(DisabledCrmConnector)
        }
    };

    // Event publisher: Redis pub/sub when configured, no-op otherwise
    let publisher: Arc<dyn EventPublisher> = match &config.redis {
        Some(redis_config) => {
            tracing::info!("Real-time event publishing enabled");
            Arc::new(RedisEventPublisher::connect(&redis_config.url).await?)
        }
        None => {
            tracing::info!("Real-time event publishing disabled (REDIS_URL not set)");
            Arc::new(NoopEventPublisher)
        }
    };

    let lifecycle = LifecycleManager::postgres(pool.clone(), crm, publisher);
    let state = AppState::new(pool, config, lifecycle);
    let bind_address = state.config.bind_address();
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
