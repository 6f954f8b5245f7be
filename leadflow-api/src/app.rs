/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use leadflow_api::{
///     app::AppState,
///     config::Config,
///     crm::DisabledCrmConnector,
///     lifecycle::LifecycleManager,
///     publish::NoopEventPublisher,
/// };
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let lifecycle = LifecycleManager::postgres(
///     pool.clone(),
///     Arc::new(DisabledCrmConnector),
///     Arc::new(NoopEventPublisher),
/// );
/// let state = AppState::new(pool, config, lifecycle);
/// let app = leadflow_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, lifecycle::LifecycleManager};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Uses Arc internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Lead lifecycle orchestrator (validation, decisions, fan-out)
    pub lifecycle: Arc<LifecycleManager>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, lifecycle: LifecycleManager) -> Self {
        Self {
            db,
            config: Arc::new(config),
            lifecycle: Arc::new(lifecycle),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// The router is organized as follows:
/// ```text
/// /
/// ├── /health                     # Health check (public)
/// ├── /v1/                        # API v1 (versioned)
/// │   ├── /auth/                  # Authentication endpoints
/// │   │   ├── POST /register
/// │   │   ├── POST /login
/// │   │   └── POST /refresh
/// │   ├── /leads/                 # Lead workflow
/// │   │   ├── POST /              # Submit (public)
/// │   │   ├── GET  /              # List, filtered + paginated (admin)
/// │   │   ├── GET  /pending       # Pending queue (admin)
/// │   │   ├── GET  /stats         # Counts by status
/// │   │   ├── POST /:id/approve   # Approve (admin)
/// │   │   ├── POST /:id/reject    # Reject (admin)
/// │   │   └── GET  /crm/test      # CRM connectivity check (admin)
/// │   ├── /notifications/         # Per-user feed
/// │   │   ├── GET /
/// │   │   ├── PUT /:id/read
/// │   │   └── PUT /read-all
/// │   └── /users/                 # Accounts
/// │       ├── GET /profile        # Own profile
/// │       └── GET /               # Directory with lead activity (admin)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
///
/// Authentication happens inside the handlers: lead submission accepts
/// anonymous requests, everything else reads the bearer token itself, so
/// a blanket auth layer would get the split wrong.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Lead workflow routes; submission is public, the rest check the
    // bearer token (and the admin role where required) themselves
    let lead_routes = Router::new()
        .route("/", post(routes::leads::submit).get(routes::leads::list))
        .route("/pending", get(routes::leads::list_pending))
        .route("/stats", get(routes::leads::stats))
        .route("/:id/approve", post(routes::leads::approve))
        .route("/:id/reject", post(routes::leads::reject))
        .route("/crm/test", get(routes::leads::test_crm));

    // Notification feed routes (authenticated, owner-scoped)
    let notification_routes = Router::new()
        .route("/", get(routes::notifications::list))
        .route("/:id/read", put(routes::notifications::mark_read))
        .route("/read-all", put(routes::notifications::mark_all_read));

    // Account routes; the directory is admin-only, the profile is not
    let user_routes = Router::new()
        .route("/", get(routes::users::list))
        .route("/profile", get(routes::users::profile));

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/leads", lead_routes)
        .nest("/notifications", notification_routes)
        .nest("/users", user_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        // Production mode: configure allowed origins
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    // Combine all routes with middleware stack
    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
