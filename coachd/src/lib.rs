//! # coachd: Control Plane for a Fitness Coaching Platform
//!
//! `coachd` is the management backend for a coaching business: it keeps track of
//! who the clients and coaches are, which cohort each client trains in, how often
//! clients are expected to check in, and the credits they spend on bootcamps. It
//! exposes a RESTful API intended to sit behind a trusted SSO proxy.
//!
//! ## Overview
//!
//! Coaching platforms juggle several sources of truth: account data, group
//! programs with their own cadence expectations, per-client exceptions, and a
//! credit economy tied to paid events. `coachd` centralizes all of it in one
//! PostgreSQL-backed service with explicit, auditable rules.
//!
//! ### What It Does
//!
//! Clients check in on a cadence resolved from three layers: a personal
//! override, the cadence of their active cohort, and a system-wide default
//! that admins can change at runtime. The service answers "when is this client
//! next due?" and "is this client overdue?" from that resolution plus the
//! client's check-in history. Clients also hold a credit balance; bootcamp
//! registrations consume credits through an append-only ledger, and every
//! balance change or settings write leaves an audit entry.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the
//! HTTP layer and uses PostgreSQL for all persistence.
//!
//! ### Request Flow
//!
//! Every request arrives through the upstream proxy, which authenticates the
//! user and forwards identity headers (`x-coachd-user` and friends). An
//! extractor resolves those headers to an account, optionally auto-creating
//! unknown users at a configured role. Handlers then enforce the static
//! role/permission matrix, validate the request, and talk to PostgreSQL
//! through repository types. Mutations that move credits or change settings
//! write their audit entry inside the same transaction.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the management surface under
//! `/api/v1/*`: users, cohorts, check-ins, bootcamps, credits, settings, and
//! the audit log, with OpenAPI docs served at `/api/v1/docs`.
//!
//! The **authentication layer** ([`auth`]) resolves proxy headers to a
//! [`CurrentUser`](api::models::users::CurrentUser) and provides typed
//! permission guards for handlers.
//!
//! The **database layer** ([`db`]) uses the repository pattern. Each entity has
//! a repository over a `PgConnection`, so handlers can compose repositories
//! inside one transaction when an operation spans tables (for example a credit
//! delta plus its audit entry).
//!
//! **Cadence resolution** ([`cadence`]) and the **settings snapshot cache**
//! ([`settings`]) implement the layered check-in frequency: user override,
//! then active cohort, then the cached system default.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use coachd::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = coachd::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging)
//!     coachd::telemetry::init_telemetry()?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! The application requires a PostgreSQL database and automatically runs
//! migrations on startup:
//!
//! ```no_run
//! # use sqlx::PgPool;
//! # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
//! // Run migrations
//! coachd::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod cadence;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod settings;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod test;

use crate::{
    api::models::users::Role,
    config::CorsOrigin,
    db::handlers::{Repository, Users},
    db::models::users::UserCreateDBRequest,
    openapi::ApiDoc,
    settings::{DEFAULT_CHECK_IN_FREQUENCY_DAYS, DEFAULT_CHECK_IN_FREQUENCY_KEY, SettingsCache},
};
use axum::{
    Json, Router, http,
    http::HeaderValue,
    routing::{delete, get, patch, post, put},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{AuditEntryId, BootcampId, CheckInId, CohortId, SYSTEM_USER_ID, TransactionId, UserId};

/// Application state shared across all request handlers.
///
/// # Fields
///
/// - `db`: PostgreSQL connection pool
/// - `config`: Application configuration loaded from file/environment
/// - `settings_cache`: Cached snapshot of the `system_settings` table
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(pool)
///     .config(config)
///     .settings_cache(settings_cache)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub settings_cache: SettingsCache,
}

/// Get the coachd database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: when an account with this email already exists, its id is
/// returned unchanged. Called during startup so a fresh deployment always has
/// one human admin who can reach the settings and audit endpoints.
///
/// # Errors
///
/// Returns an error if database operations fail.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, name: &str, db: &PgPool) -> Result<UserId, sqlx::Error> {
    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    if let Some(existing_user) = user_repo
        .get_user_by_email(email)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to check existing user: {e}")))?
    {
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let user_create = UserCreateDBRequest {
        email: email.to_string(),
        name: name.to_string(),
        role: Role::Admin,
        check_in_frequency_days: None,
    };

    let created_user = user_repo
        .create(&user_create)
        .await
        .map_err(|e| sqlx::Error::Protocol(format!("Failed to create admin user: {e}")))?;

    tx.commit().await?;

    info!(email = email, "Created initial admin user");
    Ok(created_user.id)
}

/// Seed the database with the default system settings.
///
/// Idempotent: existing rows are never overwritten, so admin edits survive
/// restarts. The insert bypasses the settings repository on purpose; seeding
/// is not an admin action and should not appear in the audit log.
#[instrument(skip_all)]
pub async fn seed_database(db: &PgPool) -> Result<(), anyhow::Error> {
    sqlx::query(
        r#"
        INSERT INTO system_settings (key, value, updated_by)
        VALUES ($1, $2, $3)
        ON CONFLICT (key) DO NOTHING
        "#,
    )
    .bind(DEFAULT_CHECK_IN_FREQUENCY_KEY)
    .bind(DEFAULT_CHECK_IN_FREQUENCY_DAYS.to_string())
    .bind(SYSTEM_USER_ID)
    .execute(db)
    .await?;

    debug!("Database seeded");

    Ok(())
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.security.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - The management API under `/api/v1`
/// - OpenAPI spec and Scalar docs UI
/// - Health check endpoint
/// - Optional Prometheus metrics
/// - CORS configuration
/// - Tracing middleware
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // User management
        .route("/users", get(api::handlers::users::list_users))
        .route("/users", post(api::handlers::users::create_user))
        .route("/users/current", get(api::handlers::users::get_current_user))
        .route("/users/{user_id}", get(api::handlers::users::get_user))
        .route("/users/{user_id}", patch(api::handlers::users::update_user))
        .route("/users/{user_id}", delete(api::handlers::users::delete_user))
        // Check-in cadence: layered overrides and the resolved view
        .route(
            "/users/current/check-in-frequency",
            get(api::handlers::cadence::get_my_check_in_frequency),
        )
        .route(
            "/users/{user_id}/check-in-frequency",
            get(api::handlers::cadence::get_check_in_frequency_config),
        )
        .route(
            "/users/{user_id}/check-in-frequency",
            put(api::handlers::cadence::update_user_check_in_frequency),
        )
        .route(
            "/cohorts/{cohort_id}/check-in-frequency",
            put(api::handlers::cadence::update_cohort_check_in_frequency),
        )
        // Check-ins
        .route("/check-ins", post(api::handlers::check_ins::create_check_in))
        .route("/users/current/check-in-status", get(api::handlers::check_ins::get_my_check_in_status))
        .route("/users/{user_id}/check-ins", get(api::handlers::check_ins::list_user_check_ins))
        // Credit ledger (as a user sub-resource)
        .route("/users/{user_id}/credits", post(api::handlers::credits::allocate_credits))
        .route("/users/{user_id}/credits/history", get(api::handlers::credits::get_credits_history))
        .route("/users/{user_id}/credits/summary", get(api::handlers::credits::get_credits_summary))
        // Cohorts and memberships
        .route("/cohorts", get(api::handlers::cohorts::list_cohorts))
        .route("/cohorts", post(api::handlers::cohorts::create_cohort))
        .route("/cohorts/{cohort_id}", get(api::handlers::cohorts::get_cohort))
        .route("/cohorts/{cohort_id}", patch(api::handlers::cohorts::update_cohort))
        .route("/cohorts/{cohort_id}", delete(api::handlers::cohorts::delete_cohort))
        .route("/cohorts/{cohort_id}/members", get(api::handlers::cohorts::list_cohort_members))
        .route("/cohorts/{cohort_id}/members", post(api::handlers::cohorts::add_cohort_member))
        .route(
            "/cohorts/{cohort_id}/members/{user_id}",
            delete(api::handlers::cohorts::remove_cohort_member),
        )
        // Bootcamps and registrations
        .route("/bootcamps", get(api::handlers::bootcamps::list_bootcamps))
        .route("/bootcamps", post(api::handlers::bootcamps::create_bootcamp))
        .route("/bootcamps/{bootcamp_id}", get(api::handlers::bootcamps::get_bootcamp))
        .route("/bootcamps/{bootcamp_id}", patch(api::handlers::bootcamps::update_bootcamp))
        .route("/bootcamps/{bootcamp_id}", delete(api::handlers::bootcamps::delete_bootcamp))
        .route(
            "/bootcamps/{bootcamp_id}/registrations",
            get(api::handlers::bootcamps::list_bootcamp_registrations),
        )
        .route(
            "/bootcamps/{bootcamp_id}/registrations",
            post(api::handlers::bootcamps::register_for_bootcamp),
        )
        .route(
            "/bootcamps/{bootcamp_id}/registrations",
            delete(api::handlers::bootcamps::unregister_from_bootcamp),
        )
        // System settings
        .route("/settings", get(api::handlers::settings::list_settings))
        .route("/settings/{key}", put(api::handlers::settings::update_setting))
        // Audit log
        .route("/audit-log", get(api::handlers::audit::list_audit_log))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api/v1/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/api/v1/docs", ApiDoc::openapi()))
        .nest("/api/v1", api_routes);

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let mut router = router.layer(cors_layer);

    // Add Prometheus metrics if enabled
    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to PostgreSQL, runs migrations,
///    bootstraps the initial admin user, and seeds default settings
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling
///    requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests are
///    drained and the pool is closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Like [`Application::new`], but reusing an existing connection pool.
    ///
    /// Tests pass the pool provided by the test harness so the application
    /// operates on the per-test database.
    pub async fn new_with_pool(config: Config, existing_pool: Option<PgPool>) -> anyhow::Result<Self> {
        debug!("Starting coachd with configuration: {:#?}", config);

        let pool = match existing_pool {
            Some(pool) => pool,
            None => {
                let pool_settings = &config.database.pool;
                sqlx::postgres::PgPoolOptions::new()
                    .max_connections(pool_settings.max_connections)
                    .min_connections(pool_settings.min_connections)
                    .acquire_timeout(pool_settings.acquire_timeout)
                    .idle_timeout(pool_settings.idle_timeout)
                    .max_lifetime(pool_settings.max_lifetime)
                    .connect(&config.database.url)
                    .await?
            }
        };

        migrator().run(&pool).await?;

        create_initial_admin_user(&config.admin_email, &config.admin_name, &pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create initial admin user: {}", e))?;

        seed_database(&pool).await?;

        let settings_cache = SettingsCache::new(pool.clone(), &config.settings_cache);

        let app_state = AppState::builder()
            .db(pool.clone())
            .config(config.clone())
            .settings_cache(settings_cache)
            .build();

        let router = build_router(&app_state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "coachd listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
