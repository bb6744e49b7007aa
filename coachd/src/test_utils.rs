//! Test utilities for integration testing (available with `test-utils` feature).

use crate::AppState;
use crate::api::models::users::{Role, UserResponse};
use crate::config::{Config, PoolSettings, ProxyHeaderAuthConfig};
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::settings::SettingsCache;
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

/// Full application wired to the given pool, ready to receive requests.
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: crate::config::DatabaseConfig {
            // Ignored: tests inject the harness pool directly
            url: "postgres://unused".to_string(),
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 1,
                ..Default::default()
            },
        },
        // Matches the migrated system user, so startup does not add an
        // extra admin account to test databases
        admin_email: "system@coachd.internal".to_string(),
        admin_name: "System".to_string(),
        credits: crate::config::CreditsConfig {
            initial_credits_for_clients: 3,
        },
        enable_metrics: false,
        ..Default::default()
    }
}

/// Bare state for exercising extractors outside a running server.
pub fn create_test_app_state(pool: PgPool) -> AppState {
    let config = create_test_config();
    AppState::builder()
        .db(pool.clone())
        .settings_cache(SettingsCache::new(pool, &config.settings_cache))
        .config(config)
        .build()
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> UserResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let email = format!("testuser_{}@example.com", Uuid::new_v4().simple());

    let user_create = UserCreateDBRequest {
        email,
        name: "Test User".to_string(),
        role,
        check_in_frequency_days: None,
    };

    let user = users_repo.create(&user_create).await.expect("Failed to create test user");
    UserResponse::from(user)
}

/// Identity header pair the proxy would set for this user.
pub fn add_auth_headers(user: &UserResponse) -> (String, String) {
    let config = ProxyHeaderAuthConfig::default();
    (config.header_name, user.email.clone())
}
