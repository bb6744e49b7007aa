//! End-to-end integration tests.
//!
//! These tests exercise the full application: router, extractors, permission
//! guards, repositories, and the audit trail, against a real per-test
//! database. Unit and handler-level tests live next to the code they cover.

use crate::{
    api::models::{
        audit::AuditEntryResponse,
        bootcamps::{BootcampRegistrationResponse, BootcampResponse},
        cadence::{CheckInFrequencyConfigResponse, EffectiveFrequencyResponse},
        check_ins::CheckInStatusResponse,
        cohorts::CohortResponse,
        pagination::PaginatedResponse,
        users::{Role, UserResponse},
    },
    db::handlers::{Repository, Users},
    test_utils::{add_auth_headers, create_test_app, create_test_config, create_test_user},
};
use chrono::{Duration, Utc};
use sqlx::PgPool;

/// End-to-end test: the full coaching lifecycle through the API.
///
/// Follows a real journey: admin provisions a coach and a client, builds a
/// cohort, tunes the check-in cadence at every layer, the client checks in,
/// registers for a bootcamp and backs out again, and the audit log has seen
/// all of it.
#[sqlx::test]
#[test_log::test]
async fn test_e2e_coaching_lifecycle(pool: PgPool) {
    let server = create_test_app(pool.clone()).await;

    let admin = create_test_user(&pool, Role::Admin).await;
    let admin_auth = add_auth_headers(&admin);

    // Step 1: Admin creates a coach via API
    let coach_response = server
        .post("/api/v1/users")
        .add_header(&admin_auth.0, &admin_auth.1)
        .json(&serde_json::json!({
            "email": "taylor@example.com",
            "name": "Taylor Reed",
            "role": "COACH"
        }))
        .await;
    assert_eq!(coach_response.status_code(), 201, "Failed to create coach");
    let coach: UserResponse = coach_response.json();
    assert_eq!(coach.credits, 0, "Coaches should not receive starting credits");
    let coach_auth = add_auth_headers(&coach);

    // Step 2: Admin creates a client; the configured starting credits arrive
    // with the account
    let client_response = server
        .post("/api/v1/users")
        .add_header(&admin_auth.0, &admin_auth.1)
        .json(&serde_json::json!({
            "email": "jordan@example.com",
            "name": "Jordan Lee",
            "role": "CLIENT"
        }))
        .await;
    assert_eq!(client_response.status_code(), 201, "Failed to create client");
    let client: UserResponse = client_response.json();
    assert_eq!(client.credits, 3, "Client should start with the configured credits");
    let client_auth = add_auth_headers(&client);

    // Step 3: With no overrides anywhere, the client is on the system default
    let frequency_response = server
        .get("/api/v1/users/current/check-in-frequency")
        .add_header(&client_auth.0, &client_auth.1)
        .await;
    assert_eq!(frequency_response.status_code(), 200);
    let frequency: EffectiveFrequencyResponse = frequency_response.json();
    assert_eq!(frequency.frequency_days, 7);
    assert_eq!(frequency.source, crate::cadence::FrequencySource::System);

    // Step 4: Coach creates a cohort with its own cadence
    let cohort_response = server
        .post("/api/v1/cohorts")
        .add_header(&coach_auth.0, &coach_auth.1)
        .json(&serde_json::json!({
            "name": "Spring Strength",
            "description": "12-week strength block",
            "check_in_frequency_days": 5
        }))
        .await;
    assert_eq!(cohort_response.status_code(), 201, "Failed to create cohort");
    let cohort: CohortResponse = cohort_response.json();
    assert_eq!(cohort.check_in_frequency_days, Some(5));

    // Step 5: Admin adds the client to the cohort; the cohort cadence takes over
    let member_response = server
        .post(&format!("/api/v1/cohorts/{}/members", cohort.id))
        .add_header(&admin_auth.0, &admin_auth.1)
        .json(&serde_json::json!({ "user_id": client.id }))
        .await;
    assert_eq!(member_response.status_code(), 201, "Failed to add cohort member");

    let frequency: EffectiveFrequencyResponse = server
        .get("/api/v1/users/current/check-in-frequency")
        .add_header(&client_auth.0, &client_auth.1)
        .await
        .json();
    assert_eq!(frequency.frequency_days, 5);
    assert_eq!(frequency.source, crate::cadence::FrequencySource::Cohort);

    // Step 6: Coach sets a personal override, which beats the cohort
    let override_response = server
        .put(&format!("/api/v1/users/{}/check-in-frequency", client.id))
        .add_header(&coach_auth.0, &coach_auth.1)
        .json(&serde_json::json!({ "frequency_days": 3 }))
        .await;
    assert_eq!(override_response.status_code(), 200, "Failed to set user override");

    let config_view: CheckInFrequencyConfigResponse = server
        .get(&format!("/api/v1/users/{}/check-in-frequency", client.id))
        .add_header(&coach_auth.0, &coach_auth.1)
        .await
        .json();
    assert_eq!(config_view.user_override, Some(3));
    assert_eq!(config_view.cohort_override, Some(5));
    assert_eq!(config_view.cohort_name.as_deref(), Some("Spring Strength"));
    assert_eq!(config_view.system_default, 7);
    assert_eq!(config_view.effective, 3);
    assert_eq!(config_view.source, crate::cadence::FrequencySource::User);

    // Step 7: Client checks in and is no longer overdue
    let before_status: CheckInStatusResponse = server
        .get("/api/v1/users/current/check-in-status")
        .add_header(&client_auth.0, &client_auth.1)
        .await
        .json();
    assert!(before_status.overdue, "A client who never checked in is overdue");
    assert!(before_status.next_due_at.is_none());

    let check_in_response = server
        .post("/api/v1/check-ins")
        .add_header(&client_auth.0, &client_auth.1)
        .json(&serde_json::json!({ "note": "Hit all three sessions this week" }))
        .await;
    assert_eq!(check_in_response.status_code(), 201, "Failed to record check-in");

    let status: CheckInStatusResponse = server
        .get("/api/v1/users/current/check-in-status")
        .add_header(&client_auth.0, &client_auth.1)
        .await
        .json();
    assert!(!status.overdue);
    assert_eq!(status.frequency_days, 3);
    assert!(status.last_check_in_at.is_some());
    let next_due = status.next_due_at.expect("next_due_at should be set after a check-in");
    let expected_due = Utc::now() + Duration::days(3);
    assert!(
        (next_due - expected_due).num_minutes().abs() < 5,
        "next_due_at should be three days out, got {next_due}"
    );

    // Step 8: Admin schedules a bootcamp; the client registers and pays a credit
    let bootcamp_response = server
        .post("/api/v1/bootcamps")
        .add_header(&admin_auth.0, &admin_auth.1)
        .json(&serde_json::json!({
            "name": "Summer Shred",
            "description": "One-day intensive",
            "starts_at": Utc::now() + Duration::days(30)
        }))
        .await;
    assert_eq!(bootcamp_response.status_code(), 201, "Failed to create bootcamp");
    let bootcamp: BootcampResponse = bootcamp_response.json();

    let registration_response = server
        .post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
        .add_header(&client_auth.0, &client_auth.1)
        .await;
    assert_eq!(registration_response.status_code(), 201, "Failed to register");
    let registration: BootcampRegistrationResponse = registration_response.json();
    assert_eq!(registration.new_balance, 2);

    let client_after_registration: UserResponse = server
        .get("/api/v1/users/current")
        .add_header(&client_auth.0, &client_auth.1)
        .await
        .json();
    assert_eq!(client_after_registration.credits, 2);

    // Step 9: Client backs out before the start date and is made whole
    let unregister_response = server
        .delete(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
        .add_header(&client_auth.0, &client_auth.1)
        .await;
    assert_eq!(unregister_response.status_code(), 204, "Failed to unregister");

    let client_after_refund: UserResponse = server
        .get("/api/v1/users/current")
        .add_header(&client_auth.0, &client_auth.1)
        .await
        .json();
    assert_eq!(client_after_refund.credits, 3);

    // Step 10: Admin raises the system default; once the client's override and
    // cohort are gone, the new default applies
    let setting_response = server
        .put("/api/v1/settings/defaultCheckInFrequencyDays")
        .add_header(&admin_auth.0, &admin_auth.1)
        .json(&serde_json::json!({ "value": "10" }))
        .await;
    assert_eq!(setting_response.status_code(), 200, "Failed to update setting");

    let clear_response = server
        .put(&format!("/api/v1/users/{}/check-in-frequency", client.id))
        .add_header(&coach_auth.0, &coach_auth.1)
        .json(&serde_json::json!({ "frequency_days": null }))
        .await;
    assert_eq!(clear_response.status_code(), 200, "Failed to clear user override");

    let remove_response = server
        .delete(&format!("/api/v1/cohorts/{}/members/{}", cohort.id, client.id))
        .add_header(&admin_auth.0, &admin_auth.1)
        .await;
    assert_eq!(remove_response.status_code(), 204, "Failed to remove cohort member");

    let frequency: EffectiveFrequencyResponse = server
        .get("/api/v1/users/current/check-in-frequency")
        .add_header(&client_auth.0, &client_auth.1)
        .await
        .json();
    assert_eq!(frequency.frequency_days, 10);
    assert_eq!(frequency.source, crate::cadence::FrequencySource::System);

    // Step 11: The audit log saw every credit movement and the settings change
    let audit: PaginatedResponse<AuditEntryResponse> = server
        .get("/api/v1/audit-log")
        .add_header(&admin_auth.0, &admin_auth.1)
        .await
        .json();
    // Initial grant, registration charge, refund, setting update
    assert_eq!(audit.total_count, 4);

    let deductions: PaginatedResponse<AuditEntryResponse> = server
        .get("/api/v1/audit-log?action=DEDUCT_CREDITS")
        .add_header(&admin_auth.0, &admin_auth.1)
        .await
        .json();
    assert_eq!(deductions.total_count, 1);
    assert_eq!(deductions.data[0].actor_id, client.id);
    assert_eq!(deductions.data[0].target_id, Some(client.id));
    let details = deductions.data[0].details.as_ref().expect("deduction should carry details");
    assert_eq!(details["amount"], -1);
    assert_eq!(details["balance_after"], 2);
    let reason = details["reason"].as_str().expect("deduction should carry a reason");
    assert!(reason.contains("Summer Shred"), "reason should name the bootcamp, got {reason}");
}

/// A user the upstream proxy vouches for is provisioned on first contact.
#[sqlx::test]
#[test_log::test]
async fn test_e2e_unknown_proxy_user_auto_created(pool: PgPool) {
    let server = create_test_app(pool.clone()).await;

    let response = server
        .get("/api/v1/users/current")
        .add_header("x-coachd-user", "fresh@example.com")
        .add_header("x-coachd-name", "Fresh Arrival")
        .await;
    assert_eq!(response.status_code(), 200);

    let user: UserResponse = response.json();
    assert_eq!(user.email, "fresh@example.com");
    assert_eq!(user.name, "Fresh Arrival");
    assert_eq!(user.role, Role::Client);
    // Auto-provisioning is not a purchase; credits are granted when an admin
    // creates the account deliberately
    assert_eq!(user.credits, 0);

    // The second request resolves to the same account
    let again: UserResponse = server
        .get("/api/v1/users/current")
        .add_header("x-coachd-user", "fresh@example.com")
        .await
        .json();
    assert_eq!(again.id, user.id);
}

/// Requests without proxy headers are rejected everywhere except the
/// operational endpoints.
#[sqlx::test]
#[test_log::test]
async fn test_e2e_unauthenticated_requests_rejected(pool: PgPool) {
    let server = create_test_app(pool).await;

    let protected = [
        "/api/v1/users",
        "/api/v1/users/current",
        "/api/v1/cohorts",
        "/api/v1/bootcamps",
        "/api/v1/settings",
        "/api/v1/audit-log",
        "/api/v1/users/current/check-in-status",
    ];
    for path in protected {
        let response = server.get(path).await;
        assert_eq!(response.status_code(), 401, "{path} should require authentication");
    }

    let health = server.get("/healthz").await;
    assert_eq!(health.status_code(), 200);
    assert_eq!(health.text(), "OK");
}

/// The OpenAPI spec and the docs UI are served without authentication.
#[sqlx::test]
#[test_log::test]
async fn test_e2e_openapi_docs_served(pool: PgPool) {
    let server = create_test_app(pool).await;

    let spec_response = server.get("/api/v1/openapi.json").await;
    assert_eq!(spec_response.status_code(), 200);
    let spec: serde_json::Value = spec_response.json();
    assert!(spec["paths"]["/users"].is_object(), "spec should document /users");
    assert!(
        spec["paths"]["/bootcamps/{bootcamp_id}/registrations"].is_object(),
        "spec should document bootcamp registrations"
    );

    let docs_response = server.get("/api/v1/docs").await;
    assert_eq!(docs_response.status_code(), 200);
}

/// Startup bootstraps the configured admin account exactly once.
#[sqlx::test]
#[test_log::test]
async fn test_initial_admin_user_bootstrap(pool: PgPool) {
    let mut config = create_test_config();
    config.admin_email = "ops@example.com".to_string();
    config.admin_name = "Ops".to_string();

    let app = crate::Application::new_with_pool(config.clone(), Some(pool.clone()))
        .await
        .expect("Failed to create application");
    drop(app);

    let mut pool_conn = pool.acquire().await.unwrap();
    let mut users = Users::new(&mut pool_conn);
    let admin = users
        .get_user_by_email("ops@example.com")
        .await
        .unwrap()
        .expect("bootstrap admin should exist");
    assert_eq!(admin.role, Role::Admin);

    // A restart finds the account and leaves it alone
    let app = crate::Application::new_with_pool(config, Some(pool.clone()))
        .await
        .expect("Failed to create application on restart");
    drop(app);

    let again = users.get_user_by_email("ops@example.com").await.unwrap().unwrap();
    assert_eq!(again.id, admin.id);

    let admin_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind("ops@example.com")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(admin_count, 1);
}

/// Seeding never clobbers a value an admin has changed.
#[sqlx::test]
#[test_log::test]
async fn test_seeded_setting_survives_restart(pool: PgPool) {
    let server = create_test_app(pool.clone()).await;
    let admin = create_test_user(&pool, Role::Admin).await;
    let admin_auth = add_auth_headers(&admin);

    let response = server
        .put("/api/v1/settings/defaultCheckInFrequencyDays")
        .add_header(&admin_auth.0, &admin_auth.1)
        .json(&serde_json::json!({ "value": "14" }))
        .await;
    assert_eq!(response.status_code(), 200);

    // Simulate a restart against the same database
    let restarted = create_test_app(pool.clone()).await;

    let value: String = sqlx::query_scalar("SELECT value FROM system_settings WHERE key = $1")
        .bind(crate::settings::DEFAULT_CHECK_IN_FREQUENCY_KEY)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(value, "14", "seeding on restart must not reset the admin's value");

    // And the restarted instance serves the kept value
    let client = create_test_user(&pool, Role::Client).await;
    let client_auth = add_auth_headers(&client);
    let frequency: EffectiveFrequencyResponse = restarted
        .get("/api/v1/users/current/check-in-frequency")
        .add_header(&client_auth.0, &client_auth.1)
        .await
        .json();
    assert_eq!(frequency.frequency_days, 14);
}

/// Metrics exposure is opt-in.
#[sqlx::test]
#[test_log::test]
async fn test_metrics_endpoint_disabled_by_default(pool: PgPool) {
    let server = create_test_app(pool).await;

    let response = server.get("/internal/metrics").await;
    assert_eq!(response.status_code(), 404);
}

#[sqlx::test]
#[test_log::test]
async fn test_metrics_endpoint_when_enabled(pool: PgPool) {
    let mut config = create_test_config();
    config.enable_metrics = true;

    let app = crate::Application::new_with_pool(config, Some(pool.clone()))
        .await
        .expect("Failed to create application");
    let server = app.into_test_server();

    // Generate some traffic so there is something to report
    server.get("/healthz").await;

    let response = server.get("/internal/metrics").await;
    assert_eq!(response.status_code(), 200);
    assert!(
        response.text().contains("axum_http_requests_total"),
        "metrics output should include request counters"
    );
}
