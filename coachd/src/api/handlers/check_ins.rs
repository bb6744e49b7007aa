use crate::{
    AppState,
    api::models::{
        check_ins::{CheckInCreate, CheckInResponse, CheckInStatusResponse, ListCheckInsQuery},
        pagination::PaginatedResponse,
        users::CurrentUser,
    },
    auth::permissions::{RequiresPermission, has_permission, operation, resource},
    cadence::{self, FrequencySource, MISSING_USER_FREQUENCY_DAYS},
    db::{
        handlers::{CheckIns, Repository, Users},
        models::check_ins::CheckInCreateDBRequest,
    },
    errors::{Error, Result},
    types::{Operation, Permission, Resource, UserId},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, Utc};
use tracing::warn;

/// Record a check-in
#[utoipa::path(
    post,
    path = "/check-ins",
    tag = "check-ins",
    summary = "Record check-in",
    description = "Record a check-in with an optional note. Clients check in for themselves; \
                   coaches and admins can pass `user_id` to record on a client's behalf.",
    responses(
        (status = 201, description = "Check-in recorded", body = CheckInResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - recording for another user requires coach or admin role"),
        (status = 404, description = "Target user not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn create_check_in(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::CheckIns, operation::CreateOwn>,
    Json(data): Json<CheckInCreate>,
) -> Result<(StatusCode, Json<CheckInResponse>)> {
    let target_user_id = data.user_id.unwrap_or(current_user.id);

    if target_user_id != current_user.id && !has_permission(&current_user, Resource::CheckIns, Operation::CreateAll) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::CheckIns, Operation::CreateAll),
            action: Operation::CreateAll,
            resource: Resource::CheckIns.to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = CheckIns::new(&mut pool_conn);

    let check_in = repo
        .create(&CheckInCreateDBRequest {
            user_id: target_user_id,
            note: data.note,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CheckInResponse::from(check_in))))
}

/// List a user's check-in history
#[utoipa::path(
    get,
    path = "/users/{user_id}/check-ins",
    tag = "check-ins",
    summary = "List check-ins",
    description = "Check-in history for a user, newest first. Coaches and admins can read anyone; \
                   clients only themselves.",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
        ListCheckInsQuery,
    ),
    responses(
        (status = 200, description = "Page of check-ins", body = PaginatedResponse<CheckInResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn list_user_check_ins(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<ListCheckInsQuery>,
    current_user: RequiresPermission<resource::CheckIns, operation::ReadOwn>,
) -> Result<Json<PaginatedResponse<CheckInResponse>>> {
    if user_id != current_user.id && !has_permission(&current_user, Resource::CheckIns, Operation::ReadAll) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::CheckIns, Operation::ReadAll),
            action: Operation::ReadAll,
            resource: Resource::CheckIns.to_string(),
        });
    }

    let (skip, limit) = query.pagination.params();

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Users::new(&mut pool_conn).get_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "user".to_string(),
        id: user_id.to_string(),
    })?;

    let mut repo = CheckIns::new(&mut pool_conn);
    let total_count = repo.count_for_user(user_id).await?;
    let check_ins = repo.list_for_user(user_id, skip, limit).await?;

    Ok(Json(PaginatedResponse {
        data: check_ins.into_iter().map(CheckInResponse::from).collect(),
        total_count,
        skip,
        limit,
    }))
}

/// Get the current user's check-in status
#[utoipa::path(
    get,
    path = "/users/current/check-in-status",
    tag = "check-ins",
    summary = "Get my check-in status",
    description = "Where the authenticated user stands against their cadence: last check-in, \
                   effective frequency, when the next one is due, and whether they are overdue. \
                   A user who has never checked in is due immediately (`next_due_at` is null, \
                   `overdue` is true).",
    responses(
        (status = 200, description = "Check-in status", body = CheckInStatusResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_my_check_in_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<CheckInStatusResponse>> {
    let snapshot = state.settings_cache.snapshot().await?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (frequency_days, source) = match cadence::resolve(&mut pool_conn, &snapshot, current_user.id).await? {
        Some(resolved) => (resolved.frequency_days, resolved.source),
        None => {
            warn!(user_id = %current_user.id, "Authenticated user disappeared during cadence resolution");
            (MISSING_USER_FREQUENCY_DAYS, FrequencySource::System)
        }
    };

    let last = CheckIns::new(&mut pool_conn).last_for_user(current_user.id).await?;
    let last_check_in_at = last.map(|check_in| check_in.created_at);
    let next_due_at = last_check_in_at.map(|at| at + Duration::days(i64::from(frequency_days)));
    let overdue = match next_due_at {
        Some(due) => due <= Utc::now(),
        // Never checked in: due immediately
        None => true,
    };

    Ok(Json(CheckInStatusResponse {
        last_check_in_at,
        frequency_days,
        source,
        next_due_at,
        overdue,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_app_state, create_test_user};
    use serde_json::json;
    use sqlx::PgPool;

    /// Pushes every check-in for a user into the past so due dates land
    /// behind `now`.
    async fn backdate_check_ins(pool: &PgPool, user_id: UserId, days: i32) {
        sqlx::query("UPDATE check_ins SET created_at = NOW() - make_interval(days => $2) WHERE user_id = $1")
            .bind(user_id)
            .bind(days)
            .execute(pool)
            .await
            .expect("backdating check-ins should work");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_client_records_own_check_in(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let client = create_test_user(&pool, Role::Client).await;

        let response = app
            .post("/api/v1/check-ins")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .json(&json!({ "note": "Crushed leg day" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let check_in: CheckInResponse = response.json();
        assert_eq!(check_in.user_id, client.id);
        assert_eq!(check_in.note.as_deref(), Some("Crushed leg day"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_client_cannot_record_for_others(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let client = create_test_user(&pool, Role::Client).await;
        let other = create_test_user(&pool, Role::Client).await;

        let response = app
            .post("/api/v1/check-ins")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .json(&json!({ "user_id": other.id }))
            .await;

        response.assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_coach_records_on_behalf_of_client(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let coach = create_test_user(&pool, Role::Coach).await;
        let client = create_test_user(&pool, Role::Client).await;

        let response = app
            .post("/api/v1/check-ins")
            .add_header(add_auth_headers(&coach).0, add_auth_headers(&coach).1)
            .json(&json!({ "user_id": client.id, "note": "Called in by phone" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let check_in: CheckInResponse = response.json();
        assert_eq!(check_in.user_id, client.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_check_in_for_unknown_user_404(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let coach = create_test_user(&pool, Role::Coach).await;

        let response = app
            .post("/api/v1/check-ins")
            .add_header(add_auth_headers(&coach).0, add_auth_headers(&coach).1)
            .json(&json!({ "user_id": uuid::Uuid::new_v4() }))
            .await;

        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_check_in_unauthenticated(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;

        let response = app.post("/api/v1/check-ins").json(&json!({ "note": "Anonymous" })).await;
        response.assert_status_unauthorized();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_own_check_ins(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let client = create_test_user(&pool, Role::Client).await;

        for i in 0..3 {
            let response = app
                .post("/api/v1/check-ins")
                .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
                .json(&json!({ "note": format!("day {i}") }))
                .await;
            response.assert_status(StatusCode::CREATED);
        }

        let response = app
            .get(&format!("/api/v1/users/{}/check-ins", client.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_ok();
        let page: PaginatedResponse<CheckInResponse> = response.json();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.data.len(), 3);
        // Newest first
        assert_eq!(page.data[0].note.as_deref(), Some("day 2"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_check_ins_pagination(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let client = create_test_user(&pool, Role::Client).await;

        for i in 0..5 {
            app.post("/api/v1/check-ins")
                .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
                .json(&json!({ "note": format!("day {i}") }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let response = app
            .get(&format!("/api/v1/users/{}/check-ins?skip=2&limit=2", client.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_ok();
        let page: PaginatedResponse<CheckInResponse> = response.json();
        assert_eq!(page.total_count, 5);
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.data[0].note.as_deref(), Some("day 2"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_other_users_check_ins_requires_coach(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let coach = create_test_user(&pool, Role::Coach).await;
        let client = create_test_user(&pool, Role::Client).await;
        let other = create_test_user(&pool, Role::Client).await;

        app.post("/api/v1/check-ins")
            .add_header(add_auth_headers(&other).0, add_auth_headers(&other).1)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .get(&format!("/api/v1/users/{}/check-ins", other.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;
        response.assert_status_forbidden();

        let response = app
            .get(&format!("/api/v1/users/{}/check-ins", other.id))
            .add_header(add_auth_headers(&coach).0, add_auth_headers(&coach).1)
            .await;
        response.assert_status_ok();
        let page: PaginatedResponse<CheckInResponse> = response.json();
        assert_eq!(page.total_count, 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_check_ins_unknown_user_404(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let coach = create_test_user(&pool, Role::Coach).await;

        let response = app
            .get(&format!("/api/v1/users/{}/check-ins", uuid::Uuid::new_v4()))
            .add_header(add_auth_headers(&coach).0, add_auth_headers(&coach).1)
            .await;

        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_never_checked_in(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let client = create_test_user(&pool, Role::Client).await;

        let response = app
            .get("/api/v1/users/current/check-in-status")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_ok();
        let status: CheckInStatusResponse = response.json();
        assert_eq!(status.last_check_in_at, None);
        assert_eq!(status.next_due_at, None);
        assert!(status.overdue);
        assert_eq!(status.frequency_days, 7);
        assert_eq!(status.source, FrequencySource::System);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_after_recent_check_in(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let client = create_test_user(&pool, Role::Client).await;

        app.post("/api/v1/check-ins")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .json(&json!({ "note": "fresh" }))
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .get("/api/v1/users/current/check-in-status")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_ok();
        let status: CheckInStatusResponse = response.json();
        let last = status.last_check_in_at.expect("just checked in");
        assert_eq!(status.next_due_at, Some(last + Duration::days(7)));
        assert!(!status.overdue);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_overdue_when_cadence_elapsed(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let client = create_test_user(&pool, Role::Client).await;

        app.post("/api/v1/check-ins")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::CREATED);
        backdate_check_ins(&pool, client.id, 10).await;

        let response = app
            .get("/api/v1/users/current/check-in-status")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_ok();
        let status: CheckInStatusResponse = response.json();
        assert!(status.overdue);
        assert!(status.next_due_at.expect("has a due date") <= Utc::now());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_uses_personal_override(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let coach = create_test_user(&pool, Role::Coach).await;
        let client = create_test_user(&pool, Role::Client).await;

        app.put(&format!("/api/v1/users/{}/check-in-frequency", client.id))
            .add_header(add_auth_headers(&coach).0, add_auth_headers(&coach).1)
            .json(&json!({ "frequency_days": 2 }))
            .await
            .assert_status_ok();

        app.post("/api/v1/check-ins")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::CREATED);
        backdate_check_ins(&pool, client.id, 3).await;

        let response = app
            .get("/api/v1/users/current/check-in-status")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_ok();
        let status: CheckInStatusResponse = response.json();
        assert_eq!(status.frequency_days, 2);
        assert_eq!(status.source, FrequencySource::User);
        // Last check-in 3 days ago on a 2-day cadence
        assert!(status.overdue);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_when_user_vanishes_after_auth(pool: PgPool) {
        let state = create_test_app_state(pool.clone());
        let client = create_test_user(&pool, Role::Client).await;
        let current_user = CurrentUser {
            id: client.id,
            email: client.email.clone(),
            name: client.name.clone(),
            role: client.role,
        };

        // Deleted between header authentication and resolution
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(client.id)
            .execute(&pool)
            .await
            .expect("deleting the user should work");

        // Falls back to the shortest cadence instead of erroring
        let Json(status) = get_my_check_in_status(State(state), current_user)
            .await
            .expect("status endpoint should not error for a vanished user");

        assert_eq!(status.frequency_days, MISSING_USER_FREQUENCY_DAYS);
        assert_eq!(status.source, FrequencySource::System);
        assert_eq!(status.last_check_in_at, None);
        assert!(status.overdue, "a vanished user is due immediately");
    }
}
