use crate::{
    AppState,
    api::models::{
        bootcamps::{
            BootcampCreate, BootcampRegistrantResponse, BootcampRegistrationResponse, BootcampResponse, BootcampUpdate, ListBootcampsQuery,
        },
        pagination::PaginatedResponse,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::{Bootcamps, Repository, bootcamps::BootcampFilter},
        models::bootcamps::{BootcampCreateDBRequest, BootcampDBResponse, BootcampUpdateDBRequest},
    },
    errors::{Error, Result},
    types::BootcampId,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use sqlx::PgConnection;

fn validate_bootcamp_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Bootcamp name must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Look up a bootcamp and reject the operation once it has started.
async fn get_open_bootcamp(db: &mut PgConnection, bootcamp_id: BootcampId, action: &str) -> Result<BootcampDBResponse> {
    let bootcamp = Bootcamps::new(db).get_by_id(bootcamp_id).await?.ok_or_else(|| Error::NotFound {
        resource: "bootcamp".to_string(),
        id: bootcamp_id.to_string(),
    })?;

    if bootcamp.starts_at <= Utc::now() {
        return Err(Error::BadRequest {
            message: format!("Cannot {action}: bootcamp '{}' has already started", bootcamp.name),
        });
    }

    Ok(bootcamp)
}

/// List bootcamps
#[utoipa::path(
    get,
    path = "/bootcamps",
    tag = "bootcamps",
    summary = "List bootcamps",
    description = "List bootcamps ordered by start time, soonest first",
    params(
        ListBootcampsQuery,
    ),
    responses(
        (status = 200, description = "Page of bootcamps", body = PaginatedResponse<BootcampResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn list_bootcamps(
    State(state): State<AppState>,
    Query(query): Query<ListBootcampsQuery>,
    _perm: RequiresPermission<resource::Bootcamps, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<BootcampResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bootcamps::new(&mut pool_conn);

    let total_count = repo.count().await?;
    let bootcamps = repo.list(&BootcampFilter::new(skip, limit)).await?;

    Ok(Json(PaginatedResponse {
        data: bootcamps.into_iter().map(BootcampResponse::from).collect(),
        total_count,
        skip,
        limit,
    }))
}

/// Create a bootcamp (admin only)
#[utoipa::path(
    post,
    path = "/bootcamps",
    tag = "bootcamps",
    summary = "Create bootcamp",
    description = "Create a bootcamp that clients can register for until it starts",
    responses(
        (status = 201, description = "Bootcamp created", body = BootcampResponse),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn create_bootcamp(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Bootcamps, operation::CreateAll>,
    Json(data): Json<BootcampCreate>,
) -> Result<(StatusCode, Json<BootcampResponse>)> {
    validate_bootcamp_name(&data.name)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bootcamps::new(&mut pool_conn);

    let bootcamp = repo
        .create(&BootcampCreateDBRequest {
            name: data.name,
            description: data.description,
            starts_at: data.starts_at,
            created_by: current_user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(BootcampResponse::from(bootcamp))))
}

/// Get a bootcamp by ID
#[utoipa::path(
    get,
    path = "/bootcamps/{bootcamp_id}",
    tag = "bootcamps",
    summary = "Get bootcamp",
    params(
        ("bootcamp_id" = String, Path, description = "Bootcamp ID (UUID)"),
    ),
    responses(
        (status = 200, description = "The bootcamp", body = BootcampResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bootcamp not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<BootcampId>,
    _perm: RequiresPermission<resource::Bootcamps, operation::ReadAll>,
) -> Result<Json<BootcampResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bootcamps::new(&mut pool_conn);

    let bootcamp = repo.get_by_id(bootcamp_id).await?.ok_or_else(|| Error::NotFound {
        resource: "bootcamp".to_string(),
        id: bootcamp_id.to_string(),
    })?;

    Ok(Json(BootcampResponse::from(bootcamp)))
}

/// Update a bootcamp (admin only)
#[utoipa::path(
    patch,
    path = "/bootcamps/{bootcamp_id}",
    tag = "bootcamps",
    summary = "Update bootcamp",
    description = "Partial update of name, description, or start time",
    params(
        ("bootcamp_id" = String, Path, description = "Bootcamp ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Updated bootcamp", body = BootcampResponse),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Bootcamp not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn update_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<BootcampId>,
    _perm: RequiresPermission<resource::Bootcamps, operation::UpdateAll>,
    Json(data): Json<BootcampUpdate>,
) -> Result<Json<BootcampResponse>> {
    if let Some(ref name) = data.name {
        validate_bootcamp_name(name)?;
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bootcamps::new(&mut pool_conn);

    let bootcamp = repo
        .update(
            bootcamp_id,
            &BootcampUpdateDBRequest {
                name: data.name,
                description: data.description,
                starts_at: data.starts_at,
            },
        )
        .await?;

    Ok(Json(BootcampResponse::from(bootcamp)))
}

/// Delete a bootcamp (admin only)
#[utoipa::path(
    delete,
    path = "/bootcamps/{bootcamp_id}",
    tag = "bootcamps",
    summary = "Delete bootcamp",
    description = "Delete a bootcamp and its registrations. Credits already spent on \
                   registrations are not refunded.",
    params(
        ("bootcamp_id" = String, Path, description = "Bootcamp ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Bootcamp deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Bootcamp not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn delete_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<BootcampId>,
    _perm: RequiresPermission<resource::Bootcamps, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bootcamps::new(&mut pool_conn);

    let deleted = repo.delete(bootcamp_id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "bootcamp".to_string(),
            id: bootcamp_id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Register the current user for a bootcamp
#[utoipa::path(
    post,
    path = "/bootcamps/{bootcamp_id}/registrations",
    tag = "bootcamps",
    summary = "Register for bootcamp",
    description = "Register the authenticated user, consuming one credit through the ledger. \
                   Registration closes at the start time; a second registration for the same \
                   bootcamp is rejected before any credits move.",
    params(
        ("bootcamp_id" = String, Path, description = "Bootcamp ID (UUID)"),
    ),
    responses(
        (status = 201, description = "Registered", body = BootcampRegistrationResponse),
        (status = 400, description = "Bootcamp already started or insufficient credits"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Bootcamp not found"),
        (status = 409, description = "Already registered"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn register_for_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<BootcampId>,
    current_user: RequiresPermission<resource::Bootcamps, operation::CreateOwn>,
) -> Result<(StatusCode, Json<BootcampRegistrationResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let bootcamp = get_open_bootcamp(&mut pool_conn, bootcamp_id, "register").await?;

    // The repository charges the fee, writes the ledger row, and records the
    // audit entry in one transaction with the registration itself
    let (registration, new_balance) = Bootcamps::new(&mut pool_conn)
        .register(bootcamp_id, current_user.id, &bootcamp.name)
        .await?;

    Ok((StatusCode::CREATED, Json(BootcampRegistrationResponse::from_db(registration, new_balance))))
}

/// Unregister the current user from a bootcamp
#[utoipa::path(
    delete,
    path = "/bootcamps/{bootcamp_id}/registrations",
    tag = "bootcamps",
    summary = "Unregister from bootcamp",
    description = "Drop the authenticated user's registration and refund the credit. Only \
                   possible before the bootcamp starts; afterwards the credit is forfeit.",
    params(
        ("bootcamp_id" = String, Path, description = "Bootcamp ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Unregistered, credit refunded"),
        (status = 400, description = "Bootcamp already started"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Bootcamp or registration not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn unregister_from_bootcamp(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<BootcampId>,
    current_user: RequiresPermission<resource::Bootcamps, operation::DeleteOwn>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let bootcamp = get_open_bootcamp(&mut pool_conn, bootcamp_id, "unregister").await?;

    Bootcamps::new(&mut pool_conn)
        .unregister(bootcamp_id, current_user.id, &bootcamp.name)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// List a bootcamp's registrations
#[utoipa::path(
    get,
    path = "/bootcamps/{bootcamp_id}/registrations",
    tag = "bootcamps",
    summary = "List bootcamp registrations",
    description = "Registered participants with their identity, in registration order. Requires \
                   coach or admin role.",
    params(
        ("bootcamp_id" = String, Path, description = "Bootcamp ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Registered participants", body = [BootcampRegistrantResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Bootcamp not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn list_bootcamp_registrations(
    State(state): State<AppState>,
    Path(bootcamp_id): Path<BootcampId>,
    _perm: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<Json<Vec<BootcampRegistrantResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Bootcamps::new(&mut pool_conn);

    repo.get_by_id(bootcamp_id).await?.ok_or_else(|| Error::NotFound {
        resource: "bootcamp".to_string(),
        id: bootcamp_id.to_string(),
    })?;

    let registrants = repo.list_registrants(bootcamp_id).await?;

    Ok(Json(registrants.into_iter().map(BootcampRegistrantResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_user};
    use chrono::{Duration, Utc};
    use serde_json::json;
    use sqlx::PgPool;

    async fn create_bootcamp(
        app: &axum_test::TestServer,
        admin: &crate::api::models::users::UserResponse,
        name: &str,
        starts_in_days: i64,
    ) -> BootcampResponse {
        let response = app
            .post("/api/v1/bootcamps")
            .add_header(add_auth_headers(admin).0, add_auth_headers(admin).1)
            .json(&json!({ "name": name, "starts_at": Utc::now() + Duration::days(starts_in_days) }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    async fn fund(app: &axum_test::TestServer, admin: &crate::api::models::users::UserResponse, user_id: crate::types::UserId, amount: i32) {
        let response = app
            .post(&format!("/api/v1/users/{user_id}/credits"))
            .add_header(add_auth_headers(admin).0, add_auth_headers(admin).1)
            .json(&json!({ "amount": amount, "reason": "Funding" }))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_bootcamp_crud(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;

        let bootcamp = create_bootcamp(&app, &admin, "Summer Shred", 14).await;
        assert_eq!(bootcamp.name, "Summer Shred");
        assert_eq!(bootcamp.created_by, admin.id);

        let response = app
            .patch(&format!("/api/v1/bootcamps/{}", bootcamp.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .json(&json!({ "description": "Six weeks of pain" }))
            .await;
        response.assert_status_ok();
        let updated: BootcampResponse = response.json();
        assert_eq!(updated.description.as_deref(), Some("Six weeks of pain"));

        let response = app
            .delete(&format!("/api/v1/bootcamps/{}", bootcamp.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = app
            .get(&format!("/api/v1/bootcamps/{}", bootcamp.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .await;
        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_clients_browse_but_cannot_manage(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Open House", 7).await;

        let response = app
            .get("/api/v1/bootcamps")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;
        response.assert_status_ok();
        let page: PaginatedResponse<BootcampResponse> = response.json();
        assert_eq!(page.total_count, 1);

        let response = app
            .post("/api/v1/bootcamps")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .json(&json!({ "name": "Client Camp", "starts_at": Utc::now() + Duration::days(3) }))
            .await;
        response.assert_status_forbidden();

        let response = app
            .patch(&format!("/api/v1/bootcamps/{}", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .json(&json!({ "name": "Hijacked" }))
            .await;
        response.assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_consumes_credit(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Summer Shred", 14).await;
        fund(&app, &admin, client.id, 2).await;

        let response = app
            .post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status(StatusCode::CREATED);
        let registration: BootcampRegistrationResponse = response.json();
        assert_eq!(registration.bootcamp_id, bootcamp.id);
        assert_eq!(registration.user_id, client.id);
        assert_eq!(registration.new_balance, 1);

        // The fee is a ledger row naming the bootcamp
        let response = app
            .get(&format!("/api/v1/users/{}/credits/history", client.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .await;
        let history: Vec<crate::api::models::credits::CreditTransactionWithActorResponse> = response.json();
        assert_eq!(history[0].amount, -1);
        assert!(history[0].reason.contains("Summer Shred"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_without_credits_rejected(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Too Rich For You", 14).await;

        let response = app
            .post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_bad_request();

        // No registration row survived the failed fee
        let response = app
            .get(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .await;
        let registrants: Vec<BootcampRegistrantResponse> = response.json();
        assert!(registrants.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_registration_conflicts(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Once Only", 14).await;
        fund(&app, &admin, client.id, 5).await;

        app.post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;
        response.assert_status(StatusCode::CONFLICT);

        // The duplicate attempt charged nothing
        let response = app
            .get("/api/v1/users/current")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;
        let user: crate::api::models::users::UserResponse = response.json();
        assert_eq!(user.credits, 4);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_after_start_rejected(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Yesterday's News", -1).await;
        fund(&app, &admin, client.id, 1).await;

        let response = app
            .post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_bad_request();
        assert!(response.text().contains("already started"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_missing_bootcamp_404(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let client = create_test_user(&pool, Role::Client).await;

        let response = app
            .post(&format!("/api/v1/bootcamps/{}/registrations", uuid::Uuid::new_v4()))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_coach_cannot_register(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let coach = create_test_user(&pool, Role::Coach).await;
        let bootcamp = create_bootcamp(&app, &admin, "Clients Only", 14).await;

        let response = app
            .post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&coach).0, add_auth_headers(&coach).1)
            .await;

        response.assert_status_forbidden();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unregister_refunds_credit(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Refundable", 14).await;
        fund(&app, &admin, client.id, 1).await;

        app.post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .delete(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = app
            .get("/api/v1/users/current")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;
        let user: crate::api::models::users::UserResponse = response.json();
        assert_eq!(user.credits, 1);

        // Fee and refund both remain in the ledger
        let response = app
            .get(&format!("/api/v1/users/{}/credits/history", client.id))
            .add_header(add_auth_headers(&admin).0, add_auth_headers(&admin).1)
            .await;
        let history: Vec<crate::api::models::credits::CreditTransactionWithActorResponse> = response.json();
        assert_eq!(history.len(), 3);
        assert!(history[0].reason.contains("refund"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unregister_after_start_rejected(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Point Of No Return", 14).await;
        fund(&app, &admin, client.id, 1).await;

        app.post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await
            .assert_status(StatusCode::CREATED);

        // Move the start time into the past
        sqlx::query("UPDATE bootcamps SET starts_at = NOW() - INTERVAL '1 hour' WHERE id = $1")
            .bind(bootcamp.id)
            .execute(&pool)
            .await
            .expect("backdating the bootcamp should work");

        let response = app
            .delete(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_bad_request();

        // No refund happened
        let response = app
            .get("/api/v1/users/current")
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;
        let user: crate::api::models::users::UserResponse = response.json();
        assert_eq!(user.credits, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unregister_without_registration_404(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Never Joined", 14).await;

        let response = app
            .delete(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;

        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_registration_list_visible_to_coach_not_client(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let coach = create_test_user(&pool, Role::Coach).await;
        let client = create_test_user(&pool, Role::Client).await;
        let bootcamp = create_bootcamp(&app, &admin, "Roster", 14).await;
        fund(&app, &admin, client.id, 1).await;

        app.post(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await
            .assert_status(StatusCode::CREATED);

        let response = app
            .get(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&coach).0, add_auth_headers(&coach).1)
            .await;
        response.assert_status_ok();
        let registrants: Vec<BootcampRegistrantResponse> = response.json();
        assert_eq!(registrants.len(), 1);
        assert_eq!(registrants[0].email, client.email);

        let response = app
            .get(&format!("/api/v1/bootcamps/{}/registrations", bootcamp.id))
            .add_header(add_auth_headers(&client).0, add_auth_headers(&client).1)
            .await;
        response.assert_status_forbidden();
    }
}
