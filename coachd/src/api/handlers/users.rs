use crate::{
    AppState,
    api::models::{
        pagination::PaginatedResponse,
        users::{CurrentUser, ListUsersQuery, Role, UserCreate, UserResponse, UserUpdate},
    },
    auth::permissions::{RequiresPermission, can_read_all_resources, can_read_own_resource, can_update_own_resource, has_permission, operation, resource},
    db::{
        handlers::{Credits, Repository, Users},
        models::{
            credits::CreditDeltaDBRequest,
            users::{UserCreateDBRequest, UserUpdateDBRequest},
        },
    },
    errors::{Error, Result},
    types::{Operation, Permission, Resource, UserId},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

fn validate_email(email: &str) -> Result<()> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(Error::BadRequest {
            message: "Email must be a valid address".to_string(),
        });
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Name must not be empty".to_string(),
        });
    }
    Ok(())
}

/// List users with optional role and search filters
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    description = "List users sorted by name, with optional role filter and case-insensitive \
                   name/email search. Requires coach or admin role.",
    params(
        ListUsersQuery,
    ),
    responses(
        (status = 200, description = "Page of users", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    _perm: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut filter = crate::db::handlers::users::UserFilter::new(skip, limit);
    if let Some(role) = query.role {
        filter = filter.with_role(role);
    }
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let total_count = repo.count(&filter).await?;
    let users = repo.list(&filter).await?;

    Ok(Json(PaginatedResponse {
        data: users.into_iter().map(UserResponse::from).collect(),
        total_count,
        skip,
        limit,
    }))
}

/// Create a new user (admin only)
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    description = "Create a user with the given role. New clients receive the configured initial \
                   credit grant through the ledger, attributed to the system user.",
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid email or name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 409, description = "A user with this email already exists"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    _perm: RequiresPermission<resource::Users, operation::CreateAll>,
    Json(data): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    validate_email(&data.email)?;
    validate_name(&data.name)?;

    let initial_credits = state.config.credits.initial_credits_for_clients;
    let grant_initial = data.role == Role::Client && initial_credits > 0;

    // One transaction: if the grant fails, the account is not created either
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut user = Users::new(&mut tx).create(&UserCreateDBRequest::from(data)).await?;

    if grant_initial {
        let delta = CreditDeltaDBRequest::initial_grant(user.id, initial_credits);
        let applied = Credits::new(&mut tx).apply_delta(&delta).await?;
        user.credits = applied.new_balance;
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get the currently authenticated user
#[utoipa::path(
    get,
    path = "/users/current",
    tag = "users",
    summary = "Get current user",
    description = "Full record of the currently authenticated user, including credit balance \
                   and personal check-in frequency override",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_current_user(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let user = repo.get_by_id(current_user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "user".to_string(),
        id: current_user.id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Get user",
    description = "Get a user by ID. Coaches and admins can read anyone; clients only themselves.",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
    ),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    current_user: RequiresPermission<resource::Users, operation::ReadOwn>,
) -> Result<Json<UserResponse>> {
    if !can_read_all_resources(&current_user, Resource::Users) && !can_read_own_resource(&current_user, Resource::Users, user_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Users, Operation::ReadAll),
            action: Operation::ReadAll,
            resource: Resource::Users.to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let user = repo.get_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "user".to_string(),
        id: user_id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// Update a user's profile
#[utoipa::path(
    patch,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Update user",
    description = "Partial update of email, name, or role. Users can update their own email and \
                   name; only admins can update other users or change roles.",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid email or name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "A user with this email already exists"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    current_user: RequiresPermission<resource::Users, operation::UpdateOwn>,
    Json(data): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    if !has_permission(&current_user, Resource::Users, Operation::UpdateAll) && !can_update_own_resource(&current_user, Resource::Users, user_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Users, Operation::UpdateAll),
            action: Operation::UpdateAll,
            resource: Resource::Users.to_string(),
        });
    }

    // Role changes stay admin-only even on your own account
    if data.role.is_some() && !has_permission(&current_user, Resource::Users, Operation::UpdateAll) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Users, Operation::UpdateAll),
            action: Operation::UpdateAll,
            resource: Resource::Users.to_string(),
        });
    }

    if let Some(ref email) = data.email {
        validate_email(email)?;
    }
    if let Some(ref name) = data.name {
        validate_name(name)?;
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let user = repo.update(user_id, &UserUpdateDBRequest::new(data)).await?;

    Ok(Json(UserResponse::from(user)))
}

/// Delete a user (admin only)
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Delete user",
    description = "Delete a user and their memberships, check-ins, and ledger rows. Admins \
                   cannot delete their own account.",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Attempted to delete own account"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    current_user: RequiresPermission<resource::Users, operation::DeleteAll>,
) -> Result<StatusCode> {
    if user_id == current_user.id {
        return Err(Error::BadRequest {
            message: "Cannot delete your own account".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let deleted = repo.delete(user_id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "user".to_string(),
            id: user_id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}
