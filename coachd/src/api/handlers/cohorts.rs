use crate::{
    AppState,
    api::models::{
        cohorts::{AddMemberRequest, CohortCreate, CohortMemberResponse, CohortMembershipResponse, CohortResponse, CohortUpdate, ListCohortsQuery},
        pagination::PaginatedResponse,
    },
    auth::permissions::{RequiresPermission, can_read_all_resources, operation, resource},
    db::{
        handlers::{Cohorts, Repository, cohorts::CohortFilter},
        models::cohorts::{CohortCreateDBRequest, CohortUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{CohortId, Operation, Permission, Resource, UserId},
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

use super::cadence::validate_frequency_days;

fn validate_cohort_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Cohort name must not be empty".to_string(),
        });
    }
    Ok(())
}

/// List cohorts
#[utoipa::path(
    get,
    path = "/cohorts",
    tag = "cohorts",
    summary = "List cohorts",
    description = "List cohorts sorted by name, with optional case-insensitive name/description \
                   search. Requires coach or admin role.",
    params(
        ListCohortsQuery,
    ),
    responses(
        (status = 200, description = "Page of cohorts", body = PaginatedResponse<CohortResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn list_cohorts(
    State(state): State<AppState>,
    Query(query): Query<ListCohortsQuery>,
    _perm: RequiresPermission<resource::Cohorts, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<CohortResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut filter = CohortFilter::new(skip, limit);
    if let Some(search) = query.search {
        filter = filter.with_search(search);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cohorts::new(&mut pool_conn);

    let total_count = repo.count(&filter).await?;
    let cohorts = repo.list(&filter).await?;

    Ok(Json(PaginatedResponse {
        data: cohorts.into_iter().map(CohortResponse::from).collect(),
        total_count,
        skip,
        limit,
    }))
}

/// Create a cohort
#[utoipa::path(
    post,
    path = "/cohorts",
    tag = "cohorts",
    summary = "Create cohort",
    description = "Create a cohort, optionally with a cohort-level check-in frequency override \
                   ([1, 90] days). Requires coach or admin role.",
    responses(
        (status = 201, description = "Cohort created", body = CohortResponse),
        (status = 400, description = "Empty name or frequency out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn create_cohort(
    State(state): State<AppState>,
    current_user: RequiresPermission<resource::Cohorts, operation::CreateAll>,
    Json(data): Json<CohortCreate>,
) -> Result<(StatusCode, Json<CohortResponse>)> {
    validate_cohort_name(&data.name)?;
    validate_frequency_days(data.check_in_frequency_days)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cohorts::new(&mut pool_conn);

    let cohort = repo
        .create(&CohortCreateDBRequest {
            name: data.name,
            description: data.description,
            check_in_frequency_days: data.check_in_frequency_days,
            created_by: current_user.id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CohortResponse::from(cohort))))
}

/// Get a cohort by ID
#[utoipa::path(
    get,
    path = "/cohorts/{cohort_id}",
    tag = "cohorts",
    summary = "Get cohort",
    description = "Get a cohort by ID. Coaches and admins can read any cohort; clients only the \
                   one they hold an active membership in.",
    params(
        ("cohort_id" = String, Path, description = "Cohort ID (UUID)"),
    ),
    responses(
        (status = 200, description = "The cohort", body = CohortResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cohort not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_cohort(
    State(state): State<AppState>,
    Path(cohort_id): Path<CohortId>,
    current_user: RequiresPermission<resource::Cohorts, operation::ReadOwn>,
) -> Result<Json<CohortResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cohorts::new(&mut pool_conn);

    if !can_read_all_resources(&current_user, Resource::Cohorts) {
        // "Own" for cohorts means holding the active membership
        let membership = repo.active_membership_for_user(current_user.id).await?;
        if membership.map(|m| m.cohort_id) != Some(cohort_id) {
            return Err(Error::InsufficientPermissions {
                required: Permission::Allow(Resource::Cohorts, Operation::ReadAll),
                action: Operation::ReadAll,
                resource: Resource::Cohorts.to_string(),
            });
        }
    }

    let cohort = repo.get_by_id(cohort_id).await?.ok_or_else(|| Error::NotFound {
        resource: "cohort".to_string(),
        id: cohort_id.to_string(),
    })?;

    Ok(Json(CohortResponse::from(cohort)))
}

/// Update a cohort's name or description
#[utoipa::path(
    patch,
    path = "/cohorts/{cohort_id}",
    tag = "cohorts",
    summary = "Update cohort",
    description = "Partial update of name or description. The cadence override has its own \
                   endpoint. Requires coach or admin role.",
    params(
        ("cohort_id" = String, Path, description = "Cohort ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Updated cohort", body = CohortResponse),
        (status = 400, description = "Empty name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cohort not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn update_cohort(
    State(state): State<AppState>,
    Path(cohort_id): Path<CohortId>,
    _perm: RequiresPermission<resource::Cohorts, operation::UpdateAll>,
    Json(data): Json<CohortUpdate>,
) -> Result<Json<CohortResponse>> {
    if let Some(ref name) = data.name {
        validate_cohort_name(name)?;
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cohorts::new(&mut pool_conn);

    let cohort = repo
        .update(
            cohort_id,
            &CohortUpdateDBRequest {
                name: data.name,
                description: data.description,
            },
        )
        .await?;

    Ok(Json(CohortResponse::from(cohort)))
}

/// Delete a cohort (admin only)
#[utoipa::path(
    delete,
    path = "/cohorts/{cohort_id}",
    tag = "cohorts",
    summary = "Delete cohort",
    description = "Delete a cohort and its membership rows, history included",
    params(
        ("cohort_id" = String, Path, description = "Cohort ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Cohort deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "Cohort not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn delete_cohort(
    State(state): State<AppState>,
    Path(cohort_id): Path<CohortId>,
    _perm: RequiresPermission<resource::Cohorts, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cohorts::new(&mut pool_conn);

    let deleted = repo.delete(cohort_id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "cohort".to_string(),
            id: cohort_id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}

/// List a cohort's members
#[utoipa::path(
    get,
    path = "/cohorts/{cohort_id}/members",
    tag = "cohorts",
    summary = "List cohort members",
    description = "Roster of a cohort, active and former members alike, sorted by name. Requires \
                   coach or admin role.",
    params(
        ("cohort_id" = String, Path, description = "Cohort ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Roster entries", body = [CohortMemberResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cohort not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn list_cohort_members(
    State(state): State<AppState>,
    Path(cohort_id): Path<CohortId>,
    _perm: RequiresPermission<resource::Cohorts, operation::ReadAll>,
) -> Result<Json<Vec<CohortMemberResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cohorts::new(&mut pool_conn);

    repo.get_by_id(cohort_id).await?.ok_or_else(|| Error::NotFound {
        resource: "cohort".to_string(),
        id: cohort_id.to_string(),
    })?;

    let members = repo.list_members(cohort_id).await?;

    Ok(Json(members.into_iter().map(CohortMemberResponse::from).collect()))
}

/// Add a user to a cohort
#[utoipa::path(
    post,
    path = "/cohorts/{cohort_id}/members",
    tag = "cohorts",
    summary = "Add cohort member",
    description = "Add a user to a cohort as an active member. A user can hold only one active \
                   membership at a time; re-adding a former member reactivates their original \
                   row. Requires coach or admin role.",
    params(
        ("cohort_id" = String, Path, description = "Cohort ID (UUID)"),
    ),
    responses(
        (status = 201, description = "Membership created or reactivated", body = CohortMembershipResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cohort or user not found"),
        (status = 409, description = "User already holds an active membership"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn add_cohort_member(
    State(state): State<AppState>,
    Path(cohort_id): Path<CohortId>,
    _perm: RequiresPermission<resource::Cohorts, operation::UpdateAll>,
    Json(data): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<CohortMembershipResponse>)> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cohorts::new(&mut pool_conn);

    let membership = repo.add_member(cohort_id, data.user_id).await?;

    Ok((StatusCode::CREATED, Json(CohortMembershipResponse::from(membership))))
}

/// Remove a user from a cohort
#[utoipa::path(
    delete,
    path = "/cohorts/{cohort_id}/members/{user_id}",
    tag = "cohorts",
    summary = "Remove cohort member",
    description = "Mark a membership inactive. The roster entry is kept as history and the user \
                   becomes free to join another cohort. Requires coach or admin role.",
    params(
        ("cohort_id" = String, Path, description = "Cohort ID (UUID)"),
        ("user_id" = String, Path, description = "User ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Membership marked inactive"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No active membership for this user in this cohort"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn remove_cohort_member(
    State(state): State<AppState>,
    Path((cohort_id, user_id)): Path<(CohortId, UserId)>,
    _perm: RequiresPermission<resource::Cohorts, operation::UpdateAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Cohorts::new(&mut pool_conn);

    repo.remove_member(cohort_id, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
