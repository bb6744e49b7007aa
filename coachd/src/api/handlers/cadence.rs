use crate::{
    AppState,
    api::models::{
        cadence::{CheckInFrequencyConfigResponse, EffectiveFrequencyResponse, UpdateCheckInFrequencyRequest},
        cohorts::CohortResponse,
        users::CurrentUser,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    cadence::{self, FrequencySource, MAX_FREQUENCY_DAYS, MIN_FREQUENCY_DAYS, MISSING_USER_FREQUENCY_DAYS},
    db::handlers::{Cohorts, Users},
    errors::{Error, Result},
    types::{CohortId, UserId},
};
use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::warn;

pub(super) fn validate_frequency_days(days: Option<i32>) -> Result<()> {
    if let Some(days) = days {
        if !(MIN_FREQUENCY_DAYS..=MAX_FREQUENCY_DAYS).contains(&days) {
            return Err(Error::BadRequest {
                message: format!("frequency_days must be between {MIN_FREQUENCY_DAYS} and {MAX_FREQUENCY_DAYS}"),
            });
        }
    }
    Ok(())
}

/// Get every cadence layer for a user
#[utoipa::path(
    get,
    path = "/users/{user_id}/check-in-frequency",
    tag = "cadence",
    summary = "Get check-in frequency config",
    description = "All cadence layers for a user: personal override, active cohort override, \
                   system default, and the resolved effective value. Requires coach or admin role.",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Cadence layers and effective frequency", body = CheckInFrequencyConfigResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_check_in_frequency_config(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    _perm: RequiresPermission<resource::CheckIns, operation::ReadAll>,
) -> Result<Json<CheckInFrequencyConfigResponse>> {
    let snapshot = state.settings_cache.snapshot().await?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let config = cadence::frequency_config(&mut pool_conn, &snapshot, user_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "user".to_string(),
            id: user_id.to_string(),
        })?;

    Ok(Json(CheckInFrequencyConfigResponse::from(config)))
}

/// Set or clear a user's personal check-in frequency override
#[utoipa::path(
    put,
    path = "/users/{user_id}/check-in-frequency",
    tag = "cadence",
    summary = "Set user frequency override",
    description = "Set a personal check-in frequency override ([1, 90] days) or clear it with \
                   `null` so the cohort or system value applies again. Requires coach or admin role.",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Cadence layers after the update", body = CheckInFrequencyConfigResponse),
        (status = 400, description = "frequency_days out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn update_user_check_in_frequency(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    _perm: RequiresPermission<resource::CheckIns, operation::UpdateAll>,
    Json(data): Json<UpdateCheckInFrequencyRequest>,
) -> Result<Json<CheckInFrequencyConfigResponse>> {
    validate_frequency_days(data.frequency_days)?;

    let snapshot = state.settings_cache.snapshot().await?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    Users::new(&mut pool_conn).set_check_in_frequency(user_id, data.frequency_days).await?;

    let config = cadence::frequency_config(&mut pool_conn, &snapshot, user_id)
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "user".to_string(),
            id: user_id.to_string(),
        })?;

    Ok(Json(CheckInFrequencyConfigResponse::from(config)))
}

/// Set or clear a cohort's check-in frequency override
#[utoipa::path(
    put,
    path = "/cohorts/{cohort_id}/check-in-frequency",
    tag = "cadence",
    summary = "Set cohort frequency override",
    description = "Set the cohort-level check-in frequency override ([1, 90] days) or clear it \
                   with `null`. Applies to every member without a personal override. Requires \
                   coach or admin role.",
    params(
        ("cohort_id" = String, Path, description = "Cohort ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Updated cohort", body = CohortResponse),
        (status = 400, description = "frequency_days out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Cohort not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn update_cohort_check_in_frequency(
    State(state): State<AppState>,
    Path(cohort_id): Path<CohortId>,
    _perm: RequiresPermission<resource::Cohorts, operation::UpdateAll>,
    Json(data): Json<UpdateCheckInFrequencyRequest>,
) -> Result<Json<CohortResponse>> {
    validate_frequency_days(data.frequency_days)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let cohort = Cohorts::new(&mut pool_conn).set_check_in_frequency(cohort_id, data.frequency_days).await?;

    Ok(Json(CohortResponse::from(cohort)))
}

/// Get the effective check-in frequency for the current user
#[utoipa::path(
    get,
    path = "/users/current/check-in-frequency",
    tag = "cadence",
    summary = "Get my effective frequency",
    description = "The check-in frequency that currently applies to the authenticated user, \
                   and which layer it comes from",
    responses(
        (status = 200, description = "Effective frequency", body = EffectiveFrequencyResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_my_check_in_frequency(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<EffectiveFrequencyResponse>> {
    let snapshot = state.settings_cache.snapshot().await?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let resolved = cadence::resolve(&mut pool_conn, &snapshot, current_user.id).await?;

    // The row can vanish between authentication and resolution. Fail towards
    // checking in sooner rather than erroring the member-facing endpoint.
    let response = match resolved {
        Some(resolved) => EffectiveFrequencyResponse::from(resolved),
        None => {
            warn!(user_id = %current_user.id, "Authenticated user disappeared during cadence resolution");
            EffectiveFrequencyResponse {
                frequency_days: MISSING_USER_FREQUENCY_DAYS,
                source: FrequencySource::System,
            }
        }
    };

    Ok(Json(response))
}
