use crate::{
    AppState,
    api::models::settings::{SettingResponse, SettingUpdate},
    auth::permissions::{RequiresPermission, operation, resource},
    db::{handlers::Settings, models::settings::SettingUpsertDBRequest},
    errors::{Error, Result},
    settings::DEFAULT_CHECK_IN_FREQUENCY_KEY,
};
use axum::{
    extract::{Path, State},
    response::Json,
};

use super::cadence::validate_frequency_days;

/// Reject values the typed snapshot would silently throw away.
///
/// Unknown keys are stored verbatim; known keys must hold a value the
/// reader can actually use.
fn validate_setting_value(key: &str, value: &str) -> Result<()> {
    if key == DEFAULT_CHECK_IN_FREQUENCY_KEY {
        let days = value.trim().parse::<i32>().map_err(|_| Error::BadRequest {
            message: format!("{DEFAULT_CHECK_IN_FREQUENCY_KEY} must be an integer number of days"),
        })?;
        validate_frequency_days(Some(days))?;
    }
    Ok(())
}

/// List system settings
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    summary = "List settings",
    description = "All system settings ordered by key. Requires admin role.",
    responses(
        (status = 200, description = "Settings", body = [SettingResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn list_settings(
    State(state): State<AppState>,
    _perm: RequiresPermission<resource::Settings, operation::ReadAll>,
) -> Result<Json<Vec<SettingResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Settings::new(&mut pool_conn);

    let settings = repo.list().await?;

    Ok(Json(settings.into_iter().map(SettingResponse::from).collect()))
}

/// Create or update a system setting
#[utoipa::path(
    put,
    path = "/settings/{key}",
    tag = "settings",
    summary = "Upsert setting",
    description = "Set a system setting, recording the old and new values in the audit log. \
                   Later reads observe the new value immediately. Requires admin role.",
    params(
        ("key" = String, Path, description = "Setting key"),
    ),
    responses(
        (status = 200, description = "The stored setting", body = SettingResponse),
        (status = 400, description = "Value unusable for this key"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn update_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    current_user: RequiresPermission<resource::Settings, operation::UpdateAll>,
    Json(data): Json<SettingUpdate>,
) -> Result<Json<SettingResponse>> {
    validate_setting_value(&key, &data.value)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let setting = Settings::new(&mut pool_conn)
        .upsert(&SettingUpsertDBRequest {
            key,
            value: data.value,
            updated_by: current_user.id,
        })
        .await?;

    // The snapshot cache would otherwise serve the old value until its TTL
    state.settings_cache.invalidate();

    Ok(Json(SettingResponse::from(setting)))
}
