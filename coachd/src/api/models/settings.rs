//! API request/response models for system settings.

use crate::db::models::settings::SettingDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for upserting a setting value.
///
/// Values are stored verbatim and parsed on read, so a value the typed
/// snapshot cannot use degrades to the compiled-in default instead of
/// breaking reads.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingUpdate {
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingResponse {
    pub key: String,

    pub value: String,

    pub updated_at: DateTime<Utc>,

    /// Last writer; `null` when that account has since been deleted
    #[schema(value_type = Option<String>, format = "uuid")]
    pub updated_by: Option<UserId>,
}

impl From<SettingDBResponse> for SettingResponse {
    fn from(setting: SettingDBResponse) -> Self {
        Self {
            key: setting.key,
            value: setting.value,
            updated_at: setting.updated_at,
            updated_by: setting.updated_by,
        }
    }
}
