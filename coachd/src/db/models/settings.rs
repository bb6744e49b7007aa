//! Database models for system settings rows.
//!
//! Values are stored opaquely as text and parsed into the typed
//! [`crate::settings::SettingsSnapshot`] at read time, so a bad write
//! degrades to the built-in default instead of breaking reads.

use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for upserting a setting
#[derive(Debug, Clone)]
pub struct SettingUpsertDBRequest {
    pub key: String,
    pub value: String,
    pub updated_by: UserId,
}

/// Database response for a setting row
#[derive(Debug, Clone, FromRow)]
pub struct SettingDBResponse {
    pub key: String,
    pub value: String,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
}
