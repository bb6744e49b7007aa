//! API request/response models for check-ins.

use super::pagination::Pagination;
use crate::cadence::FrequencySource;
use crate::db::models::check_ins::CheckInDBResponse;
use crate::types::{CheckInId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request body for recording a check-in.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CheckInCreate {
    /// Record on behalf of this user (coach/admin only). Clients omit it and
    /// the check-in is recorded against themselves.
    #[schema(value_type = Option<String>, format = "uuid")]
    pub user_id: Option<UserId>,

    /// Free-form note accompanying the check-in
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckInResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CheckInId,

    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,

    pub note: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl From<CheckInDBResponse> for CheckInResponse {
    fn from(check_in: CheckInDBResponse) -> Self {
        Self {
            id: check_in.id,
            user_id: check_in.user_id,
            note: check_in.note,
            created_at: check_in.created_at,
        }
    }
}

/// Where the caller stands against their check-in cadence.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckInStatusResponse {
    /// Most recent check-in, if any
    pub last_check_in_at: Option<DateTime<Utc>>,

    /// Effective cadence in days
    pub frequency_days: i32,

    /// Which layer supplied the cadence
    pub source: FrequencySource,

    /// When the next check-in is expected; `null` means the user has never
    /// checked in and one is due immediately
    pub next_due_at: Option<DateTime<Utc>>,

    pub overdue: bool,
}

/// Query parameters for listing a user's check-ins
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListCheckInsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}
