//! API request/response models for cohorts and memberships.

use super::pagination::Pagination;
use crate::db::models::cohorts::{CohortDBResponse, CohortMemberDBResponse, CohortMembershipDBResponse, MembershipStatus};
use crate::types::{CohortId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CohortCreate {
    pub name: String,
    pub description: Option<String>,
    /// Cohort-level check-in frequency override ([1, 90] days)
    pub check_in_frequency_days: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CohortUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddMemberRequest {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
}

/// Query parameters for listing cohorts
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListCohortsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Search query to filter cohorts by name or description (case-insensitive substring match)
    pub search: Option<String>,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CohortResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CohortId,
    pub name: String,
    pub description: Option<String>,
    pub check_in_frequency_days: Option<i32>,
    #[schema(value_type = String, format = "uuid")]
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CohortDBResponse> for CohortResponse {
    fn from(db: CohortDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            description: db.description,
            check_in_frequency_days: db.check_in_frequency_days,
            created_by: db.created_by,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CohortMembershipResponse {
    #[schema(value_type = String, format = "uuid")]
    pub cohort_id: CohortId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<CohortMembershipDBResponse> for CohortMembershipResponse {
    fn from(db: CohortMembershipDBResponse) -> Self {
        Self {
            cohort_id: db.cohort_id,
            user_id: db.user_id,
            status: db.status,
            joined_at: db.joined_at,
        }
    }
}

/// Roster entry: membership joined with the member's identity
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CohortMemberResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<CohortMemberDBResponse> for CohortMemberResponse {
    fn from(db: CohortMemberDBResponse) -> Self {
        Self {
            user_id: db.user_id,
            name: db.name,
            email: db.email,
            status: db.status,
            joined_at: db.joined_at,
        }
    }
}
