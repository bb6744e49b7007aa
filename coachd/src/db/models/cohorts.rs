//! Database models for cohorts and cohort memberships.

use crate::types::{CohortId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Membership status stored as the `membership_status` Postgres enum.
///
/// A partial unique index guarantees at most one ACTIVE membership per user,
/// so the cohort-level check-in frequency lookup never has to tie-break.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "membership_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MembershipStatus {
    Active,
    Inactive,
}

/// Database request for creating a new cohort
#[derive(Debug, Clone)]
pub struct CohortCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub check_in_frequency_days: Option<i32>,
    pub created_by: UserId,
}

/// Database request for updating a cohort
#[derive(Debug, Clone, Default)]
pub struct CohortUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Database response for a cohort
#[derive(Debug, Clone, FromRow)]
pub struct CohortDBResponse {
    pub id: CohortId,
    pub name: String,
    pub description: Option<String>,
    pub check_in_frequency_days: Option<i32>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a cohort membership row
#[derive(Debug, Clone, FromRow)]
pub struct CohortMembershipDBResponse {
    pub cohort_id: CohortId,
    pub user_id: UserId,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

/// Membership row joined with the member's identity, for roster listings
#[derive(Debug, Clone, FromRow)]
pub struct CohortMemberDBResponse {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}
