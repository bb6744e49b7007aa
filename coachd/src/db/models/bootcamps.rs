//! Database models for bootcamps and registrations.

use crate::types::{BootcampId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a bootcamp
#[derive(Debug, Clone)]
pub struct BootcampCreateDBRequest {
    pub name: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub created_by: UserId,
}

/// Database request for updating a bootcamp
#[derive(Debug, Clone, Default)]
pub struct BootcampUpdateDBRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
}

/// Database response for a bootcamp
#[derive(Debug, Clone, FromRow)]
pub struct BootcampDBResponse {
    pub id: BootcampId,
    pub name: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database response for a registration row
#[derive(Debug, Clone, FromRow)]
pub struct BootcampRegistrationDBResponse {
    pub bootcamp_id: BootcampId,
    pub user_id: UserId,
    pub registered_at: DateTime<Utc>,
}

/// Registration row joined with the member's identity, for roster listings
#[derive(Debug, Clone, FromRow)]
pub struct BootcampRegistrantDBResponse {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub registered_at: DateTime<Utc>,
}
