//! Database models for check-ins.

use crate::types::{CheckInId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for recording a check-in
#[derive(Debug, Clone)]
pub struct CheckInCreateDBRequest {
    pub user_id: UserId,
    pub note: Option<String>,
}

/// Database response for a check-in
#[derive(Debug, Clone, FromRow)]
pub struct CheckInDBResponse {
    pub id: CheckInId,
    pub user_id: UserId,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}
