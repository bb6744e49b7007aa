//! Database models for the audit log.

use crate::types::{AuditEntryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Audit action tag stored as TEXT in database
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    AllocateCredits,
    DeductCredits,
    UpdateSetting,
}

/// Database request for recording an audit entry
#[derive(Debug, Clone)]
pub struct AuditEntryCreateDBRequest {
    pub action: AuditAction,
    pub actor_id: UserId,
    pub target_id: Option<Uuid>,
    pub target_type: Option<String>,
    pub details: Option<serde_json::Value>,
}

/// Database response for an audit entry
#[derive(Debug, Clone, FromRow)]
pub struct AuditEntryDBResponse {
    pub id: AuditEntryId,
    pub action: AuditAction,
    pub actor_id: UserId,
    pub target_id: Option<Uuid>,
    pub target_type: Option<String>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
