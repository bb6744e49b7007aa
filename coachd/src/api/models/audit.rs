//! API response models for the audit log.

use super::pagination::Pagination;
use crate::db::models::audit::{AuditAction, AuditEntryDBResponse};
use crate::types::{AuditEntryId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuditEntryResponse {
    pub id: AuditEntryId,

    pub action: AuditAction,

    #[schema(value_type = String, format = "uuid")]
    pub actor_id: UserId,

    #[schema(value_type = Option<String>, format = "uuid")]
    pub target_id: Option<Uuid>,

    /// What kind of entity `target_id` refers to, e.g. `user` or `setting`
    pub target_type: Option<String>,

    /// Action-specific payload, e.g. amounts and balances for credit changes
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
}

impl From<AuditEntryDBResponse> for AuditEntryResponse {
    fn from(entry: AuditEntryDBResponse) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            actor_id: entry.actor_id,
            target_id: entry.target_id,
            target_type: entry.target_type,
            details: entry.details,
            created_at: entry.created_at,
        }
    }
}

/// Query parameters for listing audit entries
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListAuditLogQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return entries with this action
    pub action: Option<AuditAction>,
}
