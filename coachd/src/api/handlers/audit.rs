use crate::{
    AppState,
    api::models::{
        audit::{AuditEntryResponse, ListAuditLogQuery},
        pagination::PaginatedResponse,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::handlers::{AuditLog, audit::AuditEntryFilter},
    errors::{Error, Result},
};
use axum::{
    extract::{Query, State},
    response::Json,
};

/// List audit log entries
#[utoipa::path(
    get,
    path = "/audit-log",
    tag = "audit",
    summary = "List audit log",
    description = "Audit entries newest first, optionally filtered by action. Requires admin role.",
    params(
        ListAuditLogQuery,
    ),
    responses(
        (status = 200, description = "Page of audit entries", body = PaginatedResponse<AuditEntryResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn list_audit_log(
    State(state): State<AppState>,
    Query(query): Query<ListAuditLogQuery>,
    _perm: RequiresPermission<resource::AuditLog, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<AuditEntryResponse>>> {
    let (skip, limit) = query.pagination.params();

    let mut filter = AuditEntryFilter::new(skip, limit);
    if let Some(action) = query.action {
        filter = filter.with_action(action);
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = AuditLog::new(&mut pool_conn);

    let total_count = repo.count(&filter).await?;
    let entries = repo.list(&filter).await?;

    Ok(Json(PaginatedResponse {
        data: entries.into_iter().map(AuditEntryResponse::from).collect(),
        total_count,
        skip,
        limit,
    }))
}
