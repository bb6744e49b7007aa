//! Database repository for the audit log.
//!
//! The audit log is append-only. Entries are written inside the same
//! transaction as the mutation they record (credit deltas, settings writes),
//! so a committed mutation always has its audit row and a rolled-back one
//! never does.

use crate::db::{
    errors::Result,
    models::audit::{AuditAction, AuditEntryCreateDBRequest, AuditEntryDBResponse},
};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing audit entries
#[derive(Debug, Clone)]
pub struct AuditEntryFilter {
    pub skip: i64,
    pub limit: i64,
    pub action: Option<AuditAction>,
}

impl AuditEntryFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, action: None }
    }

    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }
}

pub struct AuditLog<'c> {
    db: &'c mut PgConnection,
}

impl<'c> AuditLog<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(action = ?request.action), err)]
    pub async fn record(&mut self, request: &AuditEntryCreateDBRequest) -> Result<AuditEntryDBResponse> {
        let entry = sqlx::query_as::<_, AuditEntryDBResponse>(
            r#"
            INSERT INTO audit_log (action, actor_id, target_id, target_type, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.action)
        .bind(request.actor_id)
        .bind(request.target_id)
        .bind(&request.target_type)
        .bind(&request.details)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry)
    }

    /// List entries newest-first, optionally restricted to one action.
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list(&mut self, filter: &AuditEntryFilter) -> Result<Vec<AuditEntryDBResponse>> {
        let mut query = QueryBuilder::new("SELECT * FROM audit_log");

        if let Some(action) = filter.action {
            query.push(" WHERE action = ");
            query.push_bind(action);
        }

        query.push(" ORDER BY created_at DESC, id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let entries = query.build_query_as::<AuditEntryDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(entries)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &AuditEntryFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM audit_log");

        if let Some(action) = filter.action {
            query.push(" WHERE action = ");
            query.push_bind(action);
        }

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }
}
