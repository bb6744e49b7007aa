//! Database repository for the credit ledger.
//!
//! [`Credits::apply_delta`] is the only code path that writes
//! `users.credits`. Admin allocations, bootcamp registration fees, refunds,
//! and initial grants all construct a [`CreditDeltaDBRequest`] and go through
//! it, which keeps three facts in lockstep inside one transaction:
//!
//! 1. the running balance on the user row,
//! 2. the immutable `credit_transactions` row,
//! 3. the audit entry recording who did it.
//!
//! The balance check happens in the `UPDATE ... WHERE credits + delta >= 0`
//! itself, so two concurrent deductions cannot both pass a stale read.

use crate::db::{
    errors::{DbError, Result},
    handlers::audit::AuditLog,
    models::{
        audit::{AuditAction, AuditEntryCreateDBRequest},
        credits::{CreditDeltaDBRequest, CreditTransactionDBResponse, CreditTransactionWithActorDBResponse},
    },
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::{Connection, PgConnection};
use tracing::instrument;

/// Result of a successfully applied delta: the ledger row plus the balance
/// it left behind.
#[derive(Debug, Clone)]
pub struct AppliedDelta {
    pub transaction: CreditTransactionDBResponse,
    pub new_balance: i32,
}

pub struct Credits<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Credits<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Apply a signed credit delta to a user's balance.
    ///
    /// Errors with [`DbError::NotFound`] if the user does not exist and
    /// [`DbError::InsufficientBalance`] if the delta would take the balance
    /// below zero. Either way the ledger and balance are left untouched.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), amount = request.amount), err)]
    pub async fn apply_delta(&mut self, request: &CreditDeltaDBRequest) -> Result<AppliedDelta> {
        let mut tx = self.db.begin().await?;

        // Conditional update: the WHERE clause carries the non-negativity
        // check so the balance can never go below zero under concurrency.
        let updated = sqlx::query_scalar::<_, i32>(
            r#"
            UPDATE users
            SET credits = credits + $2
            WHERE id = $1 AND credits + $2 >= 0
            RETURNING credits
            "#,
        )
        .bind(request.user_id)
        .bind(request.amount)
        .fetch_optional(&mut *tx)
        .await?;

        let new_balance = match updated {
            Some(balance) => balance,
            None => {
                // Zero rows means either no such user or not enough credits;
                // re-read to tell the two apart.
                let available = sqlx::query_scalar::<_, i32>("SELECT credits FROM users WHERE id = $1")
                    .bind(request.user_id)
                    .fetch_optional(&mut *tx)
                    .await?
                    .ok_or(DbError::NotFound)?;

                return Err(DbError::InsufficientBalance {
                    requested: request.amount.unsigned_abs(),
                    available,
                });
            }
        };

        let transaction = sqlx::query_as::<_, CreditTransactionDBResponse>(
            r#"
            INSERT INTO credit_transactions (user_id, amount, reason, expires_at, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(request.amount)
        .bind(&request.reason)
        .bind(request.expires_at)
        .bind(request.created_by)
        .fetch_one(&mut *tx)
        .await?;

        let action = if request.amount > 0 {
            AuditAction::AllocateCredits
        } else {
            AuditAction::DeductCredits
        };
        AuditLog::new(&mut tx)
            .record(&AuditEntryCreateDBRequest {
                action,
                actor_id: request.created_by,
                target_id: Some(request.user_id),
                target_type: Some("user".to_string()),
                details: Some(serde_json::json!({
                    "amount": request.amount,
                    "reason": request.reason,
                    "balance_before": new_balance - request.amount,
                    "balance_after": new_balance,
                })),
            })
            .await?;

        tx.commit().await?;

        Ok(AppliedDelta { transaction, new_balance })
    }

    /// Current balance straight off the user row.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn balance(&mut self, user_id: UserId) -> Result<i32> {
        let balance = sqlx::query_scalar::<_, i32>("SELECT credits FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?
            .ok_or(DbError::NotFound)?;

        Ok(balance)
    }

    /// Transaction history for a user, newest-first, with the acting user's
    /// identity joined in.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn history(&mut self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<CreditTransactionWithActorDBResponse>> {
        let transactions = sqlx::query_as::<_, CreditTransactionWithActorDBResponse>(
            r#"
            SELECT ct.id, ct.user_id, ct.amount, ct.reason, ct.expires_at,
                   ct.created_by, u.name AS created_by_name, u.email AS created_by_email,
                   ct.created_at
            FROM credit_transactions ct
            JOIN users u ON u.id = ct.created_by
            WHERE ct.user_id = $1
            ORDER BY ct.created_at DESC, ct.id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(transactions)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_for_user(&mut self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credit_transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// All-time signed sum of the user's ledger rows. Routing every mutation
    /// through [`Self::apply_delta`] keeps this equal to the balance.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn total_allocated(&mut self, user_id: UserId) -> Result<i64> {
        let total: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0) FROM credit_transactions WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(total)
    }
}
