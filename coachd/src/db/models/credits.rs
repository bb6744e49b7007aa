//! Database models for the credit ledger.
//!
//! Ledger rows are immutable once written. The signed `amount` is the whole
//! story: positive rows are grants, negative rows are deductions, and
//! `users.credits` is maintained as the running sum inside the same
//! transaction that inserts the row.

use crate::types::{SYSTEM_USER_ID, TransactionId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Longest reason the ledger accepts; the column carries a matching CHECK.
pub const MAX_REASON_LEN: usize = 200;

/// Database request for applying a signed credit delta
#[derive(Debug, Clone)]
pub struct CreditDeltaDBRequest {
    pub user_id: UserId,
    /// Signed amount: positive = grant, negative = deduct. Never zero.
    pub amount: i32,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: UserId,
}

impl CreditDeltaDBRequest {
    /// Admin-initiated allocation or deduction
    pub fn allocation(user_id: UserId, created_by: UserId, amount: i32, reason: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            user_id,
            amount,
            reason: truncate_reason(reason),
            expires_at,
            created_by,
        }
    }

    /// One credit consumed by registering for a bootcamp; the actor is the member themselves
    pub fn bootcamp_registration(user_id: UserId, bootcamp_name: &str) -> Self {
        Self {
            user_id,
            amount: -1,
            reason: truncate_reason(format!("Bootcamp registration: {bootcamp_name}")),
            expires_at: None,
            created_by: user_id,
        }
    }

    /// One credit refunded by unregistering before the bootcamp starts
    pub fn bootcamp_refund(user_id: UserId, bootcamp_name: &str) -> Self {
        Self {
            user_id,
            amount: 1,
            reason: truncate_reason(format!("Bootcamp registration refund: {bootcamp_name}")),
            expires_at: None,
            created_by: user_id,
        }
    }

    /// Starting balance granted when a client account is created
    pub fn initial_grant(user_id: UserId, amount: i32) -> Self {
        Self {
            user_id,
            amount,
            reason: "Initial credits".to_string(),
            expires_at: None,
            created_by: SYSTEM_USER_ID,
        }
    }
}

/// The reason column caps at [`MAX_REASON_LEN`] chars; generated reasons
/// embed user-supplied names, so cut instead of failing the transaction.
fn truncate_reason(reason: String) -> String {
    if reason.chars().count() <= MAX_REASON_LEN {
        reason
    } else {
        reason.chars().take(MAX_REASON_LEN).collect()
    }
}

/// Database response for a credit transaction
#[derive(Debug, Clone, FromRow)]
pub struct CreditTransactionDBResponse {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: i32,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

/// Ledger row joined with the acting user's identity, for history listings
#[derive(Debug, Clone, FromRow)]
pub struct CreditTransactionWithActorDBResponse {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: i32,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: UserId,
    pub created_by_name: String,
    pub created_by_email: String,
    pub created_at: DateTime<Utc>,
}
