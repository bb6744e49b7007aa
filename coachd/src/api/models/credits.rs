//! API request/response models for the credit ledger.

use crate::db::models::credits::{CreditTransactionDBResponse, CreditTransactionWithActorDBResponse};
use crate::types::{TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditAllocation {
    /// Signed amount: positive grants credits, negative deducts them. Never zero.
    pub amount: i32,
    /// Why the credits move (shown in history, max 200 chars)
    pub reason: String,
    /// Optional expiry date, stored for display but not enforced
    pub expires_at: Option<DateTime<Utc>>,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditTransactionResponse {
    pub id: TransactionId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub amount: i32,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "uuid")]
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl From<CreditTransactionDBResponse> for CreditTransactionResponse {
    fn from(db: CreditTransactionDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            amount: db.amount,
            reason: db.reason,
            expires_at: db.expires_at,
            created_by: db.created_by,
            created_at: db.created_at,
        }
    }
}

/// Ledger row with the acting user's identity, as shown in history listings
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditTransactionWithActorResponse {
    pub id: TransactionId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub amount: i32,
    pub reason: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[schema(value_type = String, format = "uuid")]
    pub created_by: UserId,
    pub created_by_name: String,
    pub created_by_email: String,
    pub created_at: DateTime<Utc>,
}

impl From<CreditTransactionWithActorDBResponse> for CreditTransactionWithActorResponse {
    fn from(db: CreditTransactionWithActorDBResponse) -> Self {
        Self {
            id: db.id,
            user_id: db.user_id,
            amount: db.amount,
            reason: db.reason,
            expires_at: db.expires_at,
            created_by: db.created_by,
            created_by_name: db.created_by_name,
            created_by_email: db.created_by_email,
            created_at: db.created_at,
        }
    }
}

/// Returned by an allocation: the ledger row plus the balance it produced
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditAllocationResponse {
    pub transaction: CreditTransactionResponse,
    pub new_balance: i32,
}

/// Admin summary of a user's credit position
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreditsSummaryResponse {
    /// Current balance from the user row
    pub balance: i32,
    /// All-time signed sum of ledger amounts; reconciles with `balance`
    pub total_allocated: i64,
    /// The 5 most recent transactions, newest first
    pub recent_transactions: Vec<CreditTransactionWithActorResponse>,
}
