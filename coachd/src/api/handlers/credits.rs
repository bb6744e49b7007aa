use crate::{
    AppState,
    api::models::{
        credits::{CreditAllocation, CreditAllocationResponse, CreditTransactionResponse, CreditTransactionWithActorResponse, CreditsSummaryResponse},
        pagination::Pagination,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    db::{
        handlers::Credits,
        models::credits::{CreditDeltaDBRequest, MAX_REASON_LEN},
    },
    errors::{Error, Result},
    types::UserId,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

/// Number of transactions included in the credits summary
const SUMMARY_RECENT_LIMIT: i64 = 5;

/// Allocate or deduct credits for a user (admin only)
#[utoipa::path(
    post,
    path = "/users/{user_id}/credits",
    tag = "credits",
    summary = "Allocate or deduct credits",
    description = "Apply a signed credit delta to a user's balance. Positive amounts grant credits, \
                   negative amounts deduct them; zero is rejected. Deductions that would take the \
                   balance below zero are rejected and nothing is written. Every applied delta \
                   becomes an immutable ledger row plus an audit entry.",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
    ),
    responses(
        (status = 201, description = "Delta applied", body = CreditAllocationResponse),
        (status = 400, description = "Zero amount, empty or oversized reason, or insufficient balance"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn allocate_credits(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    current_user: RequiresPermission<resource::Credits, operation::CreateAll>,
    Json(data): Json<CreditAllocation>,
) -> Result<(StatusCode, Json<CreditAllocationResponse>)> {
    if data.amount == 0 {
        return Err(Error::BadRequest {
            message: "Amount must be non-zero: positive to allocate, negative to deduct".to_string(),
        });
    }
    if data.reason.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Reason must not be empty".to_string(),
        });
    }
    if data.reason.chars().count() > MAX_REASON_LEN {
        return Err(Error::BadRequest {
            message: format!("Reason must be at most {MAX_REASON_LEN} characters"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // Balance update, ledger row, and audit entry commit atomically inside
    // the repository
    let delta = CreditDeltaDBRequest::allocation(user_id, current_user.id, data.amount, data.reason, data.expires_at);
    let applied = Credits::new(&mut pool_conn).apply_delta(&delta).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreditAllocationResponse {
            transaction: CreditTransactionResponse::from(applied.transaction),
            new_balance: applied.new_balance,
        }),
    ))
}

/// Get a user's credit transaction history (admin only)
#[utoipa::path(
    get,
    path = "/users/{user_id}/credits/history",
    tag = "credits",
    summary = "Get credit history",
    description = "Transaction history for a user, newest first, with the acting user's identity on each row",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
        Pagination,
    ),
    responses(
        (status = 200, description = "Transaction history", body = [CreditTransactionWithActorResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_credits_history(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(pagination): Query<Pagination>,
    _perm: RequiresPermission<resource::Credits, operation::ReadAll>,
) -> Result<Json<Vec<CreditTransactionWithActorResponse>>> {
    let (skip, limit) = pagination.params();

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Credits::new(&mut pool_conn);

    // 404 for unknown users rather than an empty history
    repo.balance(user_id).await?;
    let transactions = repo.history(user_id, skip, limit).await?;

    Ok(Json(transactions.into_iter().map(CreditTransactionWithActorResponse::from).collect()))
}

/// Get a summary of a user's credit position (admin only)
#[utoipa::path(
    get,
    path = "/users/{user_id}/credits/summary",
    tag = "credits",
    summary = "Get credits summary",
    description = "Current balance, all-time allocation total, and the 5 most recent transactions",
    params(
        ("user_id" = String, Path, description = "User ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Credits summary", body = CreditsSummaryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - requires admin role"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("proxy_header" = [])
    )
)]
pub async fn get_credits_summary(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    _perm: RequiresPermission<resource::Credits, operation::ReadAll>,
) -> Result<Json<CreditsSummaryResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Credits::new(&mut pool_conn);

    let balance = repo.balance(user_id).await?;
    let total_allocated = repo.total_allocated(user_id).await?;
    let recent = repo.history(user_id, 0, SUMMARY_RECENT_LIMIT).await?;

    Ok(Json(CreditsSummaryResponse {
        balance,
        total_allocated,
        recent_transactions: recent.into_iter().map(CreditTransactionWithActorResponse::from).collect(),
    }))
}
