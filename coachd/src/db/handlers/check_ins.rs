//! Database repository for check-ins.
//!
//! Check-in history is append-only; the due-date computation only ever needs
//! the most recent row per user.

use crate::db::{
    errors::{DbError, Result},
    models::check_ins::{CheckInCreateDBRequest, CheckInDBResponse},
};
use crate::types::{UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct CheckIns<'c> {
    db: &'c mut PgConnection,
}

impl<'c> CheckIns<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &CheckInCreateDBRequest) -> Result<CheckInDBResponse> {
        match sqlx::query_as::<_, CheckInDBResponse>(
            r#"
            INSERT INTO check_ins (user_id, note)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(request.user_id)
        .bind(&request.note)
        .fetch_one(&mut *self.db)
        .await
        {
            Ok(check_in) => Ok(check_in),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                // Foreign key violation means the user doesn't exist
                Err(DbError::NotFound)
            }
            Err(e) => Err(DbError::from(e)),
        }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_for_user(&mut self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<CheckInDBResponse>> {
        let check_ins = sqlx::query_as::<_, CheckInDBResponse>(
            r#"
            SELECT * FROM check_ins
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            OFFSET $2
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(check_ins)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn count_for_user(&mut self, user_id: UserId) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM check_ins WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// The user's most recent check-in, if they have ever checked in.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn last_for_user(&mut self, user_id: UserId) -> Result<Option<CheckInDBResponse>> {
        let check_in = sqlx::query_as::<_, CheckInDBResponse>(
            r#"
            SELECT * FROM check_ins
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(check_in)
    }
}
