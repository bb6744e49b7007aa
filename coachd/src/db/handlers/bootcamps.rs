//! Database repository for bootcamps and registrations.
//!
//! Registration costs one credit and unregistration refunds it; both run the
//! fee through [`Credits::apply_delta`] in the same transaction as the
//! registration row, so a failed fee leaves no registration behind and every
//! registration has its ledger row and audit entry.

use crate::db::{
    errors::{DbError, Result},
    handlers::{credits::Credits, repository::Repository},
    models::{
        bootcamps::{
            BootcampCreateDBRequest, BootcampDBResponse, BootcampRegistrantDBResponse, BootcampRegistrationDBResponse,
            BootcampUpdateDBRequest,
        },
        credits::CreditDeltaDBRequest,
    },
};
use crate::types::{BootcampId, UserId, abbrev_uuid};
use sqlx::{Connection, PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing bootcamps
#[derive(Debug, Clone)]
pub struct BootcampFilter {
    pub skip: i64,
    pub limit: i64,
}

impl BootcampFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Bootcamps<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Bootcamps<'c> {
    type CreateRequest = BootcampCreateDBRequest;
    type UpdateRequest = BootcampUpdateDBRequest;
    type Response = BootcampDBResponse;
    type Id = BootcampId;
    type Filter = BootcampFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let bootcamp = sqlx::query_as::<_, BootcampDBResponse>(
            r#"
            INSERT INTO bootcamps (name, description, starts_at, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.starts_at)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(bootcamp)
    }

    #[instrument(skip(self), fields(bootcamp_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let bootcamp = sqlx::query_as::<_, BootcampDBResponse>("SELECT * FROM bootcamps WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(bootcamp)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM bootcamps ORDER BY starts_at, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let bootcamps = query.build_query_as::<BootcampDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(bootcamps)
    }

    #[instrument(skip(self), fields(bootcamp_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        // Registrations go with the bootcamp (ON DELETE CASCADE); credits
        // already spent are not refunded here
        let result = sqlx::query("DELETE FROM bootcamps WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(bootcamp_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let bootcamp = sqlx::query_as::<_, BootcampDBResponse>(
            r#"
            UPDATE bootcamps SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                starts_at = COALESCE($4, starts_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.starts_at)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(bootcamp)
    }
}

impl<'c> Bootcamps<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn count(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bootcamps").fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    /// Register a user, consuming one credit through the ledger primitive.
    ///
    /// Atomic: if the fee is rejected (insufficient balance), the
    /// registration row is rolled back with it. A duplicate registration
    /// surfaces as a unique violation before any credits move.
    #[instrument(skip(self), fields(bootcamp_id = %abbrev_uuid(&bootcamp_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn register(
        &mut self,
        bootcamp_id: BootcampId,
        user_id: UserId,
        bootcamp_name: &str,
    ) -> Result<(BootcampRegistrationDBResponse, i32)> {
        let mut tx = self.db.begin().await?;

        let registration = match sqlx::query_as::<_, BootcampRegistrationDBResponse>(
            r#"
            INSERT INTO bootcamp_registrations (bootcamp_id, user_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(bootcamp_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        {
            Ok(registration) => registration,
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                // Foreign key violation means either user or bootcamp doesn't exist
                return Err(DbError::NotFound);
            }
            Err(e) => return Err(DbError::from(e)),
        };

        let applied = Credits::new(&mut tx)
            .apply_delta(&CreditDeltaDBRequest::bootcamp_registration(user_id, bootcamp_name))
            .await?;

        tx.commit().await?;

        Ok((registration, applied.new_balance))
    }

    /// Drop a registration and refund the credit through the ledger
    /// primitive. The caller is responsible for the before-start-time rule.
    #[instrument(skip(self), fields(bootcamp_id = %abbrev_uuid(&bootcamp_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn unregister(&mut self, bootcamp_id: BootcampId, user_id: UserId, bootcamp_name: &str) -> Result<i32> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query("DELETE FROM bootcamp_registrations WHERE bootcamp_id = $1 AND user_id = $2")
            .bind(bootcamp_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }

        let applied = Credits::new(&mut tx)
            .apply_delta(&CreditDeltaDBRequest::bootcamp_refund(user_id, bootcamp_name))
            .await?;

        tx.commit().await?;

        Ok(applied.new_balance)
    }

    #[instrument(skip(self), fields(bootcamp_id = %abbrev_uuid(&bootcamp_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_registration(
        &mut self,
        bootcamp_id: BootcampId,
        user_id: UserId,
    ) -> Result<Option<BootcampRegistrationDBResponse>> {
        let registration = sqlx::query_as::<_, BootcampRegistrationDBResponse>(
            "SELECT * FROM bootcamp_registrations WHERE bootcamp_id = $1 AND user_id = $2",
        )
        .bind(bootcamp_id)
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(registration)
    }

    #[instrument(skip(self), fields(bootcamp_id = %abbrev_uuid(&bootcamp_id)), err)]
    pub async fn list_registrants(&mut self, bootcamp_id: BootcampId) -> Result<Vec<BootcampRegistrantDBResponse>> {
        let registrants = sqlx::query_as::<_, BootcampRegistrantDBResponse>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, br.registered_at
            FROM bootcamp_registrations br
            JOIN users u ON u.id = br.user_id
            WHERE br.bootcamp_id = $1
            ORDER BY br.registered_at, u.id
            "#,
        )
        .bind(bootcamp_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(registrants)
    }
}
