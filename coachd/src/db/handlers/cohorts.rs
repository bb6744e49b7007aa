//! Database repository for cohorts and memberships.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::cohorts::{
        CohortCreateDBRequest, CohortDBResponse, CohortMemberDBResponse, CohortMembershipDBResponse, CohortUpdateDBRequest,
    },
};
use crate::types::{CohortId, UserId, abbrev_uuid};
use sqlx::{PgConnection, QueryBuilder};
use tracing::instrument;

/// Filter for listing cohorts
#[derive(Debug, Clone)]
pub struct CohortFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>, // Case-insensitive substring search on name and description
}

impl CohortFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit, search: None }
    }

    pub fn with_search(mut self, search: String) -> Self {
        self.search = Some(search);
        self
    }
}

pub struct Cohorts<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Cohorts<'c> {
    type CreateRequest = CohortCreateDBRequest;
    type UpdateRequest = CohortUpdateDBRequest;
    type Response = CohortDBResponse;
    type Id = CohortId;
    type Filter = CohortFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let cohort = sqlx::query_as::<_, CohortDBResponse>(
            r#"
            INSERT INTO cohorts (name, description, check_in_frequency_days, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.check_in_frequency_days)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(cohort)
    }

    #[instrument(skip(self), fields(cohort_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let cohort = sqlx::query_as::<_, CohortDBResponse>("SELECT * FROM cohorts WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(cohort)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM cohorts");

        if let Some(ref search) = filter.search {
            let search_pattern = format!("%{}%", search.to_lowercase());
            query.push(" WHERE (LOWER(name) LIKE ");
            query.push_bind(search_pattern.clone());
            query.push(" OR LOWER(COALESCE(description, '')) LIKE ");
            query.push_bind(search_pattern);
            query.push(")");
        }

        query.push(" ORDER BY name, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let cohorts = query.build_query_as::<CohortDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(cohorts)
    }

    #[instrument(skip(self), fields(cohort_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        // Memberships go with the cohort (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM cohorts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(cohort_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Atomic update with conditional field updates
        let cohort = sqlx::query_as::<_, CohortDBResponse>(
            r#"
            UPDATE cohorts SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(cohort)
    }
}

impl<'c> Cohorts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &CohortFilter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM cohorts");

        if let Some(ref search) = filter.search {
            let search_pattern = format!("%{}%", search.to_lowercase());
            query.push(" WHERE (LOWER(name) LIKE ");
            query.push_bind(search_pattern.clone());
            query.push(" OR LOWER(COALESCE(description, '')) LIKE ");
            query.push_bind(search_pattern);
            query.push(")");
        }

        let count: i64 = query.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok(count)
    }

    /// Add a user to a cohort as an ACTIVE member.
    ///
    /// Re-adding a previously removed (INACTIVE) member reactivates the
    /// existing row, keeping the original `joined_at`. A second ACTIVE
    /// membership anywhere trips the `one_active_membership_per_user` index
    /// and surfaces as a unique violation.
    #[instrument(skip(self), fields(cohort_id = %abbrev_uuid(&cohort_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn add_member(&mut self, cohort_id: CohortId, user_id: UserId) -> Result<CohortMembershipDBResponse> {
        match sqlx::query_as::<_, CohortMembershipDBResponse>(
            r#"
            INSERT INTO cohort_memberships (cohort_id, user_id, status)
            VALUES ($1, $2, 'ACTIVE')
            ON CONFLICT (cohort_id, user_id) DO UPDATE SET status = 'ACTIVE'
            RETURNING *
            "#,
        )
        .bind(cohort_id)
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await
        {
            Ok(membership) => Ok(membership),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                // Foreign key violation means either user or cohort doesn't exist
                Err(DbError::NotFound)
            }
            Err(e) => Err(DbError::from(e)),
        }
    }

    /// Mark a membership INACTIVE. The row stays so roster history survives.
    #[instrument(skip(self), fields(cohort_id = %abbrev_uuid(&cohort_id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn remove_member(&mut self, cohort_id: CohortId, user_id: UserId) -> Result<()> {
        let result = sqlx::query(
            "UPDATE cohort_memberships SET status = 'INACTIVE' WHERE cohort_id = $1 AND user_id = $2 AND status = 'ACTIVE'",
        )
        .bind(cohort_id)
        .bind(user_id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() > 0 {
            Ok(())
        } else {
            Err(DbError::NotFound)
        }
    }

    #[instrument(skip(self), fields(cohort_id = %abbrev_uuid(&cohort_id)), err)]
    pub async fn list_members(&mut self, cohort_id: CohortId) -> Result<Vec<CohortMemberDBResponse>> {
        let members = sqlx::query_as::<_, CohortMemberDBResponse>(
            r#"
            SELECT u.id AS user_id, u.name, u.email, cm.status, cm.joined_at
            FROM cohort_memberships cm
            JOIN users u ON u.id = cm.user_id
            WHERE cm.cohort_id = $1
            ORDER BY u.name, u.id
            "#,
        )
        .bind(cohort_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(members)
    }

    /// The user's single ACTIVE membership, if any. The partial unique index
    /// guarantees at most one row qualifies.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn active_membership_for_user(&mut self, user_id: UserId) -> Result<Option<CohortMembershipDBResponse>> {
        let membership = sqlx::query_as::<_, CohortMembershipDBResponse>(
            "SELECT * FROM cohort_memberships WHERE user_id = $1 AND status = 'ACTIVE'",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(membership)
    }

    /// Set or clear the cohort-level check-in frequency override.
    #[instrument(skip(self), fields(cohort_id = %abbrev_uuid(&id), days = ?days), err)]
    pub async fn set_check_in_frequency(&mut self, id: CohortId, days: Option<i32>) -> Result<CohortDBResponse> {
        let cohort = sqlx::query_as::<_, CohortDBResponse>(
            r#"
            UPDATE cohorts SET
                check_in_frequency_days = $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(days)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(cohort)
    }
}
