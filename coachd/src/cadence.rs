//! Check-in cadence resolution.
//!
//! A client's effective check-in frequency comes from the first layer that
//! defines one:
//!
//! 1. the user's own `check_in_frequency_days` override,
//! 2. their active cohort's override,
//! 3. the global default from system settings (which itself degrades to a
//!    compiled-in constant, see [`crate::settings`]).
//!
//! The same resolution backs the coach-facing config view, the member-facing
//! frequency endpoint, and check-in due-date computation, so it lives here
//! rather than in any one handler.

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use utoipa::ToSchema;

use crate::{
    db::{
        errors::Result,
        handlers::{Cohorts, Repository, Users},
    },
    settings::SettingsSnapshot,
    types::UserId,
};

/// Frequency reported by the member-facing endpoint when the authenticated
/// user's row no longer exists. Deliberately aggressive so a half-deleted
/// account surfaces quickly instead of going quiet for a week.
pub const MISSING_USER_FREQUENCY_DAYS: i32 = 1;

/// Lowest accepted override value, in days.
pub const MIN_FREQUENCY_DAYS: i32 = 1;

/// Highest accepted override value, in days.
pub const MAX_FREQUENCY_DAYS: i32 = 90;

/// Which layer supplied the effective frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FrequencySource {
    User,
    Cohort,
    System,
}

/// The answer to "how often should this client check in".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedFrequency {
    pub frequency_days: i32,
    pub source: FrequencySource,
}

/// All three cadence layers for one user, plus the resolved result. This is
/// what coaches see when deciding whether an override is worth setting.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyConfig {
    pub user_override: Option<i32>,
    pub cohort_override: Option<i32>,
    pub cohort_name: Option<String>,
    pub system_default: i32,
    pub effective: i32,
    pub source: FrequencySource,
}

impl FrequencyConfig {
    pub fn resolved(&self) -> ResolvedFrequency {
        ResolvedFrequency {
            frequency_days: self.effective,
            source: self.source,
        }
    }
}

/// Resolve every cadence layer for a user.
///
/// Returns `Ok(None)` when the user does not exist; callers decide whether
/// that is a 404 (admin and coach operations) or a safe default (the
/// member-facing endpoint, see [`MISSING_USER_FREQUENCY_DAYS`]).
pub async fn frequency_config(
    db: &mut PgConnection,
    snapshot: &SettingsSnapshot,
    user_id: UserId,
) -> Result<Option<FrequencyConfig>> {
    let Some(user) = Users::new(db).get_by_id(user_id).await? else {
        return Ok(None);
    };

    // At most one ACTIVE membership per user is enforced by a partial unique
    // index, so "the" cohort is well-defined.
    let cohort = match Cohorts::new(db).active_membership_for_user(user_id).await? {
        Some(membership) => Cohorts::new(db).get_by_id(membership.cohort_id).await?,
        None => None,
    };
    let (cohort_override, cohort_name) = match cohort {
        Some(cohort) => (cohort.check_in_frequency_days, Some(cohort.name)),
        None => (None, None),
    };

    let (effective, source) = if let Some(days) = user.check_in_frequency_days {
        (days, FrequencySource::User)
    } else if let Some(days) = cohort_override {
        (days, FrequencySource::Cohort)
    } else {
        (snapshot.default_check_in_frequency_days, FrequencySource::System)
    };

    Ok(Some(FrequencyConfig {
        user_override: user.check_in_frequency_days,
        cohort_override,
        cohort_name,
        system_default: snapshot.default_check_in_frequency_days,
        effective,
        source,
    }))
}

/// Resolve just the effective frequency for a user.
pub async fn resolve(
    db: &mut PgConnection,
    snapshot: &SettingsSnapshot,
    user_id: UserId,
) -> Result<Option<ResolvedFrequency>> {
    Ok(frequency_config(db, snapshot, user_id).await?.map(|config| config.resolved()))
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use super::*;
    use crate::{
        api::models::users::Role,
        db::models::{cohorts::CohortCreateDBRequest, users::UserCreateDBRequest},
        types::SYSTEM_USER_ID,
    };

    async fn create_client(conn: &mut PgConnection, frequency: Option<i32>) -> UserId {
        Users::new(conn)
            .create(&UserCreateDBRequest {
                email: format!("client-{}@example.com", Uuid::new_v4()),
                name: "Cadence Client".to_string(),
                role: Role::Client,
                check_in_frequency_days: frequency,
            })
            .await
            .unwrap()
            .id
    }

    async fn create_cohort_with_member(
        conn: &mut PgConnection,
        user_id: UserId,
        frequency: Option<i32>,
    ) -> crate::types::CohortId {
        let cohort = Cohorts::new(conn)
            .create(&CohortCreateDBRequest {
                name: "Spring Squad".to_string(),
                description: None,
                check_in_frequency_days: frequency,
                created_by: SYSTEM_USER_ID,
            })
            .await
            .unwrap();
        Cohorts::new(conn).add_member(cohort.id, user_id).await.unwrap();
        cohort.id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_cohort_override_applies_when_user_has_none(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_client(&mut conn, None).await;
        create_cohort_with_member(&mut conn, user_id, Some(3)).await;

        let resolved = resolve(&mut conn, &SettingsSnapshot::default(), user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.frequency_days, 3);
        assert_eq!(resolved.source, FrequencySource::Cohort);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_user_override_beats_cohort(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_client(&mut conn, Some(5)).await;
        create_cohort_with_member(&mut conn, user_id, Some(3)).await;

        let resolved = resolve(&mut conn, &SettingsSnapshot::default(), user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.frequency_days, 5);
        assert_eq!(resolved.source, FrequencySource::User);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_system_default_when_no_overrides(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_client(&mut conn, None).await;

        let snapshot = SettingsSnapshot {
            default_check_in_frequency_days: 10,
        };
        let resolved = resolve(&mut conn, &snapshot, user_id).await.unwrap().unwrap();
        assert_eq!(resolved.frequency_days, 10);
        assert_eq!(resolved.source, FrequencySource::System);

        // With nothing configured anywhere, the compiled-in default holds.
        let resolved = resolve(&mut conn, &SettingsSnapshot::default(), user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.frequency_days, 7);
        assert_eq!(resolved.source, FrequencySource::System);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_user_resolves_to_none(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let resolved = resolve(&mut conn, &SettingsSnapshot::default(), Uuid::new_v4())
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_resolution_is_idempotent(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_client(&mut conn, None).await;
        create_cohort_with_member(&mut conn, user_id, Some(4)).await;

        let snapshot = SettingsSnapshot::default();
        let first = resolve(&mut conn, &snapshot, user_id).await.unwrap();
        let second = resolve(&mut conn, &snapshot, user_id).await.unwrap();
        assert_eq!(first, second);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_inactive_membership_does_not_apply(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_client(&mut conn, None).await;
        let cohort_id = create_cohort_with_member(&mut conn, user_id, Some(3)).await;

        Cohorts::new(&mut conn).remove_member(cohort_id, user_id).await.unwrap();

        let resolved = resolve(&mut conn, &SettingsSnapshot::default(), user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.frequency_days, 7);
        assert_eq!(resolved.source, FrequencySource::System);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_config_view_reports_every_layer(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = create_client(&mut conn, Some(2)).await;
        create_cohort_with_member(&mut conn, user_id, Some(3)).await;

        let config = frequency_config(&mut conn, &SettingsSnapshot::default(), user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            config,
            FrequencyConfig {
                user_override: Some(2),
                cohort_override: Some(3),
                cohort_name: Some("Spring Squad".to_string()),
                system_default: 7,
                effective: 2,
                source: FrequencySource::User,
            }
        );
    }
}
