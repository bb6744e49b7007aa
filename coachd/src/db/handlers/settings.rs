//! Database repository for system settings.
//!
//! Settings are key/value text rows. Writes are audited in the same
//! transaction; parsing into the typed snapshot happens in
//! [`crate::settings`], not here.

use crate::db::{
    errors::Result,
    handlers::audit::AuditLog,
    models::{
        audit::{AuditAction, AuditEntryCreateDBRequest},
        settings::{SettingDBResponse, SettingUpsertDBRequest},
    },
};
use sqlx::{Connection, PgConnection};
use tracing::instrument;

pub struct Settings<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Settings<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Insert or overwrite a setting, recording the old and new values in
    /// the audit log within the same transaction.
    #[instrument(skip(self, request), fields(key = %request.key), err)]
    pub async fn upsert(&mut self, request: &SettingUpsertDBRequest) -> Result<SettingDBResponse> {
        let mut tx = self.db.begin().await?;

        let old_value = sqlx::query_scalar::<_, String>("SELECT value FROM system_settings WHERE key = $1")
            .bind(&request.key)
            .fetch_optional(&mut *tx)
            .await?;

        let setting = sqlx::query_as::<_, SettingDBResponse>(
            r#"
            INSERT INTO system_settings (key, value, updated_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW(), updated_by = $3
            RETURNING *
            "#,
        )
        .bind(&request.key)
        .bind(&request.value)
        .bind(request.updated_by)
        .fetch_one(&mut *tx)
        .await?;

        AuditLog::new(&mut tx)
            .record(&AuditEntryCreateDBRequest {
                action: AuditAction::UpdateSetting,
                actor_id: request.updated_by,
                target_id: None,
                target_type: Some("setting".to_string()),
                details: Some(serde_json::json!({
                    "key": request.key,
                    "old_value": old_value,
                    "new_value": request.value,
                })),
            })
            .await?;

        tx.commit().await?;

        Ok(setting)
    }

    #[instrument(skip(self), err)]
    pub async fn get(&mut self, key: &str) -> Result<Option<SettingDBResponse>> {
        let setting = sqlx::query_as::<_, SettingDBResponse>("SELECT * FROM system_settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(setting)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<SettingDBResponse>> {
        let settings = sqlx::query_as::<_, SettingDBResponse>("SELECT * FROM system_settings ORDER BY key")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::audit::AuditEntryFilter;
    use crate::types::SYSTEM_USER_ID;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_upsert_inserts_then_overwrites(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut settings = Settings::new(&mut conn);

        let created = settings
            .upsert(&SettingUpsertDBRequest {
                key: "defaultCheckInFrequencyDays".to_string(),
                value: "7".to_string(),
                updated_by: SYSTEM_USER_ID,
            })
            .await
            .unwrap();
        assert_eq!(created.value, "7");

        let overwritten = settings
            .upsert(&SettingUpsertDBRequest {
                key: "defaultCheckInFrequencyDays".to_string(),
                value: "14".to_string(),
                updated_by: SYSTEM_USER_ID,
            })
            .await
            .unwrap();
        assert_eq!(overwritten.value, "14");

        let fetched = settings.get("defaultCheckInFrequencyDays").await.unwrap().unwrap();
        assert_eq!(fetched.value, "14");
        assert_eq!(fetched.updated_by, Some(SYSTEM_USER_ID));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_writes_are_audited_with_old_and_new(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut settings = Settings::new(&mut conn);

        settings
            .upsert(&SettingUpsertDBRequest {
                key: "defaultCheckInFrequencyDays".to_string(),
                value: "7".to_string(),
                updated_by: SYSTEM_USER_ID,
            })
            .await
            .unwrap();
        settings
            .upsert(&SettingUpsertDBRequest {
                key: "defaultCheckInFrequencyDays".to_string(),
                value: "10".to_string(),
                updated_by: SYSTEM_USER_ID,
            })
            .await
            .unwrap();

        let mut audit = AuditLog::new(&mut conn);
        let entries = audit
            .list(&AuditEntryFilter::new(0, 10).with_action(AuditAction::UpdateSetting))
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);

        // Newest first: the overwrite carries the previous value
        let details = entries[0].details.as_ref().unwrap();
        assert_eq!(details["old_value"], "7");
        assert_eq!(details["new_value"], "10");

        let details = entries[1].details.as_ref().unwrap();
        assert_eq!(details["old_value"], serde_json::Value::Null);
        assert_eq!(details["new_value"], "7");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_missing_key(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut settings = Settings::new(&mut conn);

        assert!(settings.get("doesNotExist").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_is_ordered_by_key(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut settings = Settings::new(&mut conn);

        for key in ["zebra", "alpha", "middle"] {
            settings
                .upsert(&SettingUpsertDBRequest {
                    key: key.to_string(),
                    value: "x".to_string(),
                    updated_by: SYSTEM_USER_ID,
                })
                .await
                .unwrap();
        }

        let listed = settings.list().await.unwrap();
        let keys: Vec<&str> = listed.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["alpha", "middle", "zebra"]);
    }
}
