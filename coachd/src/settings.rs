//! Typed view over the `system_settings` table.
//!
//! Rows in `system_settings` are untyped strings so they can be edited from
//! the admin UI without a schema change. Everything else in the codebase goes
//! through [`SettingsSnapshot`], which parses the keys it knows about and
//! falls back to compiled-in defaults when a row is missing or unreadable. A
//! bad value in the table must never take check-in scheduling down.

use moka::future::Cache;
use sqlx::{PgConnection, PgPool};
use tracing::{instrument, warn};

use crate::{
    config::SettingsCacheConfig,
    db::{errors::Result, handlers::Settings},
};

/// Key of the global check-in frequency default, in days, stored as a string.
pub const DEFAULT_CHECK_IN_FREQUENCY_KEY: &str = "defaultCheckInFrequencyDays";

/// Frequency used when the settings row is missing or unparseable.
pub const DEFAULT_CHECK_IN_FREQUENCY_DAYS: i32 = 7;

/// Parsed settings, valid as of the moment they were loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettingsSnapshot {
    pub default_check_in_frequency_days: i32,
}

impl Default for SettingsSnapshot {
    fn default() -> Self {
        Self {
            default_check_in_frequency_days: DEFAULT_CHECK_IN_FREQUENCY_DAYS,
        }
    }
}

impl SettingsSnapshot {
    /// Load and parse the current settings rows.
    pub async fn load(db: &mut PgConnection) -> Result<Self> {
        let row = Settings::new(db).get(DEFAULT_CHECK_IN_FREQUENCY_KEY).await?;
        Ok(Self {
            default_check_in_frequency_days: parse_frequency_days(row.as_ref().map(|r| r.value.as_str())),
        })
    }
}

/// Parses a stored frequency value, degrading to the compiled-in default on
/// anything that is not a positive integer.
fn parse_frequency_days(value: Option<&str>) -> i32 {
    let Some(raw) = value else {
        return DEFAULT_CHECK_IN_FREQUENCY_DAYS;
    };
    match raw.trim().parse::<i32>() {
        Ok(days) if days > 0 => days,
        _ => {
            warn!(
                value = raw,
                default = DEFAULT_CHECK_IN_FREQUENCY_DAYS,
                "Unusable {DEFAULT_CHECK_IN_FREQUENCY_KEY} setting, using default"
            );
            DEFAULT_CHECK_IN_FREQUENCY_DAYS
        }
    }
}

const SNAPSHOT_KEY: &str = "snapshot";

/// Short-lived cache of the parsed settings snapshot.
///
/// Reads go through the cache so the resolver does not hit `system_settings`
/// on every check-in status request; writes call [`SettingsCache::invalidate`]
/// after commit so the next read observes the new value immediately instead of
/// waiting out the TTL.
#[derive(Clone)]
pub struct SettingsCache {
    cache: Cache<&'static str, SettingsSnapshot>,
    db: PgPool,
}

impl SettingsCache {
    pub fn new(db: PgPool, config: &SettingsCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.capacity)
            .time_to_live(config.ttl)
            .build();
        Self { cache, db }
    }

    /// Current snapshot, loading from the database on a cold or expired cache.
    #[instrument(skip(self), err)]
    pub async fn snapshot(&self) -> Result<SettingsSnapshot> {
        if let Some(snapshot) = self.cache.get(SNAPSHOT_KEY).await {
            return Ok(snapshot);
        }
        let mut conn = self.db.acquire().await?;
        let snapshot = SettingsSnapshot::load(&mut conn).await?;
        self.cache.insert(SNAPSHOT_KEY, snapshot).await;
        Ok(snapshot)
    }

    /// Drop the cached snapshot. Called after every settings write.
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
