//! API request/response models for check-in frequency overrides.
//!
//! Shared between the user and cohort handlers; both expose the same
//! override shape at different levels of the cadence stack.

use crate::cadence::{FrequencyConfig, FrequencySource, ResolvedFrequency};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for setting or clearing a frequency override.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateCheckInFrequencyRequest {
    /// Days between expected check-ins, within [1, 90]; `null` clears the
    /// override so the next layer applies
    pub frequency_days: Option<i32>,
}

/// The resolved cadence for one user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EffectiveFrequencyResponse {
    pub frequency_days: i32,
    pub source: FrequencySource,
}

impl From<ResolvedFrequency> for EffectiveFrequencyResponse {
    fn from(resolved: ResolvedFrequency) -> Self {
        Self {
            frequency_days: resolved.frequency_days,
            source: resolved.source,
        }
    }
}

/// Every cadence layer for one user, for the coach/admin config view.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckInFrequencyConfigResponse {
    /// User-level override, if set
    pub user_override: Option<i32>,

    /// Override from the user's active cohort, if any
    pub cohort_override: Option<i32>,

    /// Name of the active cohort the override comes from
    pub cohort_name: Option<String>,

    /// Global default from system settings
    pub system_default: i32,

    /// The value the resolver actually returns
    pub effective: i32,

    /// Which layer `effective` came from
    pub source: FrequencySource,
}

impl From<FrequencyConfig> for CheckInFrequencyConfigResponse {
    fn from(config: FrequencyConfig) -> Self {
        Self {
            user_override: config.user_override,
            cohort_override: config.cohort_override,
            cohort_name: config.cohort_name,
            system_default: config.system_default,
            effective: config.effective,
            source: config.source,
        }
    }
}
