//! API request/response models for bootcamps and registrations.

use super::pagination::Pagination;
use crate::db::models::bootcamps::{BootcampDBResponse, BootcampRegistrantDBResponse, BootcampRegistrationDBResponse};
use crate::types::{BootcampId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BootcampCreate {
    pub name: String,

    pub description: Option<String>,

    /// Start of the bootcamp; registration closes at this instant
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BootcampUpdate {
    pub name: Option<String>,

    pub description: Option<String>,

    pub starts_at: Option<DateTime<Utc>>,
}

/// Query parameters for listing bootcamps
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListBootcampsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BootcampResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BootcampId,

    pub name: String,

    pub description: Option<String>,

    pub starts_at: DateTime<Utc>,

    #[schema(value_type = String, format = "uuid")]
    pub created_by: UserId,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl From<BootcampDBResponse> for BootcampResponse {
    fn from(bootcamp: BootcampDBResponse) -> Self {
        Self {
            id: bootcamp.id,
            name: bootcamp.name,
            description: bootcamp.description,
            starts_at: bootcamp.starts_at,
            created_by: bootcamp.created_by,
            created_at: bootcamp.created_at,
            updated_at: bootcamp.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BootcampRegistrationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub bootcamp_id: BootcampId,

    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,

    pub registered_at: DateTime<Utc>,

    /// Credit balance after the registration was charged or refunded
    pub new_balance: i32,
}

impl BootcampRegistrationResponse {
    pub fn from_db(registration: BootcampRegistrationDBResponse, new_balance: i32) -> Self {
        Self {
            bootcamp_id: registration.bootcamp_id,
            user_id: registration.user_id,
            registered_at: registration.registered_at,
            new_balance,
        }
    }
}

/// One registered participant, as seen by coaches and admins.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BootcampRegistrantResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,

    pub name: String,

    pub email: String,

    pub registered_at: DateTime<Utc>,
}

impl From<BootcampRegistrantDBResponse> for BootcampRegistrantResponse {
    fn from(registrant: BootcampRegistrantDBResponse) -> Self {
        Self {
            user_id: registrant.user_id,
            name: registrant.name,
            email: registrant.email,
            registered_at: registrant.registered_at,
        }
    }
}
