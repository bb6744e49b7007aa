//! OpenAPI documentation for the control-plane API.
//!
//! The generated spec is served at `/api/v1/openapi.json` with an interactive
//! Scalar UI at `/api/v1/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::{api, cadence, db};

/// Security scheme for the proxy-header identity.
struct ProxyAuthAddon;

impl Modify for ProxyAuthAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "proxy_header".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-coachd-user",
                    "Trusted identity header set by the upstream SSO proxy. \
                     The proxy strips and re-sets this header on every request; \
                     requests without it are rejected with 401.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Control-plane API")
    ),
    modifiers(&ProxyAuthAddon),
    paths(
        api::handlers::users::list_users,
        api::handlers::users::create_user,
        api::handlers::users::get_current_user,
        api::handlers::users::get_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::cadence::get_check_in_frequency_config,
        api::handlers::cadence::update_user_check_in_frequency,
        api::handlers::cadence::update_cohort_check_in_frequency,
        api::handlers::cadence::get_my_check_in_frequency,
        api::handlers::check_ins::create_check_in,
        api::handlers::check_ins::list_user_check_ins,
        api::handlers::check_ins::get_my_check_in_status,
        api::handlers::cohorts::list_cohorts,
        api::handlers::cohorts::create_cohort,
        api::handlers::cohorts::get_cohort,
        api::handlers::cohorts::update_cohort,
        api::handlers::cohorts::delete_cohort,
        api::handlers::cohorts::list_cohort_members,
        api::handlers::cohorts::add_cohort_member,
        api::handlers::cohorts::remove_cohort_member,
        api::handlers::credits::allocate_credits,
        api::handlers::credits::get_credits_history,
        api::handlers::credits::get_credits_summary,
        api::handlers::bootcamps::list_bootcamps,
        api::handlers::bootcamps::create_bootcamp,
        api::handlers::bootcamps::get_bootcamp,
        api::handlers::bootcamps::update_bootcamp,
        api::handlers::bootcamps::delete_bootcamp,
        api::handlers::bootcamps::register_for_bootcamp,
        api::handlers::bootcamps::unregister_from_bootcamp,
        api::handlers::bootcamps::list_bootcamp_registrations,
        api::handlers::settings::list_settings,
        api::handlers::settings::update_setting,
        api::handlers::audit::list_audit_log,
    ),
    components(
        schemas(
            api::models::users::Role,
            api::models::users::UserCreate,
            api::models::users::UserUpdate,
            api::models::users::UserResponse,
            api::models::users::ListUsersQuery,
            api::models::pagination::Pagination,
            api::models::pagination::PaginatedResponse<api::models::users::UserResponse>,
            api::models::pagination::PaginatedResponse<api::models::cohorts::CohortResponse>,
            api::models::pagination::PaginatedResponse<api::models::bootcamps::BootcampResponse>,
            api::models::pagination::PaginatedResponse<api::models::check_ins::CheckInResponse>,
            api::models::pagination::PaginatedResponse<api::models::audit::AuditEntryResponse>,
            api::models::cadence::UpdateCheckInFrequencyRequest,
            api::models::cadence::EffectiveFrequencyResponse,
            api::models::cadence::CheckInFrequencyConfigResponse,
            cadence::FrequencySource,
            api::models::check_ins::CheckInCreate,
            api::models::check_ins::CheckInResponse,
            api::models::check_ins::CheckInStatusResponse,
            api::models::check_ins::ListCheckInsQuery,
            api::models::cohorts::CohortCreate,
            api::models::cohorts::CohortUpdate,
            api::models::cohorts::AddMemberRequest,
            api::models::cohorts::ListCohortsQuery,
            api::models::cohorts::CohortResponse,
            api::models::cohorts::CohortMembershipResponse,
            api::models::cohorts::CohortMemberResponse,
            db::models::cohorts::MembershipStatus,
            api::models::credits::CreditAllocation,
            api::models::credits::CreditTransactionResponse,
            api::models::credits::CreditTransactionWithActorResponse,
            api::models::credits::CreditAllocationResponse,
            api::models::credits::CreditsSummaryResponse,
            api::models::bootcamps::BootcampCreate,
            api::models::bootcamps::BootcampUpdate,
            api::models::bootcamps::ListBootcampsQuery,
            api::models::bootcamps::BootcampResponse,
            api::models::bootcamps::BootcampRegistrationResponse,
            api::models::bootcamps::BootcampRegistrantResponse,
            api::models::settings::SettingUpdate,
            api::models::settings::SettingResponse,
            api::models::audit::AuditEntryResponse,
            api::models::audit::ListAuditLogQuery,
            db::models::audit::AuditAction,
        )
    ),
    tags(
        (name = "users", description = "Manage coaching-platform accounts: admins, coaches, and clients.

Clients carry a credit balance and an optional personal check-in cadence override."),
        (name = "cadence", description = "Check-in frequency resolution and overrides.

The effective frequency resolves user override → active cohort override → system default, falling back to 7 days."),
        (name = "check-ins", description = "Client check-in records and the due-date status derived from the resolved cadence."),
        (name = "cohorts", description = "Group programs with rosters. A user holds at most one ACTIVE membership at a time; removing a member keeps the row as history."),
        (name = "credits", description = "The auditable credit ledger. Every balance change is a signed immutable transaction plus an audit entry; balances never go negative."),
        (name = "bootcamps", description = "Scheduled events clients join for 1 credit. Unregistering before the start time refunds the credit through the ledger."),
        (name = "settings", description = "System-wide key/value settings, including the default check-in frequency. Writes are audited."),
        (name = "audit", description = "Read-only audit trail of credit mutations and settings writes."),
    ),
    info(
        title = "coachd API",
        description = "Control plane for a fitness-coaching platform.

## Authentication

Identity comes from trusted headers set by the upstream SSO proxy (see the `x-coachd-user` security scheme). There is no login endpoint; unauthenticated requests receive 401.

## Errors

Errors are returned as a JSON object with a single user-safe message:

```json
{
  \"error\": \"Cannot deduct 2 credits. User only has 1.\"
}
```",
    ),
)]
pub struct ApiDoc;
