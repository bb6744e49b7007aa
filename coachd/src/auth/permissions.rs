//! Role-based permission checking and route guards.
//!
//! Authorization is a static matrix over [`Resource`] × [`Operation`] per
//! [`Role`](crate::api::models::users::Role):
//!
//! - **ADMIN** holds every operation on every resource.
//! - **COACH** reads users, cohorts, check-ins, and bootcamps; creates and
//!   updates cohorts (including memberships and cadence overrides); records
//!   and reads check-ins for any client. No credits, settings, or audit log.
//! - **CLIENT** is restricted to their own data (profile, cohort membership,
//!   check-ins), plus browsing bootcamps and registering/unregistering
//!   themselves.
//!
//! Operations come in `*All` / `*Own` pairs: the `Own` flavor only grants
//! access to resources the caller owns, which the `can_*_own_resource`
//! helpers check together with the identity.
//!
//! # Usage in Handlers
//!
//! The [`RequiresPermission`] extractor authenticates the caller and checks
//! a permission in one step; it derefs to the [`CurrentUser`]:
//!
//! ```ignore
//! use coachd::auth::permissions::{operation, resource, RequiresPermission};
//!
//! async fn create_cohort(
//!     current_user: RequiresPermission<resource::Cohorts, operation::CreateAll>,
//!     State(state): State<AppState>,
//! ) -> Result<Json<CohortResponse>> {
//!     tracing::info!("created by {}", current_user.id);
//!     // ...
//! }
//! ```
//!
//! Handlers that allow both `All` and `Own` access extract the weaker
//! permission and branch on the helpers:
//!
//! ```ignore
//! let can_read_all = can_read_all_resources(&current_user, Resource::CheckIns);
//! if !can_read_all && !can_read_own_resource(&current_user, Resource::CheckIns, user_id) {
//!     return Err(Error::InsufficientPermissions { /* ... */ });
//! }
//! ```

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
    types::{Operation, Permission, Resource, UserId},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;
use std::ops::Deref;

/// Generates a zero-sized marker type per enum variant, convertible into the
/// variant it names. The markers are what [`RequiresPermission`] takes as
/// type parameters.
macro_rules! markers {
    ($enum:ident: $($name:ident),+ $(,)?) => {
        paste::paste! {
            $(
                #[doc = "Marker for [`" $enum "::" $name "`](crate::types::" $enum "::" $name ")."]
                #[derive(Debug, Clone, Copy, Default)]
                pub struct $name;

                impl From<$name> for crate::types::$enum {
                    fn from(_: $name) -> Self {
                        crate::types::$enum::$name
                    }
                }
            )+
        }
    };
}

/// Marker types for [`Resource`] variants.
pub mod resource {
    markers!(Resource: Users, Cohorts, CheckIns, Credits, Bootcamps, Settings, AuditLog);
}

/// Marker types for [`Operation`] variants.
pub mod operation {
    markers!(Operation: CreateAll, CreateOwn, ReadAll, ReadOwn, UpdateAll, UpdateOwn, DeleteAll, DeleteOwn);
}

/// The role matrix. Every authorization decision in the crate goes through
/// this function.
pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    use Operation::*;
    use Resource::*;

    match user.role {
        Role::Admin => true,

        // Coaches run the programs but stay away from money, settings, and
        // the audit trail. CheckIns/UpdateAll doubles as the gate for
        // cadence override updates.
        Role::Coach => matches!(
            (resource, operation),
            (Users, ReadAll | ReadOwn | UpdateOwn)
                | (Cohorts, CreateAll | ReadAll | ReadOwn | UpdateAll)
                | (CheckIns, CreateAll | CreateOwn | ReadAll | ReadOwn | UpdateAll)
                | (Bootcamps, ReadAll | ReadOwn)
        ),

        // Clients touch their own data only; the bootcamp catalog is the one
        // shared read surface, with self-service registration.
        Role::Client => matches!(
            (resource, operation),
            (Users, ReadOwn | UpdateOwn)
                | (Cohorts, ReadOwn)
                | (CheckIns, CreateOwn | ReadOwn)
                | (Bootcamps, ReadAll | CreateOwn | DeleteOwn)
        ),
    }
}

/// Whether `user` may read every instance of `resource`.
pub fn can_read_all_resources(user: &CurrentUser, resource: Resource) -> bool {
    has_permission(user, resource, Operation::ReadAll)
}

/// Whether `user` may read a `resource` instance owned by `owner_id`.
pub fn can_read_own_resource(user: &CurrentUser, resource: Resource, owner_id: UserId) -> bool {
    user.id == owner_id && has_permission(user, resource, Operation::ReadOwn)
}

/// Whether `user` may update a `resource` instance owned by `owner_id`.
pub fn can_update_own_resource(user: &CurrentUser, resource: Resource, owner_id: UserId) -> bool {
    user.id == owner_id && has_permission(user, resource, Operation::UpdateOwn)
}

/// Route guard: authenticates the request and requires one permission.
///
/// Rejects with 401 when the request carries no valid identity and 403 when
/// the authenticated user lacks the permission. On success it wraps the
/// [`CurrentUser`] and derefs to it, so handlers use it exactly like the
/// plain extractor.
#[derive(Debug)]
pub struct RequiresPermission<R, O> {
    user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

impl<R, O> RequiresPermission<R, O> {
    /// Consume the guard and return the authenticated user.
    pub fn into_inner(self) -> CurrentUser {
        self.user
    }
}

impl<R, O> Deref for RequiresPermission<R, O> {
    type Target = CurrentUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<R, O> FromRequestParts<AppState> for RequiresPermission<R, O>
where
    R: Into<Resource> + Default + Send + Sync,
    O: Into<Operation> + Default + Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        let resource: Resource = R::default().into();
        let operation: Operation = O::default().into();

        if !has_permission(&user, resource, operation) {
            return Err(Error::InsufficientPermissions {
                required: Permission::Allow(resource, operation),
                action: operation,
                resource: resource.to_string(),
            });
        }

        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}
