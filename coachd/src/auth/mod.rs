//! Authentication and authorization.
//!
//! Identity is delegated to an upstream SSO proxy that forwards trusted
//! headers on every request; this crate never sees a password. The module
//! provides:
//!
//! - User resolution from proxy headers (with optional auto-creation of
//!   unknown users at a configured default role)
//! - A static role/permission matrix and route guards built on it
//!
//! # Authentication
//!
//! The upstream proxy strips and re-sets the identity headers on every
//! request, so their presence is proof of authentication:
//!
//! - `x-coachd-user` (configurable): unique user identifier
//! - `x-coachd-email` (optional): email, when the identifier is opaque
//! - `x-coachd-name` (optional): display name for auto-created users
//!
//! Requests without a resolvable identity are rejected with 401 and no
//! detail about whether the account exists.
//!
//! # Authorization
//!
//! Access control is a static matrix over roles (ADMIN, COACH, CLIENT),
//! resources, and operations; see [`permissions`] for the matrix and the
//! [`RequiresPermission`](permissions::RequiresPermission) route guard.
//!
//! # Modules
//!
//! - [`current_user`]: extractor resolving the authenticated user in handlers
//! - [`permissions`]: permission matrix, helpers, and route guards
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use coachd::api::models::users::CurrentUser;
//! use coachd::auth::permissions::{operation, resource, RequiresPermission};
//!
//! // Any authenticated user
//! async fn me(current_user: CurrentUser) -> Json<UserResponse> { /* ... */ }
//!
//! // Permission-gated
//! async fn list_users(
//!     current_user: RequiresPermission<resource::Users, operation::ReadAll>,
//! ) -> Json<Vec<UserResponse>> { /* ... */ }
//! ```

pub mod current_user;
pub mod permissions;
