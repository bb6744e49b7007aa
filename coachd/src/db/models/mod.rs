//! Database record models matching table schemas.
//!
//! This module contains struct definitions that directly correspond to database
//! table rows. These models are used by repositories to return query results
//! and accept insertion/update data.
//!
//! # Design Principles
//!
//! - **Schema Mapping**: Each model struct matches a database table schema
//! - **SQLx Integration**: Models derive `sqlx::FromRow` for query results
//! - **Separation**: Database models are distinct from API models to allow
//!   independent evolution of storage and API representations
//! - **Type Safety**: Uses type aliases for IDs (UserId, CohortId, etc.)
//!
//! # Model Categories
//!
//! ## Core Resources
//!
//! - [`users`]: User accounts, roles, and check-in frequency overrides
//! - [`cohorts`]: Group programs and cohort memberships
//! - [`bootcamps`]: Bootcamps and registrations
//! - [`check_ins`]: Client check-in history
//!
//! ## Bookkeeping
//!
//! - [`credits`]: Immutable credit-ledger rows
//! - [`audit`]: Append-only audit-log entries
//! - [`settings`]: System settings key/value rows
//!
//! # Conversion to API Models
//!
//! Database models implement `From` conversions to API models:
//!
//! ```ignore
//! use coachd::db::models::users::UserDBResponse;
//! use coachd::api::models::users::UserResponse;
//!
//! let db_user: UserDBResponse = /* ... */;
//! let api_response = UserResponse::from(db_user);
//! ```

pub mod audit;
pub mod bootcamps;
pub mod check_ins;
pub mod cohorts;
pub mod credits;
pub mod settings;
pub mod users;
