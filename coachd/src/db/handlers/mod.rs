//! Repository implementations for database access.
//!
//! This module provides repository structs for each major entity in the system.
//! Repositories follow a consistent pattern and implement the [`Repository`] trait.
//!
//! # Design Pattern
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed CRUD operations
//! - Handles query construction and parameter binding
//! - Returns domain models from [`crate::db::models`]
//! - Uses the connection's transaction for ACID guarantees
//!
//! # Available Repositories
//!
//! - [`Users`]: User accounts, roles, and per-user cadence overrides
//! - [`Cohorts`]: Cohorts, memberships, and cohort-level cadence overrides
//! - [`CheckIns`]: Append-only check-in history
//! - [`Credits`]: Balance-changing ledger writes and transaction history
//! - [`Bootcamps`]: Bootcamps and credit-consuming registrations
//! - [`Settings`]: Key-value system settings
//! - [`AuditLog`]: Append-only record of sensitive mutations
//!
//! # Common Pattern
//!
//! All repositories follow this usage pattern:
//!
//! ```ignore
//! use coachd::db::handlers::{Repository, Users};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     // Start a transaction
//!     let mut tx = pool.begin().await?;
//!
//!     // Create repository from transaction
//!     let mut repo = Users::new(&mut tx);
//!
//!     // Perform operations
//!     let users = repo.list(&coachd::db::handlers::users::UserFilter::new(0, 100)).await?;
//!
//!     // Commit or rollback
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod audit;
pub mod bootcamps;
pub mod check_ins;
pub mod cohorts;
pub mod credits;
pub mod repository;
pub mod settings;
pub mod users;

pub use audit::AuditLog;
pub use bootcamps::Bootcamps;
pub use check_ins::CheckIns;
pub use cohorts::Cohorts;
pub use credits::Credits;
pub use repository::Repository;
pub use settings::Settings;
pub use users::Users;
