//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request deserialization
//! and response serialization. These models define the public API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database models,
//!   allowing independent evolution of API and storage representations
//! - **Validation**: Models use serde for deserialization and validation
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API docs
//!
//! # Model Categories
//!
//! ## Resource Models
//!
//! - [`users`]: User profiles, roles, and creation/update requests
//! - [`cohorts`]: Cohort definitions and membership relationships
//! - [`bootcamps`]: Bootcamp events and registrations
//! - [`check_ins`]: Check-in records and cadence status
//! - [`cadence`]: Check-in frequency overrides and resolution views
//!
//! ## Accounting Models
//!
//! - [`credits`]: Credit allocations, the transaction ledger, and summaries
//! - [`audit`]: Immutable audit log entries
//!
//! ## Operational Models
//!
//! - [`settings`]: Raw system settings as exposed to admins
//! - [`pagination`]: Shared skip/limit wrappers for list endpoints
//!
//! # Example
//!
//! ```ignore
//! use coachd::api::models::users::{UserCreate, UserResponse};
//!
//! // Deserialize from JSON
//! let create_req: UserCreate = serde_json::from_str(json_str)?;
//!
//! // Serialize to JSON
//! let response = UserResponse { /* ... */ };
//! let json = serde_json::to_string(&response)?;
//! ```

pub mod audit;
pub mod bootcamps;
pub mod cadence;
pub mod check_ins;
pub mod cohorts;
pub mod credits;
pub mod pagination;
pub mod settings;
pub mod users;
