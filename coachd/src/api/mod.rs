//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! The API is divided into several functional areas:
//!
//! - **Users** (`/api/v1/users/*`): Accounts, credits, check-in history
//! - **Cohorts** (`/api/v1/cohorts/*`): Cohorts and memberships
//! - **Check-ins** (`/api/v1/check-ins`, `/api/v1/users/current/check-in-status`): Submissions and due status
//! - **Bootcamps** (`/api/v1/bootcamps/*`): Events and credit-charged registrations
//! - **Settings** (`/api/v1/settings/*`): System settings administration
//! - **Audit** (`/api/v1/audit-log`): Append-only audit trail
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is served at `/api/v1/docs` when the server is running.

pub mod handlers;
pub mod models;
