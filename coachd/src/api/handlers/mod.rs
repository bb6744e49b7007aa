//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`audit`]: Audit log listing for administrators
//! - [`bootcamps`]: Bootcamp CRUD and credit-charged registrations
//! - [`cadence`]: Check-in frequency overrides and effective-frequency reads
//! - [`check_ins`]: Check-in submission, history, and due status
//! - [`cohorts`]: Cohort CRUD and membership management
//! - [`credits`]: Credit allocation, deduction, history, and summaries
//! - [`settings`]: System settings administration
//! - [`users`]: User CRUD operations and profile management
//!
//! # Authentication
//!
//! All handlers authenticate via the trusted proxy header. The
//! [`crate::auth`] module provides the extractors handlers use to access
//! the current user and to require role-based permissions.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and JSON error responses.

pub mod audit;
pub mod bootcamps;
pub mod cadence;
pub mod check_ins;
pub mod cohorts;
pub mod credits;
pub mod settings;
pub mod users;
