//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, CohortId, etc.)
//! - Permission and authorization types
//! - Resource and operation enums for access control
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety,
//! except the append-only ledgers (credit transactions, audit log), which use
//! sequential `i64` ids:
//!
//! - [`UserId`]: User account identifier
//! - [`CohortId`]: Group-program identifier
//! - [`BootcampId`]: Bootcamp identifier
//! - [`CheckInId`]: Check-in record identifier
//! - [`TransactionId`]: Credit-ledger row identifier
//! - [`AuditEntryId`]: Audit-log row identifier
//!
//! # Permission System
//!
//! The permission system is based on three core types:
//!
//! - [`Resource`]: What entity type is being accessed (Users, Cohorts, ...)
//! - [`Operation`]: What action is being performed (Read, Create, Update, Delete)
//! - [`Permission`]: Authorization requirement combining resource and operation
//!
//! Operations come in two flavors:
//! - **All**: Unrestricted access to all entities (e.g., `ReadAll`, `DeleteAll`)
//! - **Own**: Restricted to the caller's own entities (e.g., `ReadOwn`, `UpdateOwn`)
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type CohortId = Uuid;
pub type BootcampId = Uuid;
pub type CheckInId = Uuid;
pub type TransactionId = i64;
pub type AuditEntryId = i64;

/// Reserved actor for seeded data and automated writes (initial credit
/// grants above all). Inserted by the first migration, protected from
/// modification and deletion.
pub const SYSTEM_USER_ID: UserId = Uuid::nil();

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
// *-All means unrestricted access, *-Own means restricted to own resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Cohorts,
    CheckIns,
    Credits,
    Bootcamps,
    Settings,
    AuditLog,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll | Operation::CreateOwn => write!(f, "Create"),
            Operation::ReadAll | Operation::ReadOwn => write!(f, "Read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "Update"),
            Operation::DeleteAll | Operation::DeleteOwn => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => write!(f, "users"),
            Resource::Cohorts => write!(f, "cohorts"),
            Resource::CheckIns => write!(f, "check-ins"),
            Resource::Credits => write!(f, "credits"),
            Resource::Bootcamps => write!(f, "bootcamps"),
            Resource::Settings => write!(f, "settings"),
            Resource::AuditLog => write!(f, "audit log"),
        }
    }
}
