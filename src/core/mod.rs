//! Core module containing the confinement machinery and its infrastructure.
//!
//! This module provides the trusted primitive snapshot and path validator,
//! plus configuration, error handling, audit records and the async guard
//! service built around them.

pub mod audit;
pub mod config;
pub mod error;
pub mod security;
pub mod service;

pub use audit::AuditRecord;
pub use config::Config;
pub use error::{Error, Result};
pub use security::{Candidate, ConfinedPath, PathSecurityError, PathValidator};
pub use service::GuardService;
