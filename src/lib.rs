//! Tamper-resistant path confinement.
//!
//! This crate decides whether a caller-supplied path, given as text or raw
//! bytes, resolves inside an administrator-designated base directory. The
//! byte/text primitives it relies on are captured once at startup, so code
//! that later rebinds those primitives cannot change a decision.
//!
//! # Architecture
//!
//! - **core::security**: the ambient primitive registry, the frozen
//!   snapshot captured from it, and the path validator
//! - **core::config**: environment-driven configuration
//! - **core::audit**: serializable records of validation decisions
//! - **core::service**: async wrapper applying a timeout to validation
//!
//! # Example
//!
//! ```rust,no_run
//! use pathguard::core::security::snapshot;
//! use pathguard::PathValidator;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Capture before anything else gets a chance to run.
//!     let primitives = snapshot::capture()?;
//!
//!     let validator = PathValidator::with_snapshot("/srv/data", primitives)?;
//!     let path = validator.validate("reports/q1.csv")?;
//!     println!("{}", path);
//!     Ok(())
//! }
//! ```

pub mod core;

// Re-export commonly used types for convenience
pub use core::{
    AuditRecord, Candidate, Config, ConfinedPath, Error, GuardService, PathSecurityError,
    PathValidator, Result,
};
