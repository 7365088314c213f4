//! Configuration management for pathguard.
//!
//! Values come from environment variables prefixed with `PATHGUARD_`, with a
//! `.env` file loaded first if present. Unparseable values keep their
//! defaults and log a warning.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::security::Encoding;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path confinement settings.
    pub guard: GuardConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Audit output configuration.
    pub audit: AuditConfig,
}

/// Configuration for the path validator and guard service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Directory every validated path must stay inside.
    pub base_dir: Option<PathBuf>,

    /// Encoding used to decode byte candidates.
    pub encoding: Encoding,

    /// Upper bound on a single validation, in milliseconds.
    pub timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Audit output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Emit one JSON record per validation on stdout.
    pub enabled: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            encoding: Encoding::Utf8,
            timeout_ms: 5_000,
        }
    }
}

impl GuardConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            with_timestamps: true,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Recognized variables: `PATHGUARD_BASE_DIR`, `PATHGUARD_ENCODING`,
    /// `PATHGUARD_TIMEOUT_MS`, `PATHGUARD_LOG_LEVEL`,
    /// `PATHGUARD_LOG_TIMESTAMPS` and `PATHGUARD_AUDIT`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(base_dir) = std::env::var("PATHGUARD_BASE_DIR") {
            config.guard.base_dir = Some(PathBuf::from(base_dir));
            info!("Base directory set to {:?}", config.guard.base_dir);
        } else {
            warn!("PATHGUARD_BASE_DIR not set - no base directory configured");
        }

        if let Ok(encoding) = std::env::var("PATHGUARD_ENCODING") {
            match encoding.parse() {
                Ok(parsed) => config.guard.encoding = parsed,
                Err(e) => warn!("Ignoring PATHGUARD_ENCODING: {}", e),
            }
        }

        if let Ok(timeout) = std::env::var("PATHGUARD_TIMEOUT_MS") {
            match timeout.parse() {
                Ok(ms) => config.guard.timeout_ms = ms,
                Err(e) => warn!("Ignoring PATHGUARD_TIMEOUT_MS '{}': {}", timeout, e),
            }
        }

        if let Ok(level) = std::env::var("PATHGUARD_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(with_timestamps) = std::env::var("PATHGUARD_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = with_timestamps.parse().unwrap_or(true);
        }

        if let Ok(audit) = std::env::var("PATHGUARD_AUDIT") {
            config.audit.enabled = audit.parse().unwrap_or(true);
        }

        config
    }
}
