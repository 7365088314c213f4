//! pathguard entry point
//!
//! Captures the trusted primitives before anything else runs, then loads
//! configuration, initializes logging and validates each command-line
//! argument against the configured base directory. One JSON audit record per
//! argument is written to stdout; logs go to stderr.

use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

use pathguard::core::config::LoggingConfig;
use pathguard::core::security::snapshot;
use pathguard::{AuditRecord, Candidate, Config, GuardService, PathValidator};

fn main() -> Result<ExitCode> {
    // No dotenv, subscriber or runtime code may run before this.
    let primitives = snapshot::capture().context("failed to capture trusted primitives")?;

    let config = Config::from_env();
    init_logging(&config.logging);

    info!("Starting pathguard v{}", env!("CARGO_PKG_VERSION"));

    let base_dir = config
        .guard
        .base_dir
        .clone()
        .context("PATHGUARD_BASE_DIR must name the directory to confine paths to")?;

    let validator = PathValidator::with_snapshot(&base_dir, primitives)?
        .with_encoding(config.guard.encoding)?;
    let service = GuardService::new(validator, config.guard.timeout());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let candidates: Vec<Candidate> = std::env::args_os().skip(1).map(Candidate::from).collect();
    let all_confined = runtime.block_on(run(&service, candidates, config.audit.enabled))?;

    info!("pathguard shutting down");

    Ok(if all_confined {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn run(service: &GuardService, candidates: Vec<Candidate>, audit: bool) -> Result<bool> {
    let mut all_confined = true;

    for candidate in candidates {
        let result = service.validate(candidate.clone()).await;
        if let Err(e) = &result {
            error!("Rejected candidate: {}", e);
        }

        let record = AuditRecord::new(&candidate, &result);
        all_confined &= record.is_confined();

        if audit {
            println!("{}", record.to_json_line()?);
        }
    }

    Ok(all_confined)
}

/// Initialize the logging subsystem.
///
/// Configures tracing with the specified log level and format.
fn init_logging(logging: &LoggingConfig) {
    let level = match logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    if logging.with_timestamps {
        builder.init();
    } else {
        builder.without_time().init();
    }
}
