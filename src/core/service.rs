//! Guard service - runs validation off the async executor.
//!
//! Canonicalization may block on the filesystem, so each call is moved onto
//! tokio's blocking pool and bounded by the configured timeout. A timed-out
//! call is reported as [`Error::Timeout`]; nothing is retried.
//!
//! The timeout only bounds how long the caller waits. Blocking work cannot be
//! cancelled, so a timed-out validation keeps running on the blocking pool
//! until the filesystem returns, and its result is discarded.

use std::sync::Arc;
use std::time::Duration;
use tracing::{instrument, warn};

use super::error::{Error, Result};
use super::security::{Candidate, ConfinedPath, PathValidator};

/// Async front end for a shared [`PathValidator`].
#[derive(Debug, Clone)]
pub struct GuardService {
    validator: Arc<PathValidator>,
    timeout: Duration,
}

impl GuardService {
    /// Create a new guard service.
    pub fn new(validator: PathValidator, timeout: Duration) -> Self {
        Self {
            validator: Arc::new(validator),
            timeout,
        }
    }

    pub fn validator(&self) -> &PathValidator {
        &self.validator
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Validate a candidate on the blocking pool within the timeout.
    ///
    /// On [`Error::Timeout`] the detached validation still runs to completion
    /// in the background; its result is dropped.
    #[instrument(skip_all)]
    pub async fn validate(&self, candidate: impl Into<Candidate>) -> Result<ConfinedPath> {
        let validator = Arc::clone(&self.validator);
        let candidate = candidate.into();

        run_blocking(self.timeout, move || validator.validate(candidate))
            .await?
            .map_err(Error::from)
    }
}

async fn run_blocking<T, F>(timeout: Duration, work: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(work)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(join_error)) => Err(Error::internal(format!(
            "validation task failed: {}",
            join_error
        ))),
        Err(_) => {
            warn!("Validation exceeded {:?}", timeout);
            Err(Error::Timeout(timeout))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::security::{AmbientRegistry, PrimitiveSnapshot, ViolationKind};
    use tempfile::TempDir;

    fn create_test_service() -> (TempDir, GuardService) {
        let temp_dir = TempDir::new().unwrap();
        let snapshot = Box::leak(Box::new(
            PrimitiveSnapshot::capture_from(&AmbientRegistry::platform()).unwrap(),
        ));
        let validator = PathValidator::with_snapshot(temp_dir.path(), snapshot).unwrap();
        (temp_dir, GuardService::new(validator, Duration::from_secs(5)))
    }

    #[tokio::test]
    async fn test_service_confines_path() {
        let (_temp_dir, service) = create_test_service();
        let path = service.validate("reports/q1.csv").await.unwrap();

        assert_eq!(
            path.as_path(),
            service.validator().base().join("reports").join("q1.csv")
        );
    }

    #[tokio::test]
    async fn test_service_preserves_violation_kind() {
        let (_temp_dir, service) = create_test_service();
        let err = service.validate("../../etc/passwd").await.unwrap_err();

        assert_eq!(
            err.as_security().map(|e| e.kind()),
            Some(ViolationKind::PathTraversal)
        );
    }

    #[tokio::test]
    async fn test_run_blocking_times_out() {
        let result = run_blocking(Duration::from_millis(10), || {
            std::thread::sleep(Duration::from_millis(500));
        })
        .await;

        assert!(matches!(result, Err(Error::Timeout(_))));
    }

    #[tokio::test]
    async fn test_timed_out_work_keeps_running() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);

        let result = run_blocking(Duration::from_millis(10), move || {
            std::thread::sleep(Duration::from_millis(100));
            flag.store(true, Ordering::SeqCst);
        })
        .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_service_byte_candidate_blocking() {
        let (_temp_dir, service) = create_test_service();
        let path = tokio_test::block_on(service.validate(b"a.txt".to_vec())).unwrap();

        assert_eq!(path.as_path(), service.validator().base().join("a.txt"));
    }
}
