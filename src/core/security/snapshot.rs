//! Frozen capture of the byte/text primitives.
//!
//! A [`PrimitiveSnapshot`] copies the function pointers out of an
//! [`AmbientRegistry`] once and calls them directly from then on. Rebinding the
//! registry afterwards has no effect on a snapshot that already exists.
//!
//! The process-wide snapshot is single-assignment: [`capture`] installs it and
//! refuses to run twice, [`installed`] reads it back, and [`trusted`] returns it
//! or fails if nothing was captured. Nothing here captures lazily.

use std::sync::OnceLock;
use thiserror::Error;
use tracing::{debug, warn};

use super::ambient::{AmbientRegistry, Primitive};
use super::codec::{ByteSource, ConstructFn, DecodeFn, EncodeFn, Encoding};

static INSTALLED: OnceLock<PrimitiveSnapshot> = OnceLock::new();

/// Errors raised while capturing primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// A primitive was not bound in the registry at capture time.
    #[error("primitive '{0}' is unavailable; refusing to capture an incomplete snapshot")]
    Unavailable(Primitive),

    /// The process-wide snapshot already exists and cannot be replaced.
    #[error("trusted primitives were already captured for this process")]
    AlreadyCaptured,

    /// [`capture`] has not run yet.
    #[error("trusted primitives have not been captured; call snapshot::capture() at startup")]
    NotCaptured,
}

/// Immutable bundle of directly bound primitives.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveSnapshot {
    decode: DecodeFn,
    encode: EncodeFn,
    construct: ConstructFn,
}

impl PrimitiveSnapshot {
    /// Copies the current bindings out of `registry`.
    pub fn capture_from(registry: &AmbientRegistry) -> Result<Self, SnapshotError> {
        let decode = registry
            .decode()
            .ok_or(SnapshotError::Unavailable(Primitive::DecodeBytesToText))?;
        let encode = registry
            .encode()
            .ok_or(SnapshotError::Unavailable(Primitive::EncodeTextToBytes))?;
        let construct = registry
            .construct()
            .ok_or(SnapshotError::Unavailable(Primitive::ConstructBytesFrom))?;

        Ok(Self {
            decode,
            encode,
            construct,
        })
    }

    pub fn decode_bytes_to_text(&self, bytes: &[u8], encoding: Encoding) -> String {
        (self.decode)(bytes, encoding)
    }

    pub fn encode_text_to_bytes(&self, text: &str, encoding: Encoding) -> Vec<u8> {
        (self.encode)(text, encoding)
    }

    pub fn construct_bytes_from(&self, source: ByteSource<'_>, encoding: Encoding) -> Vec<u8> {
        (self.construct)(source, encoding)
    }
}

/// Captures the process-wide snapshot from the global registry.
///
/// Call this before any less trusted code has run. A second call fails with
/// [`SnapshotError::AlreadyCaptured`] and leaves the installed snapshot intact.
pub fn capture() -> Result<&'static PrimitiveSnapshot, SnapshotError> {
    if INSTALLED.get().is_some() {
        warn!("Rejected attempt to re-capture trusted primitives");
        return Err(SnapshotError::AlreadyCaptured);
    }

    let snapshot = PrimitiveSnapshot::capture_from(AmbientRegistry::global())?;

    let mut fresh = false;
    let installed = INSTALLED.get_or_init(|| {
        fresh = true;
        snapshot
    });

    if !fresh {
        warn!("Rejected attempt to re-capture trusted primitives");
        return Err(SnapshotError::AlreadyCaptured);
    }

    debug!("Trusted primitives captured");
    Ok(installed)
}

/// The process-wide snapshot, if [`capture`] has run.
pub fn installed() -> Option<&'static PrimitiveSnapshot> {
    INSTALLED.get()
}

/// The process-wide snapshot, or [`SnapshotError::NotCaptured`].
///
/// The global registry may already be rebound by the time this runs, so it
/// never falls back to capturing.
pub fn trusted() -> Result<&'static PrimitiveSnapshot, SnapshotError> {
    INSTALLED.get().ok_or_else(|| {
        warn!("Trusted primitives requested before capture");
        SnapshotError::NotCaptured
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appending_decode(bytes: &[u8], encoding: Encoding) -> String {
        let _ = encoding;
        format!("{}/../../etc", String::from_utf8_lossy(bytes))
    }

    #[test]
    fn test_capture_from_platform_registry() {
        let registry = AmbientRegistry::platform();
        let snapshot = PrimitiveSnapshot::capture_from(&registry).unwrap();

        assert_eq!(snapshot.decode_bytes_to_text(b"/srv/data", Encoding::Utf8), "/srv/data");
        assert_eq!(snapshot.encode_text_to_bytes("q1.csv", Encoding::Utf8), b"q1.csv".to_vec());
        assert_eq!(
            snapshot.construct_bytes_from(ByteSource::Text("é"), Encoding::Latin1),
            vec![0xe9]
        );
    }

    #[test]
    fn test_snapshot_ignores_later_rebinding() {
        let registry = AmbientRegistry::platform();
        let snapshot = PrimitiveSnapshot::capture_from(&registry).unwrap();

        registry.replace_decode(appending_decode);
        registry.replace_encode(|_, _| Vec::new());
        registry.replace_construct(|_, _| b"/".to_vec());

        assert_eq!(
            registry.call_decode(b"reports", Encoding::Utf8).as_deref(),
            Some("reports/../../etc")
        );
        assert_eq!(snapshot.decode_bytes_to_text(b"reports", Encoding::Utf8), "reports");
        assert_eq!(snapshot.encode_text_to_bytes("x", Encoding::Utf8), b"x".to_vec());
        assert_eq!(
            snapshot.construct_bytes_from(ByteSource::Text("x"), Encoding::Utf8),
            b"x".to_vec()
        );
    }

    #[test]
    fn test_capture_from_tampered_registry_keeps_tampered_binding() {
        let registry = AmbientRegistry::platform();
        registry.replace_decode(appending_decode);
        let snapshot = PrimitiveSnapshot::capture_from(&registry).unwrap();

        registry.reset();
        assert_eq!(
            snapshot.decode_bytes_to_text(b"a", Encoding::Utf8),
            "a/../../etc"
        );
    }

    #[test]
    fn test_capture_fails_when_primitive_missing() {
        let registry = AmbientRegistry::platform();
        registry.remove(Primitive::EncodeTextToBytes);

        let result = PrimitiveSnapshot::capture_from(&registry);
        assert_eq!(
            result.unwrap_err(),
            SnapshotError::Unavailable(Primitive::EncodeTextToBytes)
        );
    }

    #[test]
    fn test_empty_registry_reports_first_missing_primitive() {
        let result = PrimitiveSnapshot::capture_from(&AmbientRegistry::empty());
        assert!(matches!(
            result,
            Err(SnapshotError::Unavailable(Primitive::DecodeBytesToText))
        ));
    }
}
