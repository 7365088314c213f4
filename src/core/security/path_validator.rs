use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::io;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

use super::candidate::Candidate;
use super::codec::{ByteSource, Encoding};
use super::resolve::soft_canonicalize;
use super::snapshot::{self, PrimitiveSnapshot, SnapshotError};

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Candidate is not a text or byte path: {found}")]
    InvalidInputType { found: String },

    #[error("Base directory '{path}' is unusable: {reason}")]
    InvalidBaseDirectory { path: PathBuf, reason: String },

    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    PathTraversal { path: String, root: String },

    #[error("Path '{resolved}' changed to '{round_trip}' on re-verification; primitives may have been tampered with")]
    IntegrityViolation { resolved: String, round_trip: String },

    #[error("Cannot canonicalize path '{path}': {error}")]
    Unresolvable { path: PathBuf, error: io::Error },

    #[error("Trusted primitives unavailable: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl PathSecurityError {
    pub fn invalid_input_type(found: impl Into<String>) -> Self {
        Self::InvalidInputType {
            found: found.into(),
        }
    }

    fn invalid_base(path: &Path, reason: impl Into<String>) -> Self {
        Self::InvalidBaseDirectory {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// The failure category, for audit consumers.
    pub fn kind(&self) -> ViolationKind {
        match self {
            Self::InvalidInputType { .. } => ViolationKind::InvalidInputType,
            Self::InvalidBaseDirectory { .. } => ViolationKind::InvalidBaseDirectory,
            Self::PathTraversal { .. } => ViolationKind::PathTraversal,
            Self::IntegrityViolation { .. } => ViolationKind::IntegrityViolation,
            Self::Unresolvable { .. } => ViolationKind::Unresolvable,
            Self::Snapshot(_) => ViolationKind::SnapshotUnavailable,
        }
    }
}

/// Copyable category of a [`PathSecurityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    InvalidInputType,
    InvalidBaseDirectory,
    PathTraversal,
    IntegrityViolation,
    Unresolvable,
    SnapshotUnavailable,
}

/// A canonical path confirmed to lie inside a validator's base directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConfinedPath(String);

impl ConfinedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        PathBuf::from(self.0)
    }
}

impl fmt::Display for ConfinedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for ConfinedPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

/// Confines caller-supplied paths to a fixed base directory.
///
/// Every byte/text conversion goes through the [`PrimitiveSnapshot`] bound at
/// construction, so rebinding the ambient primitives later cannot change a
/// decision. A validator is immutable and can be shared across threads.
///
/// # Examples
///
/// ```rust,no_run
/// use pathguard::core::security::PathValidator;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let validator = PathValidator::new("/srv/data")?;
/// let path = validator.validate("reports/q1.csv")?;
/// assert_eq!(path.as_str(), "/srv/data/reports/q1.csv");
/// assert!(validator.validate("reports/../../etc/passwd").is_err());
/// # Ok(()) }
/// ```
#[derive(Debug, Clone)]
pub struct PathValidator {
    base: PathBuf,
    base_text: String,
    encoding: Encoding,
    snapshot: &'static PrimitiveSnapshot,
}

impl PathValidator {
    /// Creates a validator bound to the process-wide trusted snapshot.
    pub fn new(base: impl AsRef<Path>) -> Result<Self, PathSecurityError> {
        Self::with_snapshot(base, snapshot::trusted()?)
    }

    /// Creates a validator bound to an explicitly supplied snapshot.
    ///
    /// The base is canonicalized once here and never recomputed.
    pub fn with_snapshot(
        base: impl AsRef<Path>,
        snapshot: &'static PrimitiveSnapshot,
    ) -> Result<Self, PathSecurityError> {
        let requested = base.as_ref();

        let canonical = requested
            .canonicalize()
            .map_err(|e| PathSecurityError::invalid_base(requested, e.to_string()))?;

        if !canonical.is_absolute() {
            return Err(PathSecurityError::invalid_base(requested, "not an absolute path"));
        }
        if !canonical.is_dir() {
            return Err(PathSecurityError::invalid_base(requested, "not a directory"));
        }

        let base_text = os_path_text(snapshot, &canonical)
            .filter(|text| Path::new(text) == canonical)
            .ok_or_else(|| PathSecurityError::invalid_base(requested, "not representable as text"))?;

        info!("Path validator ready: base directory {}", base_text);

        Ok(Self {
            base: canonical,
            base_text,
            encoding: Encoding::default(),
            snapshot,
        })
    }

    /// Sets the encoding used to decode byte candidates and for the
    /// re-verification round trip.
    ///
    /// Fails with [`PathSecurityError::InvalidBaseDirectory`] if the base
    /// itself does not survive a round trip through `encoding`.
    pub fn with_encoding(mut self, encoding: Encoding) -> Result<Self, PathSecurityError> {
        if self.round_trip(&self.base_text, encoding) != self.base_text {
            return Err(PathSecurityError::invalid_base(
                &self.base,
                format!("not representable in {}", encoding),
            ));
        }
        self.encoding = encoding;
        Ok(self)
    }

    /// The canonical base directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The snapshot this validator converts through.
    pub fn snapshot(&self) -> &'static PrimitiveSnapshot {
        self.snapshot
    }

    /// Validates a candidate and returns its canonical, confined form.
    ///
    /// 1. Byte candidates are decoded with the snapshot.
    /// 2. The text is joined onto the base and soft-canonicalized.
    /// 3. The result must equal the base or extend it past a separator.
    /// 4. The result is rebuilt into bytes and decoded again with the snapshot.
    /// 5. The round trip must reproduce the result exactly and stay confined.
    ///
    /// Step 3 failures are [`PathSecurityError::PathTraversal`]; step 5
    /// failures are [`PathSecurityError::IntegrityViolation`].
    #[instrument(skip_all, fields(base = %self.base_text))]
    pub fn validate(
        &self,
        candidate: impl Into<Candidate>,
    ) -> Result<ConfinedPath, PathSecurityError> {
        let text = match candidate.into() {
            Candidate::Text(text) => text,
            Candidate::Bytes(bytes) => self.snapshot.decode_bytes_to_text(&bytes, self.encoding),
        };

        if text.contains('\0') {
            warn!("Rejected candidate containing NUL byte");
            return Err(PathSecurityError::invalid_input_type("text containing NUL"));
        }

        let joined = self.base.join(&text);
        let resolved_path =
            soft_canonicalize(&joined).map_err(|e| PathSecurityError::Unresolvable {
                path: joined.clone(),
                error: e,
            })?;
        let resolved = os_path_text(self.snapshot, &resolved_path).ok_or_else(|| {
            PathSecurityError::Unresolvable {
                path: resolved_path.clone(),
                error: io::Error::new(io::ErrorKind::InvalidData, "path is not valid Unicode"),
            }
        })?;

        if !is_within_base(&resolved, &self.base_text) {
            warn!("Path traversal rejected: '{}' resolved to '{}'", text, resolved);
            return Err(PathSecurityError::PathTraversal {
                path: resolved,
                root: self.base_text.clone(),
            });
        }

        let round_trip = self.round_trip(&resolved, self.encoding);

        if round_trip != resolved || !is_within_base(&round_trip, &self.base_text) {
            error!(
                "Integrity violation: '{}' re-verified as '{}'",
                resolved, round_trip
            );
            return Err(PathSecurityError::IntegrityViolation {
                resolved,
                round_trip,
            });
        }

        debug!("Path confined: {}", round_trip);
        Ok(ConfinedPath(round_trip))
    }

    /// Rebuilds `text` into bytes and decodes it again, using only the snapshot.
    fn round_trip(&self, text: &str, encoding: Encoding) -> String {
        let bytes = self
            .snapshot
            .construct_bytes_from(ByteSource::Text(text), encoding);
        self.snapshot.decode_bytes_to_text(&bytes, encoding)
    }

    /// Validates a dynamically typed value, rejecting anything that is not a
    /// string or a byte array.
    pub fn validate_value(&self, value: &Value) -> Result<ConfinedPath, PathSecurityError> {
        let candidate = Candidate::try_from(value).inspect_err(|e| {
            warn!("Rejected candidate: {}", e);
        })?;
        self.validate(candidate)
    }
}

/// Checks if `path` equals `base` or continues it past a separator.
///
/// A bare prefix test would accept `/allowed-evil` for `/allowed`.
pub fn is_within_base(path: &str, base: &str) -> bool {
    if path == base {
        return true;
    }
    let Some(rest) = path.strip_prefix(base) else {
        return false;
    };
    base.ends_with(is_separator) || rest.starts_with(is_separator)
}

fn is_separator(c: char) -> bool {
    c == MAIN_SEPARATOR || c == '/'
}

/// Converts an OS path to text through the snapshot.
///
/// Returns `None` where the platform cannot expose the path as bytes.
fn os_path_text(snapshot: &PrimitiveSnapshot, path: &Path) -> Option<String> {
    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;
        Some(snapshot.decode_bytes_to_text(path.as_os_str().as_bytes(), Encoding::Utf8))
    }

    #[cfg(not(unix))]
    {
        path.to_str()
            .map(|text| snapshot.decode_bytes_to_text(text.as_bytes(), Encoding::Utf8))
    }
}
