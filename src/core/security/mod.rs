// Security module for tamper-resistant path confinement
//
// This module captures the byte/text primitives once at startup and uses
// only that capture to decide whether a caller-supplied path stays inside a
// configured base directory.

pub mod ambient;
pub mod candidate;
pub mod codec;
pub mod path_validator;
pub mod resolve;
pub mod snapshot;

pub use ambient::{AmbientRegistry, Primitive};
pub use candidate::Candidate;
pub use codec::{ByteSource, Encoding};
pub use path_validator::{ConfinedPath, PathSecurityError, PathValidator, ViolationKind};
pub use snapshot::{PrimitiveSnapshot, SnapshotError};
