//! Caller-supplied path values.

use serde_json::Value;
use std::ffi::OsString;

use super::path_validator::PathSecurityError;

/// An untrusted path, either text or raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    Text(String),
    Bytes(Vec<u8>),
}

impl From<&str> for Candidate {
    fn from(text: &str) -> Self {
        Candidate::Text(text.to_string())
    }
}

impl From<String> for Candidate {
    fn from(text: String) -> Self {
        Candidate::Text(text)
    }
}

impl From<&[u8]> for Candidate {
    fn from(bytes: &[u8]) -> Self {
        Candidate::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Candidate {
    fn from(bytes: Vec<u8>) -> Self {
        Candidate::Bytes(bytes)
    }
}

impl From<OsString> for Candidate {
    #[cfg(unix)]
    fn from(value: OsString) -> Self {
        use std::os::unix::ffi::OsStringExt;
        Candidate::Bytes(value.into_vec())
    }

    #[cfg(not(unix))]
    fn from(value: OsString) -> Self {
        match value.into_string() {
            Ok(text) => Candidate::Text(text),
            Err(raw) => Candidate::Text(raw.to_string_lossy().into_owned()),
        }
    }
}

/// Converts a dynamically typed value, as received from an evaluation
/// request, into a candidate. Strings become text and arrays of integers in
/// `0..=255` become bytes; anything else is rejected.
impl TryFrom<&Value> for Candidate {
    type Error = PathSecurityError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(text) => Ok(Candidate::Text(text.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|n| u8::try_from(n).ok())
                        .ok_or_else(|| {
                            PathSecurityError::invalid_input_type("array element outside 0..=255")
                        })
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Candidate::Bytes),
            Value::Null => Err(PathSecurityError::invalid_input_type("null")),
            Value::Bool(_) => Err(PathSecurityError::invalid_input_type("boolean")),
            Value::Number(_) => Err(PathSecurityError::invalid_input_type("number")),
            Value::Object(_) => Err(PathSecurityError::invalid_input_type("object")),
        }
    }
}
