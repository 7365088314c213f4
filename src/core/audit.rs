//! Audit records for validation decisions.
//!
//! Each record names the candidate exactly as received and the outcome. The
//! failure kind is kept, so a consumer can separate malicious input
//! (`path_traversal`) from tampered primitives (`integrity_violation`). Byte
//! candidates are stored base64-encoded because they need not be UTF-8.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::Error;
use super::security::{Candidate, ConfinedPath, ViolationKind};

/// The candidate as it was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateRecord {
    Text(String),
    BytesBase64(String),
}

impl From<&Candidate> for CandidateRecord {
    fn from(candidate: &Candidate) -> Self {
        match candidate {
            Candidate::Text(text) => CandidateRecord::Text(text.clone()),
            Candidate::Bytes(bytes) => CandidateRecord::BytesBase64(STANDARD.encode(bytes)),
        }
    }
}

/// What the validator decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Confined {
        path: ConfinedPath,
    },
    Rejected {
        /// Absent for failures outside the validator, such as timeouts.
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<ViolationKind>,
        message: String,
    },
}

/// One validation decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub candidate: CandidateRecord,
    pub outcome: Outcome,
}

impl AuditRecord {
    pub fn new(candidate: &Candidate, result: &Result<ConfinedPath, Error>) -> Self {
        let outcome = match result {
            Ok(path) => Outcome::Confined { path: path.clone() },
            Err(e) => Outcome::Rejected {
                kind: e.as_security().map(|s| s.kind()),
                message: e.to_string(),
            },
        };

        Self {
            timestamp: Utc::now(),
            candidate: candidate.into(),
            outcome,
        }
    }

    pub fn is_confined(&self) -> bool {
        matches!(self.outcome, Outcome::Confined { .. })
    }

    /// Serialize as a single JSON line.
    pub fn to_json_line(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }
}
