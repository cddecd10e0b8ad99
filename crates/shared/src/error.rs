use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of a draft field, e.g. `"patient_name"`.
pub type FieldKey = &'static str;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("confidence {0} is outside 0..=100")]
pub struct ConfidenceOutOfRange(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    Missing,
    UnsupportedFormat,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("is required"),
            Self::UnsupportedFormat => f.write_str("has an unsupported format"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: FieldKey,
    pub problem: FieldProblem,
}

/// Submit-time validation failure. Reported to the caller, never as a notice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_fields(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

impl ValidationError {
    pub fn missing(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields
            .iter()
            .filter(|f| f.problem == FieldProblem::Missing)
            .map(|f| f.field)
    }

    pub fn problem_for(&self, field: &str) -> Option<FieldProblem> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.problem)
    }
}

fn describe_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} {}", f.field, f.problem))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure of the asynchronous part of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationError {
    #[error("operation timed out after {0} ms")]
    Timeout(u64),
    #[error("operation rejected: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown field '{0}'")]
pub struct UnknownField(pub String);
