//! Turns operation failures into the text shown in error notices.

use shared::error::OperationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Auth,
    Transport,
    Timeout,
    Validation,
    Unknown,
}

pub fn classify(err: &OperationError) -> FailureCategory {
    match err {
        OperationError::Timeout(_) => FailureCategory::Timeout,
        OperationError::Transport(_) => FailureCategory::Transport,
        OperationError::Rejected(message) => {
            let lower = message.to_ascii_lowercase();
            if lower.contains("401")
                || lower.contains("403")
                || lower.contains("unauthorized")
                || lower.contains("forbidden")
                || lower.contains("session expired")
                || lower.contains("invalid credential")
            {
                FailureCategory::Auth
            } else if lower.contains("invalid")
                || lower.contains("missing")
                || lower.contains("malformed")
            {
                FailureCategory::Validation
            } else if lower.contains("connection")
                || lower.contains("network")
                || lower.contains("unavailable")
            {
                FailureCategory::Transport
            } else {
                FailureCategory::Unknown
            }
        }
    }
}

pub fn describe(err: &OperationError) -> String {
    match classify(err) {
        FailureCategory::Auth => {
            "Your credentials were not accepted; check them and sign in again.".to_string()
        }
        FailureCategory::Transport => {
            "Server unreachable; check your network connection and retry.".to_string()
        }
        FailureCategory::Timeout => {
            "The request took too long to complete; your input was kept, please retry."
                .to_string()
        }
        FailureCategory::Validation => {
            format!("Some details were not accepted: {err}")
        }
        FailureCategory::Unknown => format!("Something went wrong: {err}"),
    }
}
