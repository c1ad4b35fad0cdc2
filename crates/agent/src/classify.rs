//! Failure taxonomy for orchestration runs

use std::fmt;
use thiserror::Error;

/// User-facing failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or rejected model-backend credential
    AuthFailed,
    /// Quota, billing, or rate-limit signal from the backend
    RateLimited,
    /// Any other backend failure, including transport errors
    UpstreamError,
    /// The backend produced no usable text
    EmptyResponse,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::AuthFailed => "auth failed",
            ErrorKind::RateLimited => "rate limited",
            ErrorKind::UpstreamError => "upstream error",
            ErrorKind::EmptyResponse => "empty response",
        };
        write!(f, "{}", name)
    }
}

/// A failed orchestration run
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct RunError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RunError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build from raw backend error text, picking the kind by triage
    pub fn classified(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            kind: classify(&message),
            message,
        }
    }
}

/// Triage unstructured backend error text into a category.
///
/// Best-effort substring matching: the backend's error strings carry no
/// structure, so this may misclassify. It is not a security boundary.
pub fn classify(error_text: &str) -> ErrorKind {
    let lower = error_text.to_lowercase();

    if ["rate limit", "quota", "billing"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        return ErrorKind::RateLimited;
    }

    if ["authentication", "invalid"]
        .iter()
        .any(|needle| lower.contains(needle))
    {
        return ErrorKind::AuthFailed;
    }

    ErrorKind::UpstreamError
}
