//! Shared error taxonomy for storage, filesystem, and transport host services.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable failure categories surfaced by every host service strategy.
///
/// User cancellation of a picker is deliberately absent: pickers resolve to `Ok(None)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostErrorKind {
    /// A file, directory, record, or object store does not exist.
    NotFound,
    /// The backing store was used before setup or the request could not be routed to it.
    NotInitialized,
    /// The active strategy does not support the requested operation.
    Unsupported,
    /// A non-success response or an unavailable channel between adapter and backing service.
    Transport,
    /// The backing store rejected an otherwise well-formed operation.
    Backend,
}

impl HostErrorKind {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not-found",
            Self::NotInitialized => "not-initialized",
            Self::Unsupported => "unsupported",
            Self::Transport => "transport",
            Self::Backend => "backend",
        }
    }
}

/// Typed failure returned by host service operations.
///
/// The display form is the bare message so errors forwarded across the IPC bridge or an HTTP
/// response read the same on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct HostError {
    /// Failure category.
    pub kind: HostErrorKind,
    /// Human-readable message.
    pub message: String,
}

/// Convenience result alias for host service operations.
pub type HostResult<T> = Result<T, HostError>;

impl HostError {
    /// Creates an error with an explicit category.
    pub fn new(kind: HostErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Missing file, directory, record, or store.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::NotFound, message)
    }

    /// Operation issued before the backing store was prepared.
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::NotInitialized, message)
    }

    /// Operation the active strategy cannot perform.
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::Unsupported, message)
    }

    /// Failure between the adapter and its backing service.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::Transport, message)
    }

    /// Backing store rejection.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::Backend, message)
    }

    /// Returns the failure category.
    pub const fn kind(&self) -> HostErrorKind {
        self.kind
    }

    /// Returns `true` when this is a [`HostErrorKind::NotFound`] failure.
    pub fn is_not_found(&self) -> bool {
        self.kind == HostErrorKind::NotFound
    }
}

impl From<serde_json::Error> for HostError {
    fn from(err: serde_json::Error) -> Self {
        Self::backend(format!("invalid payload: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_displays_bare_message() {
        let err = HostError::not_found("File not found: /a.txt");
        assert_eq!(err.to_string(), "File not found: /a.txt");
        assert!(err.is_not_found());
        assert_eq!(err.kind().as_str(), "not-found");
    }

    #[test]
    fn host_error_survives_json_round_trip_across_bridge() {
        let err = HostError::unsupported("Delete not supported");
        let value = serde_json::to_value(&err).expect("serialize");
        assert_eq!(value["kind"], "unsupported");
        let back: HostError = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, err);
    }
}
