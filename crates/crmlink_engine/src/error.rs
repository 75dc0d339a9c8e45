//! Error types for the sync engine.

use crmlink_protocol::{EntityKind, ProtocolError};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The sync configuration is incomplete or invalid. Fatal to the
    /// triggering call; never queued for retry.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Missing or rejected credential. Raised before any network call
    /// when the token is absent; never retried silently.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The remote API rejected the request.
    #[error("remote API error {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body text, included for user-visible messages.
        body: String,
    },

    /// A create was rejected because the record already exists
    /// remotely. Handled inline by the link-and-retry path.
    #[error("duplicate record exists remotely with id {remote_id}")]
    DuplicateRecord {
        /// Id of the already-existing remote record.
        remote_id: String,
    },

    /// A cross-reference on the pushed record has no entry in the
    /// reference-mapping tables. User-actionable: configure the
    /// mapping, then retry.
    #[error("no {reference} mapping configured for {entity} push")]
    MappingRequired {
        /// Entity being pushed.
        entity: EntityKind,
        /// The unresolved reference (e.g. "pipeline stage").
        reference: String,
    },

    /// Network or timeout failure.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// A response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The host store failed a read or write.
    #[error("host store error: {0}")]
    Host(String),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Returns true if this error can be retried.
    ///
    /// Server-side (5xx) and rate-limit (429) API errors are
    /// retryable; 4xx rejections are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if a failed push with this error belongs in the
    /// retry queue. Configuration, credential and mapping problems
    /// are surfaced to the user instead.
    pub fn is_queueable(&self) -> bool {
        matches!(
            self,
            SyncError::Api { .. }
                | SyncError::Transport { .. }
                | SyncError::DuplicateRecord { .. }
        )
    }
}

impl From<ProtocolError> for SyncError {
    fn from(err: ProtocolError) -> Self {
        SyncError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::transport_retryable("connection reset").is_retryable());
        assert!(!SyncError::Transport {
            message: "invalid certificate".into(),
            retryable: false
        }
        .is_retryable());
        assert!(SyncError::Api {
            status: 503,
            body: "unavailable".into()
        }
        .is_retryable());
        assert!(SyncError::Api {
            status: 429,
            body: "rate limited".into()
        }
        .is_retryable());
        assert!(!SyncError::Api {
            status: 422,
            body: "bad payload".into()
        }
        .is_retryable());
        assert!(!SyncError::Auth("no token".into()).is_retryable());
    }

    #[test]
    fn queueable_errors() {
        assert!(SyncError::Api {
            status: 422,
            body: String::new()
        }
        .is_queueable());
        assert!(SyncError::transport_retryable("timeout").is_queueable());
        assert!(!SyncError::Configuration("no token".into()).is_queueable());
        assert!(!SyncError::MappingRequired {
            entity: EntityKind::Opportunity,
            reference: "pipeline stage".into()
        }
        .is_queueable());
    }

    #[test]
    fn error_display_includes_status_and_body() {
        let err = SyncError::Api {
            status: 404,
            body: "not found".into(),
        };
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("not found"));
    }
}
