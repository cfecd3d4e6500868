//! Error types for table administration.

use thiserror::Error;

use crate::dynamodb::description::TableStatus;
use crate::dynamodb::retry::is_transient;

/// Result type alias for the dynamodb module.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a [`Transport`](crate::dynamodb::Transport).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The service answered with an error status.
    #[error("service returned {status} ({code}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// The request never produced a service response.
    #[error("request dispatch failed: {0}")]
    Dispatch(String),
}

impl TransportError {
    /// HTTP status of a service error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Service { status, .. } => Some(*status),
            TransportError::Dispatch(_) => None,
        }
    }

    /// Service error code (e.g. `ThrottlingException`), if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            TransportError::Service { code, .. } if !code.is_empty() => Some(code),
            _ => None,
        }
    }
}

/// Errors that can occur during table administration.
#[derive(Error, Debug)]
pub enum Error {
    /// A key schema entry references a missing or untyped attribute definition.
    #[error("inconsistent table description: {0}")]
    SchemaInconsistency(String),

    /// The response lacks an expected field or has the wrong shape.
    #[error("unexpected response ({reason}): {payload}")]
    MalformedResponse { reason: String, payload: String },

    /// A retryable failure that was still failing when the retry policy gave up.
    #[error("transient service failure: {0}")]
    TransientServiceFailure(TransportError),

    /// Any other transport or service failure.
    #[error("service failure: {0}")]
    PermanentServiceFailure(TransportError),

    /// The table did not reach the expected status while being polled.
    #[error("table '{table_name}' still {last}, expected {expected}")]
    StatusTimeout {
        table_name: String,
        expected: TableStatus,
        last: TableStatus,
    },

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>, payload: &[u8]) -> Self {
        Error::MalformedResponse {
            reason: reason.into(),
            payload: String::from_utf8_lossy(payload).into_owned(),
        }
    }

    /// The underlying transport error, for service failures.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Error::TransientServiceFailure(err) | Error::PermanentServiceFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        if is_transient(&err) {
            Error::TransientServiceFailure(err)
        } else {
            Error::PermanentServiceFailure(err)
        }
    }
}
