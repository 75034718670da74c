//! Error types for the Cirrus Cloud provider

use thiserror::Error;

/// Result type alias using the provider Error
pub type Result<T> = std::result::Result<T, Error>;

/// Provider error taxonomy.
///
/// Every API failure is classified into one of these variants so that
/// the CRUD orchestration can decide between retry, state removal, and
/// fatal surfacing without string matching.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or mutually exclusive configuration, detected before any
    /// network call is made.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The remote object does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: String, id: String },

    /// A concurrent operation on the same parent object rejected the
    /// request. Transient: the submission may be retried.
    #[error("conflicting operation: {0}")]
    Conflict(String),

    /// A long-running operation reached a terminal failure state.
    #[error("operation {id} failed: {message}")]
    OperationFailed { id: String, message: String },

    /// Waiting on a long-running operation exceeded the local deadline.
    /// The remote operation keeps running out-of-band.
    #[error("timed out after {seconds}s waiting for operation")]
    Timeout { seconds: u64 },

    /// The API endpoint could not be reached.
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),

    /// Any other API error (permission, quota, malformed request).
    /// Surfaced verbatim, never retried.
    #[error("API error: {0}")]
    Api(tonic::Status),

    /// Internal invariant violation. Distinguishable from user-facing
    /// validation errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// True for the error class that warrants a bounded submission retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::NotFound => Error::NotFound {
                kind: "resource".to_string(),
                id: status.message().to_string(),
            },
            tonic::Code::FailedPrecondition | tonic::Code::Aborted => {
                Error::Conflict(status.message().to_string())
            }
            tonic::Code::InvalidArgument => Error::InvalidConfig(status.message().to_string()),
            tonic::Code::DeadlineExceeded => Error::Timeout { seconds: 0 },
            tonic::Code::Unavailable => Error::Unavailable(status.message().to_string()),
            _ => Error::Api(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        let e = Error::from(tonic::Status::not_found("user alice not found"));
        assert!(e.is_not_found());

        let e = Error::from(tonic::Status::failed_precondition(
            "operation in progress on cluster",
        ));
        assert!(e.is_conflict());

        let e = Error::from(tonic::Status::permission_denied("nope"));
        assert!(matches!(e, Error::Api(_)));
        assert!(!e.is_conflict());
    }

    #[test]
    fn conflict_is_not_fatal_class() {
        let e = Error::from(tonic::Status::aborted("concurrent update"));
        assert!(e.is_conflict());
        assert!(!e.is_not_found());
    }
}
