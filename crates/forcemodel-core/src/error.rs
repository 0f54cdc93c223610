//! Error types shared across ForceModel crates.

use std::error::Error as StdError;
use std::fmt;

use crate::transport::TransportError;
use crate::wire::{CompositeResponse, ResultEntry};

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug)]
pub enum Error {
    /// A request would exceed an object, depth or root limit.
    ExceedsLimits(LimitError),
    /// A record of the wrong table was offered where a specific one is required.
    TypeMismatch {
        /// Table the caller configured.
        expected: String,
        /// Table of the offending record.
        actual: String,
    },
    /// The remote API accepted the request but rejected one or more records.
    FailedRequest(FailedRequestError),
    /// The transport call itself failed.
    Transport(TransportError),
    /// JSON encoding or decoding failed.
    Serialization(serde_json::Error),
}

impl Error {
    /// Whether this is a capacity error.
    pub fn is_limit(&self) -> bool {
        matches!(self, Error::ExceedsLimits(_))
    }

    pub(crate) fn limit(kind: LimitErrorKind, message: impl Into<String>) -> Self {
        Error::ExceedsLimits(LimitError {
            kind,
            message: message.into(),
        })
    }

    /// Too many objects for one request.
    pub fn too_many_objects(message: impl Into<String>) -> Self {
        Self::limit(LimitErrorKind::TooManyObjects, message)
    }

    /// A tree nests deeper than allowed (or is cyclic).
    pub fn max_depth(message: impl Into<String>) -> Self {
        Self::limit(LimitErrorKind::MaxDepth, message)
    }

    /// Too many roots queued for a single request.
    pub fn too_many_roots(message: impl Into<String>) -> Self {
        Self::limit(LimitErrorKind::TooManyRoots, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ExceedsLimits(err) => write!(f, "{}", err),
            Error::TypeMismatch { expected, actual } => {
                write!(f, "All root objects must be {}, got {}", expected, actual)
            }
            Error::FailedRequest(err) => write!(f, "{}", err),
            Error::Transport(err) => write!(f, "transport error: {}", err),
            Error::Serialization(err) => write!(f, "serialization error: {}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Transport(err) => Some(err),
            Error::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Transport(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err)
    }
}

impl From<FailedRequestError> for Error {
    fn from(err: FailedRequestError) -> Self {
        Error::FailedRequest(err)
    }
}

/// Which limit was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitErrorKind {
    /// A tree, or the sum of trees in a single-request commit, holds too many objects.
    TooManyObjects,
    /// A tree nests deeper than its configured maximum.
    MaxDepth,
    /// More roots were added than fit in a single request.
    TooManyRoots,
}

/// Capacity error with a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitError {
    pub kind: LimitErrorKind,
    pub message: String,
}

impl fmt::Display for LimitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for LimitError {}

/// The remote API rejected records in one or more batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedRequestError {
    responses: Vec<CompositeResponse>,
}

impl FailedRequestError {
    pub fn new(responses: Vec<CompositeResponse>) -> Self {
        Self { responses }
    }

    /// The raw error-bearing responses, one per failed batch.
    pub fn responses(&self) -> &[CompositeResponse] {
        &self.responses
    }

    /// Every result entry of every error-bearing response, flattened.
    pub fn errors(&self) -> Vec<&ResultEntry> {
        self.responses
            .iter()
            .filter(|response| response.has_errors)
            .flat_map(|response| &response.results)
            .collect()
    }
}

impl fmt::Display for FailedRequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Composite request had errors: ")?;
        let messages: Vec<String> = self
            .errors()
            .into_iter()
            .flat_map(|entry| {
                let reference = entry.reference_id.as_deref().unwrap_or("-");
                entry
                    .errors
                    .iter()
                    .map(move |err| format!("{}: {}", reference, err))
            })
            .collect();
        if messages.is_empty() {
            f.write_str("(no details)")
        } else {
            f.write_str(&messages.join("; "))
        }
    }
}

impl StdError for FailedRequestError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ApiError;

    fn api_error(message: &str) -> ApiError {
        ApiError {
            status_code: None,
            message: message.to_string(),
            fields: Vec::new(),
        }
    }

    #[test]
    fn test_limit_error_display() {
        let err = Error::max_depth("Tree with root Root__c(new) exceeds max depth of 5");
        assert!(err.is_limit());
        assert_eq!(
            err.to_string(),
            "Tree with root Root__c(new) exceeds max depth of 5"
        );
        match err {
            Error::ExceedsLimits(limit) => assert_eq!(limit.kind, LimitErrorKind::MaxDepth),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_type_mismatch_display() {
        let err = Error::TypeMismatch {
            expected: "Root__c".to_string(),
            actual: "Leaf__c".to_string(),
        };
        assert_eq!(err.to_string(), "All root objects must be Root__c, got Leaf__c");
    }

    #[test]
    fn test_failed_request_flattens_error_responses() {
        let failed = CompositeResponse::with_errors(vec![
            ResultEntry::failed("ref1", vec![api_error("some error")]),
            ResultEntry::failed("ref2", vec![api_error("other error")]),
        ]);
        let ok = CompositeResponse::success(vec![ResultEntry::created("ref3", "001")]);
        let err = FailedRequestError::new(vec![failed.clone(), ok]);

        assert_eq!(err.errors().len(), 2);
        assert_eq!(err.responses()[0], failed);
        assert_eq!(
            err.to_string(),
            "Composite request had errors: ref1: some error; ref2: other error"
        );
    }

    #[test]
    fn test_failed_request_without_details() {
        let err = FailedRequestError::new(vec![]);
        assert_eq!(err.to_string(), "Composite request had errors: (no details)");
    }
}
