//! The seam between tree building and the remote API.
//!
//! A `Transport` owns authentication, retries and timeouts. Callers inject it
//! explicitly; there is no process-wide client.

use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

use crate::wire::{CompositeResponse, TreeRequest};

/// Sends sObject Tree requests.
pub trait Transport {
    /// POST `payload` to `endpoint` and return the parsed response body.
    ///
    /// An HTTP error status should be reported as a `Rejected` error,
    /// carrying the parsed body when there is one.
    fn send(&self, endpoint: &str, payload: &TreeRequest)
    -> Result<CompositeResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(
        &self,
        endpoint: &str,
        payload: &TreeRequest,
    ) -> Result<CompositeResponse, TransportError> {
        (**self).send(endpoint, payload)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(
        &self,
        endpoint: &str,
        payload: &TreeRequest,
    ) -> Result<CompositeResponse, TransportError> {
        (**self).send(endpoint, payload)
    }
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(
        &self,
        endpoint: &str,
        payload: &TreeRequest,
    ) -> Result<CompositeResponse, TransportError> {
        (**self).send(endpoint, payload)
    }
}

/// Endpoint for creating trees rooted at `table_name`.
#[must_use]
pub fn tree_endpoint(table_name: &str) -> String {
    format!("composite/tree/{}", table_name)
}

/// Kinds of transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Could not reach the server.
    Connect,
    /// The call timed out.
    Timeout,
    /// Authentication failed or expired.
    Authentication,
    /// The server answered with an HTTP error status.
    Rejected,
    /// Request or response body could not be (de)serialized.
    Serialization,
    /// Anything else.
    Other,
}

impl TransportErrorKind {
    const fn as_str(self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Authentication => "authentication",
            TransportErrorKind::Rejected => "rejected",
            TransportErrorKind::Serialization => "serialization",
            TransportErrorKind::Other => "other",
        }
    }
}

/// A failed transport call.
#[derive(Debug)]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
    /// Parsed error body, for `Rejected` errors that had one.
    pub response: Option<CompositeResponse>,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
            source: None,
        }
    }

    /// The server rejected the request; `response` is its body if parseable.
    pub fn rejected(message: impl Into<String>, response: Option<CompositeResponse>) -> Self {
        Self {
            response,
            ..Self::new(TransportErrorKind::Rejected, message)
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the server answered (with an error status) rather than the call failing.
    pub fn is_rejection(&self) -> bool {
        self.kind == TransportErrorKind::Rejected
    }

    /// Turn a rejection into an error-bearing response.
    ///
    /// Returns `Err(self)` for every other kind of failure.
    pub fn into_response(self) -> Result<CompositeResponse, Self> {
        if !self.is_rejection() {
            return Err(self);
        }
        let message = format!("request rejected without body: {}", self.message);
        Ok(self
            .response
            .unwrap_or_else(|| CompositeResponse::rejected(message)))
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind.as_str(), self.message)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}
