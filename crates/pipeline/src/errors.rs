//! Error types for the endpoint pipeline.
//!
//! [`ApiError`] is the structured, user-facing error that ends up in the
//! `errors` array of a response envelope. [`EndpointError`] is what handlers,
//! token resolvers, and serializers return when they fail; the pipeline turns
//! it into envelope entries with a pure `match` instead of inspecting runtime
//! types.
//!
//! [`SinkError`] covers failures of the host transport handle itself. Those
//! never reach the envelope; the pipeline logs them and moves on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Domain errors
// ---------------------------------------------------------------------------

/// An intentional, user-facing domain error.
///
/// `id` is a stable machine-readable dot path (e.g. `"user.password"`) and
/// `message` is the human-readable text. Both are forwarded verbatim into the
/// response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{id}: {message}")]
pub struct ApiError {
    /// Dot-delimited identifier of the failing field or concept.
    pub id: String,
    /// Human-readable description.
    pub message: String,
}

impl ApiError {
    /// Creates a new [`ApiError`].
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline-stage failures
// ---------------------------------------------------------------------------

/// Failure of a pipeline stage that produces an error envelope.
///
/// The two variants are the whole classification: a [`Domain`] error is
/// forwarded as-is, an [`Unexpected`] error is degraded to a single generic
/// entry (see [`crate::PipelineOptions::unexpected_error_id`]).
///
/// [`Domain`]: EndpointError::Domain
/// [`Unexpected`]: EndpointError::Unexpected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// Intentionally raised by business logic.
    #[error(transparent)]
    Domain(ApiError),

    /// Anything else: storage failures, serialization failures, bugs.
    #[error("{message}")]
    Unexpected {
        /// Description of the failure.
        message: String,
    },
}

impl EndpointError {
    /// Shorthand for [`EndpointError::Domain`].
    pub fn domain(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Domain(ApiError::new(id, message))
    }

    /// Wraps any displayable failure as [`EndpointError::Unexpected`].
    ///
    /// Usable directly with `map_err`: `store.load().map_err(EndpointError::unexpected)?`.
    pub fn unexpected(error: impl std::fmt::Display) -> Self {
        Self::Unexpected {
            message: error.to_string(),
        }
    }
}

impl From<ApiError> for EndpointError {
    fn from(error: ApiError) -> Self {
        Self::Domain(error)
    }
}

impl From<serde_json::Error> for EndpointError {
    fn from(error: serde_json::Error) -> Self {
        Self::unexpected(error)
    }
}

// ---------------------------------------------------------------------------
// Transport sink failures
// ---------------------------------------------------------------------------

/// Failure writing to the host's response handle.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The host side of the handle is gone (connection aborted, receiver dropped).
    #[error("Response handle closed before the response was written")]
    Closed,

    /// The envelope could not be encoded as JSON.
    #[error("Envelope serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------

/// Returned by `Method::from_str` for verbs outside `{DELETE, GET, POST, PUT}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported method '{value}'")]
pub struct MethodParseError {
    /// The rejected input.
    pub value: String,
}
