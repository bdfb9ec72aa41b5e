//! The response sink.
//!
//! [`Response`] accumulates a [`ResponseBody`] for one request and terminates
//! the request through one of three terminal actions: [`Response::send`],
//! [`Response::unauthorized`], or [`Response::forbidden`]. Each takes `self`
//! by value, so a response can be terminated at most once; a second terminal
//! call does not compile.
//!
//! The host transport is reached through the [`ResponseHandle`] port.

use crate::envelope::ResponseBody;
use crate::errors::SinkError;
use crate::types::Status;

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Host-side handle able to write a status code and an optional JSON body once.
///
/// Implemented by transport adapters. `write` consumes the boxed handle; the
/// pipeline calls it exactly once per request.
pub trait ResponseHandle: Send {
    /// Writes the final status and body (already encoded as JSON) to the transport.
    ///
    /// `body` is `None` for status-only responses (401, 403).
    fn write(self: Box<Self>, status: Status, body: Option<String>) -> Result<(), SinkError>;
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

/// Request-scoped response sink.
pub struct Response {
    handle: Box<dyn ResponseHandle>,
    body: ResponseBody,
    error_status: Status,
    /// Set once the handler picks a status; pipeline defaults no longer apply.
    error_status_chosen: bool,
}

impl Response {
    /// Wraps a host handle. The error status defaults to `400 Bad Request`.
    pub fn new(handle: Box<dyn ResponseHandle>) -> Self {
        Self {
            handle,
            body: ResponseBody::default(),
            error_status: Status::BAD_REQUEST,
            error_status_chosen: false,
        }
    }

    /// Returns the envelope accumulated so far.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    /// Status used by [`send`](Self::send) when the envelope carries errors.
    pub fn error_status(&self) -> Status {
        self.error_status
    }

    /// Overrides the status used when the envelope carries errors.
    ///
    /// Handlers call this to pick a more specific code (e.g. `404`) for the
    /// domain error they are about to return. A status chosen here wins over
    /// the pipeline's per-class defaults for the rest of the request.
    pub fn set_error_status(&mut self, status: Status) {
        self.error_status = status;
        self.error_status_chosen = true;
    }

    /// Applies a pipeline default unless a status was already chosen.
    pub(crate) fn default_error_status(&mut self, status: Status) {
        if !self.error_status_chosen {
            self.error_status = status;
        }
    }

    /// Applies `status` unconditionally.
    pub(crate) fn force_error_status(&mut self, status: Status) {
        self.error_status = status;
        self.error_status_chosen = true;
    }

    /// Serializes the envelope and writes it.
    ///
    /// Status is `200` when `errors` is absent or empty, otherwise the
    /// configured error status. Returns the status that was written.
    pub fn send(self) -> Result<Status, SinkError> {
        let status = if self.body.has_errors() {
            self.error_status
        } else {
            Status::OK
        };
        let json = serde_json::to_string(&self.body)?;
        self.handle.write(status, Some(json))?;
        Ok(status)
    }

    /// Writes a bodiless `401 Unauthorized`.
    pub fn unauthorized(self) -> Result<Status, SinkError> {
        self.handle.write(Status::UNAUTHORIZED, None)?;
        Ok(Status::UNAUTHORIZED)
    }

    /// Writes a bodiless `403 Forbidden`.
    pub fn forbidden(self) -> Result<Status, SinkError> {
        self.handle.write(Status::FORBIDDEN, None)?;
        Ok(Status::FORBIDDEN)
    }
}

impl std::fmt::Debug for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("body", &self.body)
            .field("error_status", &self.error_status)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Test support
// ---------------------------------------------------------------------------
