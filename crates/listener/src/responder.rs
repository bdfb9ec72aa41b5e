//! [`pipeline::ResponseHandle`] over a one-shot channel.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use pipeline::{ResponseHandle, SinkError, Status};
use tokio::sync::oneshot;

/// The status and body written by the pipeline for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub status: Status,
    pub body: Option<String>,
}

impl IntoResponse for Written {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match self.body {
            Some(json) => (
                status,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                json,
            )
                .into_response(),
            None => status.into_response(),
        }
    }
}

/// Sending half handed to the pipeline; the receiver stays with the axum handler.
#[derive(Debug)]
pub struct ChannelResponder {
    sender: oneshot::Sender<Written>,
}

impl ChannelResponder {
    pub fn new() -> (Self, oneshot::Receiver<Written>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }
}

impl ResponseHandle for ChannelResponder {
    fn write(self: Box<Self>, status: Status, body: Option<String>) -> Result<(), SinkError> {
        self.sender
            .send(Written { status, body })
            .map_err(|_| SinkError::Closed)
    }
}
