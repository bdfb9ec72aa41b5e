//! Explicit pipeline configuration.
//!
//! Everything the pipeline needs to know about status codes and error
//! rendering is passed in through [`PipelineOptions`]; nothing is read from
//! the process environment.

use serde::{Deserialize, Serialize};

use crate::types::Status;

/// Status codes and error-rendering rules applied by every [`crate::Endpoint`].
///
/// Deserializable so hosts can load it from their own configuration files;
/// missing keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Status for schema validation failures. Default `400`.
    pub validation_status: Status,

    /// Status for envelopes carrying a domain error. Default `400`.
    ///
    /// A handler may still override it through
    /// [`crate::Response::set_error_status`] before returning its error.
    pub domain_error_status: Status,

    /// Status for envelopes carrying an unexpected error. Default `400`.
    pub unexpected_error_status: Status,

    /// Status written when a handler or serializer panics. Default `500`.
    pub panic_status: Status,

    /// `id` of the single entry produced for unexpected errors. Default `"error"`.
    pub unexpected_error_id: String,

    /// When `false`, unexpected error messages are replaced by `"internal error"`.
    pub expose_unexpected_messages: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            validation_status: Status::BAD_REQUEST,
            domain_error_status: Status::BAD_REQUEST,
            unexpected_error_status: Status::BAD_REQUEST,
            panic_status: Status::INTERNAL_SERVER_ERROR,
            unexpected_error_id: "error".to_string(),
            expose_unexpected_messages: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let options: PipelineOptions =
            serde_json::from_str(r#"{ "unexpected_error_status": 500 }"#).unwrap();

        assert_eq!(options.unexpected_error_status, Status::INTERNAL_SERVER_ERROR);
        assert_eq!(options.validation_status, Status::BAD_REQUEST);
        assert_eq!(options.unexpected_error_id, "error");
        assert!(options.expose_unexpected_messages);
    }
}
