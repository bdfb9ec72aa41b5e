//! The uniform JSON response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;

/// Body written by [`crate::Response::send`].
///
/// Serializes to one of `{ "data": ... }`, `{ "errors": [...] }`, or `{}`.
/// One instance per request, owned by that request's response sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
}

impl ResponseBody {
    /// Returns `true` if `errors` is present and non-empty.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Appends an error entry, creating the `errors` array if needed.
    pub fn push_error(&mut self, error: ApiError) {
        self.errors.get_or_insert_with(Vec::new).push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_void_success_serializes_to_empty_object() {
        let body = ResponseBody::default();
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({}));
        assert!(!body.has_errors());
    }

    #[test]
    fn test_data_only_envelope() {
        let body = ResponseBody {
            data: Some(json!([1, 2])),
            errors: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "data": [1, 2] }));
    }

    #[test]
    fn test_empty_error_list_is_not_an_error() {
        let body = ResponseBody {
            data: None,
            errors: Some(vec![]),
        };
        assert!(!body.has_errors());
    }

    #[test]
    fn test_push_error_accumulates() {
        let mut body = ResponseBody::default();
        body.push_error(ApiError::new("a", "first"));
        body.push_error(ApiError::new("b", "second"));
        assert_eq!(body.errors.as_ref().map(Vec::len), Some(2));
        assert!(body.has_errors());
    }
}
