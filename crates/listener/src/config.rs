//! Listener configuration.

use serde::{Deserialize, Serialize};

/// Request-normalization settings for [`crate::router`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Maximum accepted request body, in bytes. Default 1 MiB.
    pub body_limit: usize,

    /// Query parameter consulted for a credential when the request has no
    /// `Authorization: Bearer` header. `None` disables the fallback.
    /// Default `"access_token"`.
    pub query_token_key: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            body_limit: 1024 * 1024,
            query_token_key: Some("access_token".to_string()),
        }
    }
}
