//! Credential extraction.

use axum::http::{header, HeaderMap};

/// Returns the token of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively. Missing headers, other schemes,
/// non-ASCII values, and empty tokens all yield `None`.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}
