//! Route registration and request normalization.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use axum::body::to_bytes;
use axum::extract::{Path, Query, Request as AxumRequest};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{MethodFilter, MethodRouter};
use axum::{Json, RequestPartsExt, Router};
use pipeline::{ApiError, Method, Request, ResponseBody, Route};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ListenerConfig;
use crate::credentials::bearer_token;
use crate::responder::ChannelResponder;

/// Errors raised while building the router.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Two endpoints claim the same `(method, url)` pair.
    #[error("Duplicate route: {method} {url}")]
    DuplicateRoute { method: Method, url: String },
}

/// Builds an axum router serving every route.
///
/// Endpoints sharing a url are merged into one `MethodRouter`; unsupported
/// methods on a known url get axum's `405`, unknown urls its `404`.
pub fn router<I>(routes: I, config: ListenerConfig) -> Result<Router, ListenerError>
where
    I: IntoIterator<Item = Arc<dyn Route>>,
{
    let config = Arc::new(config);
    let mut seen = HashSet::new();
    let mut by_url: BTreeMap<String, MethodRouter> = BTreeMap::new();

    for route in routes {
        let method = route.method();
        let url = route.url().as_str().to_string();
        if !seen.insert((method, url.clone())) {
            return Err(ListenerError::DuplicateRoute { method, url });
        }

        debug!(%method, %url, "registering endpoint");
        let config = Arc::clone(&config);
        let handler = move |request: AxumRequest| dispatch(route, config, request);
        let method_router = by_url.remove(&url).unwrap_or_else(MethodRouter::new);
        by_url.insert(url, method_router.on(method_filter(method), handler));
    }

    Ok(by_url
        .into_iter()
        .fold(Router::new(), |router, (url, method_router)| {
            router.route(&url, method_router)
        }))
}

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Delete => MethodFilter::DELETE,
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
        Method::Put => MethodFilter::PUT,
    }
}

/// Normalizes one axum request, runs the endpoint, and turns what it wrote
/// into the axum response.
///
/// Only JSON bodies (`application/json` or a `+json` media type) are parsed;
/// any other content type reaches the endpoint as `null`, as does an empty
/// body. The size limit applies either way.
async fn dispatch(
    route: Arc<dyn Route>,
    config: Arc<ListenerConfig>,
    request: AxumRequest,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let bytes = match to_bytes(body, config.body_limit).await {
        Ok(bytes) => bytes,
        Err(e) => return body_error(format!("\"body\" could not be read: {e}")),
    };
    let body = if bytes.is_empty() || !is_json(&parts.headers) {
        Value::Null
    } else {
        match serde_json::from_slice(&bytes) {
            Ok(value) => value,
            Err(e) => return body_error(format!("\"body\" must be valid JSON: {e}")),
        }
    };

    let params = path_params(&mut parts).await;
    let auth_token = credential(&mut parts, &config).await;
    let request = Request {
        method: route.method(),
        url: parts.uri.path().to_string(),
        params,
        body,
        auth_token,
    };

    let (responder, receiver) = ChannelResponder::new();
    if let Err(e) = route.run(request, Box::new(responder)).await {
        warn!(error = %e, "endpoint could not write its response");
    }

    match receiver.await {
        Ok(written) => written.into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn path_params(parts: &mut Parts) -> HashMap<String, String> {
    parts
        .extract::<Path<HashMap<String, String>>>()
        .await
        .map(|Path(params)| params)
        .unwrap_or_default()
}

/// Bearer header first, then the configured query parameter (percent-decoded).
async fn credential(parts: &mut Parts, config: &ListenerConfig) -> Option<String> {
    if let Some(token) = bearer_token(&parts.headers) {
        return Some(token);
    }
    let key = config.query_token_key.as_deref()?;
    let Query(mut query) = parts
        .extract::<Query<HashMap<String, String>>>()
        .await
        .ok()?;
    query.remove(key).filter(|token| !token.is_empty())
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

/// A `400` envelope for bodies that never made it into a [`Request`].
fn body_error(message: String) -> Response {
    let mut envelope = ResponseBody::default();
    envelope.push_error(ApiError::new("body", message));
    (StatusCode::BAD_REQUEST, Json(envelope)).into_response()
}
