//! Endpoint configuration, port traits, and the per-request state machine.
//!
//! ```text
//! Init → [SchemaValidate] → Authenticate → [Authorize] → Execute → Serialize → Sent
//!              │ failure          │ none / error   │ denied     │ failure
//!              ▼                  ▼                ▼            ▼
//!          Sent(400)     Sent(401) / envelope   Sent(403)   Sent(error envelope)
//! ```
//!
//! Stages run strictly in this order. A body that fails validation never
//! reaches the token resolver or the handler; a credential that resolves to no
//! principal never reaches the handler and produces no JSON body at all.
//!
//! Every [`Endpoint::run`] ends with exactly one terminal action on the
//! [`Response`] sink, including when a handler or serializer panics.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::envelope::ResponseBody;
use crate::errors::{ApiError, EndpointError, SinkError};
use crate::identifiers::{RequestId, RoutePath};
use crate::options::PipelineOptions;
use crate::response::{Response, ResponseHandle};
use crate::serializable::Output;
use crate::types::{Method, Status};

// ---------------------------------------------------------------------------
// Request and context
// ---------------------------------------------------------------------------

/// Normalized request handed over by the host transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub url: String,
    /// Route parameters captured by the host router.
    pub params: HashMap<String, String>,
    /// Parsed JSON body; `Value::Null` when the request had none.
    pub body: Value,
    /// Raw credential (e.g. a bearer token); `None` when absent.
    pub auth_token: Option<String>,
}

impl Request {
    /// Creates a request with no parameters, a `null` body, and no credential.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: HashMap::new(),
            body: Value::Null,
            auth_token: None,
        }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Per-invocation input of a [`Handler`].
///
/// Built fresh for every request after authentication succeeds. Read-only:
/// the handler gets its own copy and nothing it does is seen by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Context<T> {
    params: HashMap<String, String>,
    body: Value,
    token: T,
}

impl<T> Context<T> {
    /// Route parameters.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Looks up a single route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// The parsed request body.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Deserializes the body into a typed value.
    ///
    /// A failure here is an unexpected error: bodies that can fail this way
    /// should be guarded by a [`Schema`].
    pub fn body_as<D: DeserializeOwned>(&self) -> Result<D, EndpointError> {
        Ok(D::deserialize(&self.body)?)
    }

    /// The resolved principal (`()` for unauthenticated endpoints).
    pub fn token(&self) -> &T {
        &self.token
    }

    /// Splits the context into `(params, body, token)`.
    pub fn into_parts(self) -> (HashMap<String, String>, Value, T) {
        (self.params, self.body, self.token)
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// One schema violation found in a request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Path segments from the body root to the offending value.
    pub path: Vec<String>,
    /// Validator message.
    pub message: String,
}

impl Violation {
    pub fn new(path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Dot-joined path, or `"body"` for violations on the body itself.
    pub fn id(&self) -> String {
        if self.path.is_empty() {
            "body".to_string()
        } else {
            self.path.join(".")
        }
    }
}

impl From<Violation> for ApiError {
    fn from(violation: Violation) -> Self {
        ApiError::new(violation.id(), violation.message)
    }
}

/// Validator for request bodies.
#[async_trait]
pub trait Schema: Send + Sync {
    /// Checks `body`, returning **every** violation found, not just the first.
    async fn validate(&self, body: &Value) -> Result<(), Vec<Violation>>;
}

/// Resolves a raw credential into a principal.
///
/// `Ok(None)` means "no such principal" and yields a `401`. `Err` means the
/// lookup itself failed and is reported as an error envelope instead.
#[async_trait]
pub trait TokenResolver<T>: Send + Sync {
    /// `credential` is the empty string when the request carried none.
    async fn retrieve_token(&self, credential: &str) -> Result<Option<T>, EndpointError>;
}

#[async_trait]
impl<T, F, Fut> TokenResolver<T> for F
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<T>, EndpointError>> + Send,
{
    async fn retrieve_token(&self, credential: &str) -> Result<Option<T>, EndpointError> {
        (self)(credential.to_string()).await
    }
}

/// Resolver used by unauthenticated endpoints: always succeeds with `()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl TokenResolver<()> for Anonymous {
    async fn retrieve_token(&self, _credential: &str) -> Result<Option<()>, EndpointError> {
        Ok(Some(()))
    }
}

/// Business callback of an endpoint.
///
/// The handler gets `&mut Response` so it can inspect the envelope or choose
/// the error status; terminal actions take the response by value, so a handler
/// cannot terminate the request itself.
#[async_trait]
pub trait Handler<T>: Send + Sync {
    async fn call(
        &self,
        response: &mut Response,
        context: Context<T>,
    ) -> Result<Output, EndpointError>;
}

/// [`Handler`] built from a closure that only needs the [`Context`].
pub struct HandlerFn<F>(F);

/// Adapts `Fn(Context<T>) -> impl Future<Output = Result<Output, EndpointError>>`.
pub fn handler_fn<T, F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Context<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Output, EndpointError>> + Send,
{
    HandlerFn(f)
}

#[async_trait]
impl<T, F, Fut> Handler<T> for HandlerFn<F>
where
    T: Send + 'static,
    F: Fn(Context<T>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Output, EndpointError>> + Send,
{
    async fn call(
        &self,
        _response: &mut Response,
        context: Context<T>,
    ) -> Result<Output, EndpointError> {
        (self.0)(context).await
    }
}

type Authorize<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-route definition. Immutable once handed to an [`Endpoint`].
pub struct EndpointConfig<T> {
    method: Method,
    url: RoutePath,
    schema: Option<Arc<dyn Schema>>,
    retrieve_token: Arc<dyn TokenResolver<T>>,
    authorize: Option<Authorize<T>>,
    handler: Arc<dyn Handler<T>>,
}

impl<T> EndpointConfig<T> {
    /// Authenticated endpoint: `retrieve_token` decides who may call it.
    pub fn new(
        method: Method,
        url: RoutePath,
        retrieve_token: impl TokenResolver<T> + 'static,
        handler: impl Handler<T> + 'static,
    ) -> Self {
        Self {
            method,
            url,
            schema: None,
            retrieve_token: Arc::new(retrieve_token),
            authorize: None,
            handler: Arc::new(handler),
        }
    }

    /// Validates every request body against `schema` before anything else runs.
    pub fn schema(mut self, schema: impl Schema + 'static) -> Self {
        self.schema = Some(Arc::new(schema));
        self
    }

    /// Rejects resolved principals for which `authorize` returns `false` with a `403`.
    pub fn authorize(mut self, authorize: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.authorize = Some(Arc::new(authorize));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &RoutePath {
        &self.url
    }
}

impl EndpointConfig<()> {
    /// Endpoint open to everyone; the token stage always resolves to `()`.
    pub fn unauthenticated(
        method: Method,
        url: RoutePath,
        handler: impl Handler<()> + 'static,
    ) -> Self {
        Self::new(method, url, Anonymous, handler)
    }
}

impl<T> std::fmt::Debug for EndpointConfig<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("schema", &self.schema.is_some())
            .field("authorize", &self.authorize.is_some())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Terminal action chosen by the evaluation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Send,
    Unauthorized,
    Forbidden,
}

/// One route's pipeline.
#[derive(Debug)]
pub struct Endpoint<T> {
    config: EndpointConfig<T>,
    options: PipelineOptions,
}

/// Endpoint whose principal is always `()`.
pub type UnauthenticatedEndpoint = Endpoint<()>;

impl Endpoint<()> {
    /// Shorthand for an [`EndpointConfig::unauthenticated`] endpoint with default options.
    pub fn unauthenticated(
        method: Method,
        url: RoutePath,
        handler: impl Handler<()> + 'static,
    ) -> UnauthenticatedEndpoint {
        Self::new(EndpointConfig::unauthenticated(method, url, handler))
    }
}

impl<T> Endpoint<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(config: EndpointConfig<T>) -> Self {
        Self::with_options(config, PipelineOptions::default())
    }

    pub fn with_options(config: EndpointConfig<T>, options: PipelineOptions) -> Self {
        Self { config, options }
    }

    pub fn config(&self) -> &EndpointConfig<T> {
        &self.config
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Drives one request through the pipeline and writes exactly one response.
    ///
    /// Returns the status written, or the [`SinkError`] raised by the host
    /// handle (e.g. the client disconnected). Stage failures never surface
    /// here; they become envelope entries or bare status codes.
    pub async fn run(
        &self,
        request: Request,
        handle: Box<dyn ResponseHandle>,
    ) -> Result<Status, SinkError> {
        let request_id = RequestId::new_random();
        let span = info_span!(
            "endpoint",
            %request_id,
            method = %self.config.method,
            url = %self.config.url
        );

        async move {
            let mut response = Response::new(handle);

            let verdict = match AssertUnwindSafe(self.evaluate(request, &mut response))
                .catch_unwind()
                .await
            {
                Ok(verdict) => verdict,
                Err(panic) => {
                    error!(panic = panic_message(&*panic), "endpoint panicked");
                    *response.body_mut() = ResponseBody::default();
                    response.body_mut().push_error(ApiError::new(
                        self.options.unexpected_error_id.clone(),
                        "internal error",
                    ));
                    response.force_error_status(self.options.panic_status);
                    Verdict::Send
                }
            };

            let written = match verdict {
                Verdict::Send => response.send(),
                Verdict::Unauthorized => response.unauthorized(),
                Verdict::Forbidden => response.forbidden(),
            };

            match &written {
                Ok(status) => info!(
                    status = status.as_u16(),
                    success = status.is_success(),
                    "request completed"
                ),
                Err(e) => warn!(error = %e, "failed to write response"),
            }
            written
        }
        .instrument(span)
        .await
    }

    /// Runs every non-terminal stage, filling `response`, and picks the terminal action.
    async fn evaluate(&self, request: Request, response: &mut Response) -> Verdict {
        let Request {
            params,
            body,
            auth_token,
            ..
        } = request;

        if let Some(schema) = &self.config.schema {
            if let Err(violations) = schema.validate(&body).await {
                debug!(violations = violations.len(), "request body rejected by schema");
                response.default_error_status(self.options.validation_status);
                if violations.is_empty() {
                    response
                        .body_mut()
                        .push_error(ApiError::new("body", "\"body\" is invalid"));
                }
                for violation in violations {
                    response.body_mut().push_error(violation.into());
                }
                return Verdict::Send;
            }
        }

        response.default_error_status(self.options.domain_error_status);

        let credential = auth_token.unwrap_or_default();
        let token = match self.config.retrieve_token.retrieve_token(&credential).await {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("credential did not resolve to a principal");
                return Verdict::Unauthorized;
            }
            Err(error) => {
                self.record_failure(response, error);
                return Verdict::Send;
            }
        };

        if let Some(authorize) = &self.config.authorize {
            if !authorize(&token) {
                debug!("principal not authorized for this endpoint");
                return Verdict::Forbidden;
            }
        }

        let context = Context {
            params,
            body,
            token,
        };
        let output = match self.config.handler.call(response, context).await {
            Ok(output) => output,
            Err(error) => {
                self.record_failure(response, error);
                return Verdict::Send;
            }
        };

        match output.render().await {
            Ok(data) => response.body_mut().data = data,
            Err(error) => self.record_failure(response, error),
        }
        Verdict::Send
    }

    fn record_failure(&self, response: &mut Response, error: EndpointError) {
        match error {
            EndpointError::Domain(api_error) => {
                debug!(id = %api_error.id, "domain error");
                response.body_mut().push_error(api_error);
            }
            EndpointError::Unexpected { message } => {
                warn!(error = %message, "unexpected endpoint failure");
                let message = if self.options.expose_unexpected_messages {
                    message
                } else {
                    "internal error".to_string()
                };
                response.default_error_status(self.options.unexpected_error_status);
                response.body_mut().push_error(ApiError::new(
                    self.options.unexpected_error_id.clone(),
                    message,
                ));
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

// ---------------------------------------------------------------------------
// Route registration
// ---------------------------------------------------------------------------

/// Type-erased endpoint, so hosts can register endpoints with different
/// principal types in one table keyed by `(Method, url)`.
#[async_trait]
pub trait Route: Send + Sync {
    fn method(&self) -> Method;

    fn url(&self) -> &RoutePath;

    async fn run(
        &self,
        request: Request,
        handle: Box<dyn ResponseHandle>,
    ) -> Result<Status, SinkError>;
}

#[async_trait]
impl<T> Route for Endpoint<T>
where
    T: Send + Sync + 'static,
{
    fn method(&self) -> Method {
        self.config.method
    }

    fn url(&self) -> &RoutePath {
        &self.config.url
    }

    async fn run(
        &self,
        request: Request,
        handle: Box<dyn ResponseHandle>,
    ) -> Result<Status, SinkError> {
        Endpoint::run(self, request, handle).await
    }
}
