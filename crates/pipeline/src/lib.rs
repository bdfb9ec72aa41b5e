//! Request-handling pipeline that sits between a host HTTP transport and
//! application business logic.
//!
//! An [`Endpoint`] takes a normalized [`Request`], optionally validates its body
//! against a [`Schema`], resolves an authentication token, invokes a
//! [`Handler`], turns the handler's [`Output`] (or failure) into a uniform JSON
//! envelope, and terminates the request through exactly one terminal action on
//! the [`Response`] sink.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no transport
//! dependencies. Hosts supply a [`ResponseHandle`] and a normalized
//! [`Request`]; adapter crates implement the traits defined here.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`types`] | `Method` and `Status` value types |
//! | [`identifiers`] | Newtype identifiers (`RequestId`, `RoutePath`) |
//! | [`errors`] | `ApiError`, `EndpointError`, `SinkError` |
//! | [`envelope`] | The `{ data?, errors? }` response body |
//! | [`response`] | The response sink and the `ResponseHandle` port |
//! | [`serializable`] | The `Serializable` contract and handler `Output` |
//! | [`options`] | Explicit pipeline configuration |
//! | [`endpoint`] | Endpoint configuration, ports, and the `run` state machine |

pub mod endpoint;
pub mod envelope;
pub mod errors;
pub mod identifiers;
pub mod options;
pub mod response;
pub mod serializable;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use endpoint::{
    handler_fn, Anonymous, Context, Endpoint, EndpointConfig, Handler, HandlerFn, Request, Route,
    Schema, TokenResolver, UnauthenticatedEndpoint, Violation,
};
pub use envelope::ResponseBody;
pub use errors::{ApiError, EndpointError, MethodParseError, SinkError};
pub use identifiers::{RequestId, RoutePath};
pub use options::PipelineOptions;
pub use response::{Response, ResponseHandle};
pub use serializable::{Json, Output, Serializable};
pub use types::{Method, Status};
