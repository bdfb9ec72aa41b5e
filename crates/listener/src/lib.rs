//! Host transport adapter for the endpoint pipeline.
//!
//! Mounts [`pipeline::Route`]s on an [`axum::Router`] and bridges each axum
//! request into one [`pipeline::Endpoint::run`] call:
//!
//! - **Request normalization**: route parameters, JSON body, and the bearer
//!   credential are pulled out of the axum request into a
//!   [`pipeline::Request`].
//! - **Response handle**: [`ChannelResponder`] implements
//!   [`pipeline::ResponseHandle`] over a one-shot channel; whatever the
//!   pipeline writes becomes the axum response.
//! - **Route registration**: [`router`] maps every `(Method, url)` pair to its
//!   endpoint, one axum `MethodRouter` per url.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Everything axum-specific lives here. The [`pipeline`]
//! crate sees only [`pipeline::Request`] and [`pipeline::ResponseHandle`].
//!
//! Binding a socket and serving the router is left to the host binary.

mod config;
mod credentials;
mod responder;
mod routes;

pub use config::ListenerConfig;
pub use credentials::bearer_token;
pub use responder::{ChannelResponder, Written};
pub use routes::{router, ListenerError};
