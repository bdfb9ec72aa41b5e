//! Endpoint pipeline demo server.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: command-line flags with environment fallbacks
//!    ([`args::Args`]).
//! 2. **Wire observability**: install a `tracing-subscriber` registry with an
//!    `EnvFilter` and either a pretty or a JSON fmt layer. Every span and event
//!    emitted by the workspace crates flows through it.
//! 3. **Construct endpoints**: build the demo routes over an in-memory
//!    [`store::WidgetStore`] and a static token table.
//! 4. **Serve**: mount the routes with [`listener::router`] and serve them with
//!    axum until Ctrl-C.

mod api;
mod args;
mod store;

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use listener::ListenerConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::TokenTable;
use crate::args::{Args, LogFormat};
use crate::store::WidgetStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting endpoint-demo");

    let tokens = TokenTable::new(&args.tokens);
    if tokens.is_empty() {
        tracing::warn!("no --token given; authenticated endpoints will answer 401");
    } else {
        tracing::info!(count = tokens.len(), "loaded bearer tokens");
    }

    let routes = api::routes(Arc::new(WidgetStore::new()), tokens)?;
    let config = ListenerConfig {
        body_limit: args.body_limit,
        ..ListenerConfig::default()
    };
    let app = listener::router(routes, config)?;

    let addr = format!("{}:{}", args.host, args.port);
    let socket = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(socket, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("shut down");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "endpoint_demo=info,pipeline=info,listener=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
