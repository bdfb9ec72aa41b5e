//! Command-line arguments.

use std::str::FromStr;

use clap::{Parser, ValueEnum};
use thiserror::Error;

/// Demo HTTP server for the endpoint pipeline.
#[derive(Debug, Parser)]
#[command(name = "endpoint-demo", version, about, long_about = None)]
pub struct Args {
    /// Address to bind.
    #[arg(long, env = "ENDPOINT_DEMO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Log output format.
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Accepted bearer token as `name=secret`; prefix the name with `admin:`
    /// to allow deletes. Repeatable.
    #[arg(long = "token", value_name = "NAME=SECRET")]
    pub tokens: Vec<TokenGrant>,

    /// Maximum request body in bytes.
    #[arg(long, env = "BODY_LIMIT", default_value_t = 1024 * 1024)]
    pub body_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// One `--token` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub name: String,
    pub secret: String,
    pub admin: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenGrantError {
    #[error("expected NAME=SECRET, got '{0}'")]
    MissingSeparator(String),

    #[error("token name must not be empty")]
    EmptyName,

    #[error("token secret must not be empty")]
    EmptySecret,
}

impl FromStr for TokenGrant {
    type Err = TokenGrantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, secret) = s
            .split_once('=')
            .ok_or_else(|| TokenGrantError::MissingSeparator(s.to_string()))?;
        let (name, admin) = match name.strip_prefix("admin:") {
            Some(rest) => (rest, true),
            None => (name, false),
        };
        if name.is_empty() {
            return Err(TokenGrantError::EmptyName);
        }
        if secret.is_empty() {
            return Err(TokenGrantError::EmptySecret);
        }
        Ok(Self {
            name: name.to_string(),
            secret: secret.to_string(),
            admin,
        })
    }
}
