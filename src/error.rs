//! Startup errors surfaced by [`crate::run`].

use thiserror::Error;

use crate::config::ConfigError;
use crate::gateway::GatewayError;
use crate::http::HttpError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),
    #[error("Discord client error: {0}")]
    Http(#[from] HttpError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("liveness server error: {0}")]
    Liveness(#[from] std::io::Error),
}
