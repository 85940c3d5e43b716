//! Liveness endpoint for uptime pingers and container health checks.

use std::net::{Ipv4Addr, SocketAddr};

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info};

pub const ALIVE_BODY: &str = "Bot is alive!";

/// A running liveness listener.
pub struct LivenessServer {
    pub address: SocketAddr,
    join: tokio::task::JoinHandle<()>,
}

impl LivenessServer {
    pub fn abort(self) {
        self.join.abort();
    }
}

pub fn router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    ALIVE_BODY
}

/// Bind `0.0.0.0:port` and serve [`router`] on a background task.
///
/// Binding happens before this returns so a taken port fails startup.
pub async fn spawn(port: u16) -> Result<LivenessServer, std::io::Error> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await?;
    let address = listener.local_addr()?;
    info!(%address, "liveness endpoint listening");

    let join = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router()).await {
            error!(error = %e, "liveness server stopped");
        }
    });

    Ok(LivenessServer { address, join })
}
