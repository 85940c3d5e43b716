//! Discord bot entry point.

use tracing::error;

#[tokio::main]
async fn main() {
    // Initialise tracing (respects RUST_LOG env, defaults to info).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = galactic_war_bot::run().await {
        error!(error = %e, "bot exited");
        std::process::exit(1);
    }
}
