//! A Discord bot that relays galactic war intel into slash-command replies.
//!
//! The wire types, payload models, formatters and the loadout catalog are
//! plain data and always compiled. Everything that touches the network
//! (gateway, REST, war API, liveness) sits behind the `io` feature.

pub mod commands;
pub mod config;
pub mod format;
pub mod loadouts;
pub mod payloads;
pub mod types;

#[cfg(feature = "io")]
pub mod bot;
#[cfg(feature = "io")]
pub mod error;
#[cfg(feature = "io")]
pub mod events;
#[cfg(feature = "io")]
pub mod gateway;
#[cfg(feature = "io")]
pub mod handlers;
#[cfg(feature = "io")]
pub mod http;
#[cfg(feature = "io")]
pub mod liveness;
#[cfg(feature = "io")]
pub mod war_api;

#[cfg(feature = "io")]
pub use error::Error;

/// Run the bot until the gateway session ends.
///
/// Loads `.env`, reads [`config::Config`] from the environment, starts the
/// liveness endpoint, and hands over to [`bot::start`].
#[cfg(feature = "io")]
pub async fn run() -> Result<(), Error> {
    dotenv::dotenv().ok();

    let config = config::Config::from_env()?;
    tracing::info!(?config, "starting bot");

    let _liveness = liveness::spawn(config.port).await?;
    bot::start(&config).await
}
