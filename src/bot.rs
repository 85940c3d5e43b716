//! Core bot infrastructure: shared context, gateway bridge, and event loop.
//!
//! Clients are built once and shared behind an [`Arc`]; every interaction is
//! answered on its own task so a slow war API call never stalls the gateway.

use std::sync::Arc;

use tracing::{error, info, trace, warn};

use crate::config::Config;
use crate::error::Error;
use crate::events::GatewayEvent;
use crate::gateway::{self, GatewayConfig, GatewayError, INTENTS_GUILDS};
use crate::handlers;
use crate::http::DiscordHttpClient;
use crate::war_api::WarClient;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Immutable clients shared by every interaction task.
#[derive(Debug, Clone)]
pub struct BotContext {
    pub http: DiscordHttpClient,
    pub war: WarClient,
}

impl BotContext {
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        Ok(Self {
            http: DiscordHttpClient::new(&config.token)?,
            war: WarClient::new(&config.war_api_base, config.fetch_timeout)?,
        })
    }
}

/// Lifecycle state owned by the event loop.
#[derive(Debug, Default)]
pub struct BotState {
    /// Configured up front or taken from READY.
    pub application_id: Option<String>,
    /// Whether slash commands have been registered this process.
    pub commands_registered: bool,
}

// ---------------------------------------------------------------------------
// Bot entry point
// ---------------------------------------------------------------------------

/// Connect to the Discord gateway and run the main event loop.
///
/// Returns once the gateway session ends for good, which is always an error
/// from the caller's point of view.
pub async fn start(config: &Config) -> Result<(), Error> {
    let ctx = Arc::new(BotContext::from_config(config)?);
    let mut state = BotState {
        application_id: config.application_id.clone(),
        commands_registered: false,
    };

    if let Some(app_id) = state.application_id.clone() {
        state.commands_registered = handlers::register_commands(&ctx.http, &app_id).await;
    }

    let gateway_config = GatewayConfig {
        token: config.token.clone(),
        intents: INTENTS_GUILDS,
    };
    let mut gw = gateway::connect(gateway_config).await.map_err(|e| {
        error!(error = %e, "failed to start gateway");
        e
    })?;

    info!("gateway connected, entering event loop");

    // ----- Main event loop -----
    while let Some(event) = gw.events.recv().await {
        match event {
            GatewayEvent::Ready(ready) => {
                handlers::on_ready(&ctx, &mut state, ready).await;
            }

            GatewayEvent::InteractionCreate(interaction) => {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    if let Err(e) = handlers::on_interaction(&ctx, &interaction).await {
                        error!(error = %e, "failed to handle interaction");
                    }
                });
            }

            GatewayEvent::Unknown {
                event_name: Some(ref name),
                ..
            } => {
                trace!(event = %name, "unhandled gateway event");
            }

            // Session control is handled inside the gateway driver.
            _ => {}
        }
    }

    warn!("event stream ended, bot shutting down");
    Err(GatewayError::SessionEnded.into())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
