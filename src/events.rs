//! Typed gateway events.
//!
//! The gateway module turns raw `(op, t, d)` payloads into this enum so the
//! bot loop can pattern-match on strongly-typed data.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::types::*;

/// A parsed event coming off the Discord gateway.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    /// Identified successfully; the bot is ready.
    Ready(ReadyEvent),

    /// A resumed session replayed its missed events.
    Resumed,

    /// An interaction was created (slash command, button, modal submit...).
    InteractionCreate(Box<Interaction>),

    /// Heartbeat ACK from the gateway (op 11).
    HeartbeatAck,

    /// The gateway is asking us to heartbeat immediately (op 1).
    HeartbeatRequest,

    /// Gateway told us to reconnect (op 7).
    Reconnect,

    /// Session has been invalidated (op 9). `true` when it can be resumed.
    InvalidSession(bool),

    /// Anything we don't have a typed variant for.
    Unknown {
        event_name: Option<String>,
        op: u8,
    },
}

impl GatewayEvent {
    /// Convert a raw [`GatewayPayload`] into a typed event. Never fails.
    pub fn from_payload(payload: GatewayPayload) -> Self {
        match payload.op {
            0 => Self::parse_dispatch(payload.t, payload.d),
            1 => GatewayEvent::HeartbeatRequest,
            7 => GatewayEvent::Reconnect,
            9 => GatewayEvent::InvalidSession(
                payload.d.as_ref().and_then(|v| v.as_bool()).unwrap_or(false),
            ),
            11 => GatewayEvent::HeartbeatAck,
            op => GatewayEvent::Unknown {
                event_name: payload.t,
                op,
            },
        }
    }

    fn parse_dispatch(event_name: Option<String>, data: Option<serde_json::Value>) -> Self {
        let Some(name) = event_name else {
            return GatewayEvent::Unknown {
                event_name: None,
                op: 0,
            };
        };
        let Some(d) = data else {
            return GatewayEvent::Unknown {
                event_name: Some(name),
                op: 0,
            };
        };

        match name.as_str() {
            "READY" => parse_or_unknown(&name, d, GatewayEvent::Ready),
            "RESUMED" => GatewayEvent::Resumed,
            "INTERACTION_CREATE" => parse_or_unknown(&name, d, |interaction| {
                GatewayEvent::InteractionCreate(Box::new(interaction))
            }),
            _ => GatewayEvent::Unknown {
                event_name: Some(name.clone()),
                op: 0,
            },
        }
    }
}

fn parse_or_unknown<T, F>(name: &str, data: serde_json::Value, wrap: F) -> GatewayEvent
where
    T: DeserializeOwned,
    F: FnOnce(T) -> GatewayEvent,
{
    match serde_json::from_value::<T>(data) {
        Ok(parsed) => wrap(parsed),
        Err(e) => {
            warn!(event = name, error = %e, "failed to parse dispatch payload");
            GatewayEvent::Unknown {
                event_name: Some(name.to_string()),
                op: 0,
            }
        }
    }
}
