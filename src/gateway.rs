//! Gateway (WebSocket) transport for the Discord API.
//!
//! This module owns the WebSocket connection lifecycle:
//!   - connect → receive HELLO → send IDENTIFY (or RESUME)
//!   - background heartbeat task
//!   - sequence number + session id tracking
//!   - reconnect + RESUME when Discord asks for it or the socket drops
//!
//! The rest of the codebase consumes a channel of [`GatewayEvent`]s and never
//! touches `tokio_tungstenite` directly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

use crate::events::GatewayEvent;
use crate::types::GatewayPayload;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_GATEWAY_URL: &str = "wss://gateway.discord.gg";

/// Gateway intents: GUILDS only.
pub const INTENTS_GUILDS: u32 = 1;

const HELLO_TIMEOUT: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 8;

// ---------------------------------------------------------------------------
// Errors and configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("invalid gateway payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("handshake failed: {0}")]
    Handshake(String),
    #[error("gateway session ended")]
    SessionEnded,
}

/// Options for connecting to the Discord gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    pub token: String,
    /// Gateway intents bitmask.
    pub intents: u32,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("token", &"<redacted>")
            .field("intents", &self.intents)
            .finish()
    }
}

/// Receiving side of a running gateway session.
pub struct GatewayHandle {
    pub events: mpsc::Receiver<GatewayEvent>,
    /// The background driver; dropping the handle does not stop it.
    pub driver: tokio::task::JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SessionState {
    session_id: Option<String>,
    resume_gateway_url: Option<String>,
    /// Last dispatch sequence number, 0 until the first dispatch. Shared with
    /// the heartbeat task.
    sequence: Arc<AtomicU64>,
    /// Set once READY or RESUMED arrives on the current connection.
    established: bool,
}

impl SessionState {
    fn sequence(&self) -> Option<u64> {
        match self.sequence.load(Ordering::Relaxed) {
            0 => None,
            seq => Some(seq),
        }
    }

    fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence().is_some()
    }

    fn connect_url(&self) -> String {
        with_gateway_params(
            self.resume_gateway_url
                .as_deref()
                .unwrap_or(DEFAULT_GATEWAY_URL),
        )
    }

    fn forget(&mut self) {
        self.session_id = None;
        self.resume_gateway_url = None;
        self.sequence.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisconnectReason {
    ShouldResume,
    ShouldReidentify,
    Fatal,
    EventChannelClosed,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Open the gateway and spawn the driver that keeps the session alive.
///
/// The first connection and HELLO happen before this returns, so an
/// unreachable gateway is reported to the caller instead of being retried.
pub async fn connect(config: GatewayConfig) -> Result<GatewayHandle, GatewayError> {
    let session = SessionState::default();
    let connection = Connection::open(&session.connect_url()).await?;
    let (event_tx, event_rx) = mpsc::channel::<GatewayEvent>(256);

    let driver = tokio::spawn(drive(config, session, connection, event_tx));

    Ok(GatewayHandle {
        events: event_rx,
        driver,
    })
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = Arc<Mutex<SplitSink<WsStream, WsMessage>>>;

struct Connection {
    sink: WsSink,
    source: SplitStream<WsStream>,
    heartbeat_interval: Duration,
}

impl Connection {
    async fn open(url: &str) -> Result<Self, GatewayError> {
        info!(url = %url, "connecting to Discord gateway");
        let (ws, _) = tokio_tungstenite::connect_async(url).await?;
        let (sink, mut source) = ws.split();
        let heartbeat_interval = read_hello(&mut source).await?;
        info!(
            interval_ms = heartbeat_interval.as_millis() as u64,
            "received HELLO"
        );
        Ok(Self {
            sink: Arc::new(Mutex::new(sink)),
            source,
            heartbeat_interval,
        })
    }
}

async fn read_hello(source: &mut SplitStream<WsStream>) -> Result<Duration, GatewayError> {
    let msg = tokio::time::timeout(HELLO_TIMEOUT, source.next())
        .await
        .map_err(|_| GatewayError::Handshake("timed out waiting for HELLO".into()))?
        .ok_or_else(|| GatewayError::Handshake("stream ended before HELLO".into()))??;

    match msg {
        WsMessage::Text(text) => parse_hello(&text),
        other => Err(GatewayError::Handshake(format!(
            "expected text HELLO, got {:?}",
            other
        ))),
    }
}

fn parse_hello(text: &str) -> Result<Duration, GatewayError> {
    let payload: GatewayPayload = serde_json::from_str(text)?;
    if payload.op != 10 {
        return Err(GatewayError::Handshake(format!(
            "expected op 10 (HELLO), got op {}",
            payload.op
        )));
    }
    payload
        .d
        .as_ref()
        .and_then(|d| d.get("heartbeat_interval"))
        .and_then(|v| v.as_u64())
        .map(Duration::from_millis)
        .ok_or_else(|| GatewayError::Handshake("HELLO missing heartbeat_interval".into()))
}

async fn send_json(sink: &WsSink, payload: &serde_json::Value) -> Result<(), GatewayError> {
    let text = serde_json::to_string(payload)?;
    sink.lock().await.send(WsMessage::Text(text)).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

async fn drive(
    config: GatewayConfig,
    mut session: SessionState,
    mut connection: Connection,
    event_tx: mpsc::Sender<GatewayEvent>,
) {
    let mut attempts: u32 = 0;

    loop {
        let reason = run_connection(&config, connection, &mut session, &event_tx).await;
        if std::mem::take(&mut session.established) {
            attempts = 0;
        }

        match reason {
            DisconnectReason::ShouldResume if session.can_resume() => info!("will attempt RESUME"),
            DisconnectReason::ShouldResume => info!("no session to resume, will IDENTIFY"),
            DisconnectReason::ShouldReidentify => {
                info!("session invalidated, will re-IDENTIFY");
                session.forget();
            }
            DisconnectReason::Fatal => {
                error!("fatal gateway error, shutting down");
                return;
            }
            DisconnectReason::EventChannelClosed => {
                info!("event channel closed, shutting down gateway driver");
                return;
            }
        }

        connection = loop {
            attempts += 1;
            if attempts > MAX_RECONNECT_ATTEMPTS {
                error!("exceeded max reconnect attempts, giving up");
                return;
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
            match Connection::open(&session.connect_url()).await {
                Ok(conn) => break conn,
                Err(e) => warn!(error = %e, attempt = attempts, "reconnect failed"),
            }
        };
    }
}

async fn run_connection(
    config: &GatewayConfig,
    connection: Connection,
    session: &mut SessionState,
    event_tx: &mpsc::Sender<GatewayEvent>,
) -> DisconnectReason {
    let Connection {
        sink,
        mut source,
        heartbeat_interval,
    } = connection;

    let hello_reply = match (&session.session_id, session.sequence()) {
        (Some(session_id), Some(seq)) => {
            info!("sending RESUME");
            resume_payload(&config.token, session_id, seq)
        }
        _ => {
            info!("sending IDENTIFY");
            identify_payload(config)
        }
    };
    if let Err(e) = send_json(&sink, &hello_reply).await {
        warn!(error = %e, "failed to send IDENTIFY/RESUME");
        return DisconnectReason::ShouldResume;
    }

    let heartbeat = tokio::spawn(heartbeat_loop(
        Arc::clone(&sink),
        Arc::clone(&session.sequence),
        heartbeat_interval,
    ));

    let reason = read_loop(&sink, &mut source, session, event_tx).await;

    heartbeat.abort();
    let _ = sink.lock().await.send(WsMessage::Close(None)).await;
    reason
}

/// Heartbeat at the interval from HELLO, the first beat after a random jitter.
async fn heartbeat_loop(sink: WsSink, sequence: Arc<AtomicU64>, interval: Duration) {
    let jitter = rand::random::<f64>();
    tokio::time::sleep(interval.mul_f64(jitter)).await;

    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let seq = match sequence.load(Ordering::Relaxed) {
            0 => None,
            seq => Some(seq),
        };
        if let Err(e) = send_json(&sink, &heartbeat_payload(seq)).await {
            warn!(error = %e, "heartbeat send failed, stopping heartbeat task");
            return;
        }
        debug!(seq = ?seq, "sent heartbeat");
    }
}

async fn read_loop(
    sink: &WsSink,
    source: &mut SplitStream<WsStream>,
    session: &mut SessionState,
    event_tx: &mpsc::Sender<GatewayEvent>,
) -> DisconnectReason {
    while let Some(msg) = source.next().await {
        let text = match msg {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(frame)) => {
                let code = frame.map(|f| u16::from(f.code));
                warn!(close_code = ?code, "WebSocket closed by server");
                return code.map(close_reason).unwrap_or(DisconnectReason::ShouldResume);
            }
            // tungstenite answers pings itself.
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "WebSocket read error");
                return DisconnectReason::ShouldResume;
            }
        };

        let payload: GatewayPayload = match serde_json::from_str(&text) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "failed to parse gateway payload");
                continue;
            }
        };
        if let Some(seq) = payload.s {
            session.sequence.store(seq, Ordering::Relaxed);
        }

        let event = GatewayEvent::from_payload(payload);
        match &event {
            GatewayEvent::Ready(ready) => {
                session.session_id = Some(ready.session_id.clone());
                session.resume_gateway_url = Some(ready.resume_gateway_url.clone());
                session.established = true;
                info!(session_id = %ready.session_id, user = %ready.user.tag(), "gateway READY");
            }
            GatewayEvent::Resumed => {
                session.established = true;
                info!("gateway session resumed");
            }
            GatewayEvent::HeartbeatRequest => {
                if let Err(e) = send_json(sink, &heartbeat_payload(session.sequence())).await {
                    warn!(error = %e, "failed to send requested heartbeat");
                }
                continue;
            }
            GatewayEvent::HeartbeatAck => debug!("heartbeat acknowledged"),
            GatewayEvent::Reconnect => {
                info!("gateway requested reconnect (op 7)");
                return DisconnectReason::ShouldResume;
            }
            GatewayEvent::InvalidSession(resumable) => {
                warn!(resumable, "session invalidated (op 9)");
                return if *resumable {
                    DisconnectReason::ShouldResume
                } else {
                    DisconnectReason::ShouldReidentify
                };
            }
            _ => {}
        }

        if event_tx.send(event).await.is_err() {
            return DisconnectReason::EventChannelClosed;
        }
    }

    info!("WebSocket stream ended");
    DisconnectReason::ShouldResume
}

// ---------------------------------------------------------------------------
// Payload builders and helpers
// ---------------------------------------------------------------------------

fn identify_payload(config: &GatewayConfig) -> serde_json::Value {
    json!({
        "op": 2,
        "d": {
            "token": config.token,
            "properties": {
                "os": std::env::consts::OS,
                "browser": "galactic-war-bot",
                "device": "galactic-war-bot"
            },
            "intents": config.intents,
        }
    })
}

fn resume_payload(token: &str, session_id: &str, seq: u64) -> serde_json::Value {
    json!({
        "op": 6,
        "d": { "token": token, "session_id": session_id, "seq": seq }
    })
}

fn heartbeat_payload(seq: Option<u64>) -> serde_json::Value {
    json!({ "op": 1, "d": seq })
}

/// Append the API version and encoding unless the URL already carries them.
fn with_gateway_params(url: &str) -> String {
    if url.contains("v=10") {
        url.to_string()
    } else if url.contains('?') {
        format!("{}&v=10&encoding=json", url)
    } else {
        format!("{}/?v=10&encoding=json", url.trim_end_matches('/'))
    }
}

/// What to do after the server closes the socket with `code`.
fn close_reason(code: u16) -> DisconnectReason {
    match code {
        // Authentication failed, invalid shard, sharding required,
        // invalid API version, invalid or disallowed intents.
        4004 | 4010 | 4011 | 4012 | 4013 | 4014 => {
            error!(close_code = code, "unrecoverable gateway close");
            DisconnectReason::Fatal
        }
        // Invalid seq or session timed out.
        4007 | 4009 => DisconnectReason::ShouldReidentify,
        _ => DisconnectReason::ShouldResume,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_interval_is_parsed() {
        let interval =
            parse_hello(r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#)
                .expect("valid HELLO");
        assert_eq!(interval, Duration::from_millis(41250));
    }

    #[test]
    fn non_hello_opcode_is_rejected() {
        let err = parse_hello(r#"{"op":11,"d":null}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Handshake(_)));
        let err = parse_hello(r#"{"op":10,"d":{}}"#).unwrap_err();
        assert!(matches!(err, GatewayError::Handshake(_)));
    }

    #[test]
    fn gateway_params_are_appended_once() {
        assert_eq!(
            with_gateway_params("wss://gateway.discord.gg"),
            "wss://gateway.discord.gg/?v=10&encoding=json"
        );
        assert_eq!(
            with_gateway_params("wss://resume.discord.gg/?foo=1"),
            "wss://resume.discord.gg/?foo=1&v=10&encoding=json"
        );
        assert_eq!(
            with_gateway_params("wss://gateway.discord.gg/?v=10&encoding=json"),
            "wss://gateway.discord.gg/?v=10&encoding=json"
        );
    }

    #[test]
    fn authentication_failure_is_fatal() {
        assert_eq!(close_reason(4004), DisconnectReason::Fatal);
        assert_eq!(close_reason(4014), DisconnectReason::Fatal);
        assert_eq!(close_reason(4009), DisconnectReason::ShouldReidentify);
        assert_eq!(close_reason(1001), DisconnectReason::ShouldResume);
    }

    #[test]
    fn identify_carries_token_and_intents() {
        let config = GatewayConfig {
            token: "sekrit-token-value".to_string(),
            intents: INTENTS_GUILDS,
        };
        let payload = identify_payload(&config);
        assert_eq!(payload["op"], 2);
        assert_eq!(payload["d"]["token"], "sekrit-token-value");
        assert_eq!(payload["d"]["intents"], 1);
        assert!(!format!("{:?}", config).contains("sekrit-token-value"));
    }

    #[test]
    fn heartbeat_sends_null_before_first_dispatch() {
        assert_eq!(heartbeat_payload(None), json!({ "op": 1, "d": null }));
        assert_eq!(heartbeat_payload(Some(42)), json!({ "op": 1, "d": 42 }));
        assert_eq!(resume_payload("t", "s", 7)["d"]["seq"], 7);
    }

    #[test]
    fn session_resumes_only_with_id_and_sequence() {
        let mut session = SessionState::default();
        assert!(!session.can_resume());
        session.session_id = Some("abc".to_string());
        assert!(!session.can_resume());
        session.sequence.store(3, Ordering::Relaxed);
        assert!(session.can_resume());
        session.forget();
        assert!(!session.can_resume());
        assert_eq!(session.connect_url(), "wss://gateway.discord.gg/?v=10&encoding=json");
    }
}
