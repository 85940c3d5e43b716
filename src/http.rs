//! HTTP client for the Discord REST API.
//!
//! All outbound Discord calls go through [`DiscordHttpClient`] so auth
//! headers and error mapping live in one place.

use reqwest::Method;
use thiserror::Error;
use tracing::debug;

use crate::types::*;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DISCORD_API_BASE: &str = "https://discord.com/api/v10";
const USER_AGENT: &str = concat!(
    "DiscordBot (https://github.com/galactic-war-bot, ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HttpError {
    /// Non-success status from Discord.
    #[error("Discord API error {status} on {route}: {body}")]
    Api {
        status: u16,
        body: String,
        route: String,
    },
    /// Transport / network error.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Serialisation error.
    #[error("Serialisation error: {0}")]
    Serde(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// DiscordHttpClient
// ---------------------------------------------------------------------------

/// A thin HTTP client for the Discord REST API.
///
/// Cheap to clone (`reqwest::Client` is reference counted).
#[derive(Clone)]
pub struct DiscordHttpClient {
    token: String,
    base_url: String,
    http: reqwest::Client,
}

impl DiscordHttpClient {
    /// Create a new client with the given bot token.
    pub fn new(token: impl Into<String>) -> Result<Self, HttpError> {
        Self::with_base_url(token, DISCORD_API_BASE)
    }

    /// Point the client at a different API root (used by tests).
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, HttpError> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Send a request to `{base_url}/{path}` and return the raw body.
    ///
    /// `route` is only used for logging and error context.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        route: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Vec<u8>, HttpError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut req = self
            .http
            .request(method, &url)
            .header("authorization", format!("Bot {}", self.token));
        if let Some(json) = body {
            req = req.json(json);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let bytes = resp.bytes().await?;
        debug!(route, status = status.as_u16(), "discord request finished");

        if status.is_success() {
            return Ok(bytes.to_vec());
        }

        Err(HttpError::Api {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&bytes).to_string(),
            route: route.to_string(),
        })
    }

    /// Like [`request`](Self::request) but deserialises the response body as JSON.
    pub async fn request_json<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        route: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, HttpError> {
        let bytes = self.request(method, path, route, body).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    // ------------------------------------------------------------------
    // Interactions
    // ------------------------------------------------------------------

    /// Respond to an interaction (initial response).
    pub async fn create_interaction_response(
        &self,
        interaction_id: &str,
        interaction_token: &str,
        response: &InteractionResponse,
    ) -> Result<(), HttpError> {
        let path = format!(
            "interactions/{}/{}/callback",
            interaction_id, interaction_token
        );
        let body = serde_json::to_value(response)?;
        // Discord answers 204 No Content on success.
        self.request(
            Method::POST,
            &path,
            "POST /interactions/callback",
            Some(&body),
        )
        .await?;
        Ok(())
    }

    /// Replace the content of a deferred (or already sent) initial response.
    pub async fn edit_original_interaction_response(
        &self,
        application_id: &str,
        interaction_token: &str,
        data: &InteractionCallbackData,
    ) -> Result<(), HttpError> {
        let path = format!(
            "webhooks/{}/{}/messages/@original",
            application_id, interaction_token
        );
        let body = serde_json::to_value(data)?;
        self.request(
            Method::PATCH,
            &path,
            "PATCH /webhooks/{application_id}/{token}/messages/@original",
            Some(&body),
        )
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Slash command registration
    // ------------------------------------------------------------------

    /// Register (or overwrite) global application commands.
    pub async fn bulk_overwrite_global_commands(
        &self,
        application_id: &str,
        commands: &[ApplicationCommand],
    ) -> Result<Vec<ApplicationCommand>, HttpError> {
        let path = format!("applications/{}/commands", application_id);
        let body = serde_json::to_value(commands)?;
        self.request_json(
            Method::PUT,
            &path,
            "PUT /applications/{application_id}/commands",
            Some(&body),
        )
        .await
    }
}

impl std::fmt::Debug for DiscordHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordHttpClient")
            .field("token", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
