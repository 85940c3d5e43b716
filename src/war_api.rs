//! Read-only client for the war status API.
//!
//! Every failure mode (transport error, timeout, non-2xx status, unparsable
//! body, unexpected shape) is logged here and collapsed to `None`, so callers
//! only ever see "data" or "unavailable".

use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::payloads::decode_each;

const USER_AGENT: &str = concat!("galactic-war-bot/", env!("CARGO_PKG_VERSION"));

/// The API routes the bot reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    MajorOrders,
    News,
    Campaigns,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Status => "/war/status",
            Endpoint::MajorOrders => "/war/major-orders",
            Endpoint::News => "/war/news",
            Endpoint::Campaigns => "/war/campaign",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },
    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("{url} returned an unparsable body: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Cheap to clone (the inner `reqwest::Client` is reference counted).
#[derive(Debug, Clone)]
pub struct WarClient {
    base_url: String,
    http: reqwest::Client,
}

impl WarClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// GET `url` and parse the body as JSON. `None` means unavailable.
    pub async fn fetch_json(&self, url: &str) -> Option<serde_json::Value> {
        match self.try_fetch_json(url).await {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "war API fetch failed");
                None
            }
        }
    }

    /// Fetch an endpoint and decode it into a typed payload.
    pub async fn fetch<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Option<T> {
        let url = self.url_for(endpoint);
        let value = self.fetch_json(&url).await?;
        match serde_json::from_value(value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(url = %url, error = %e, "war API payload had an unexpected shape");
                None
            }
        }
    }

    /// Fetch an endpoint that returns a JSON array, keeping every element
    /// that decodes. A body that is not an array is unavailable.
    pub async fn fetch_list<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Option<Vec<T>> {
        let url = self.url_for(endpoint);
        match self.fetch_json(&url).await? {
            serde_json::Value::Array(items) => Some(decode_each(items)),
            other => {
                warn!(url = %url, body = %other, "war API returned a non-list payload");
                None
            }
        }
    }

    async fn try_fetch_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        debug!(url, "fetching war API");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        resp.json().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
    }
}
