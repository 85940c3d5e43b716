//! Pure formatting of war API payloads into chat replies.
//!
//! Every formatter takes `Option`s so "unavailable" and "empty" both land on
//! the same canned literal. Nothing here panics on odd payloads.

use std::collections::HashSet;

use crate::commands::Command;
use crate::loadouts::{self, Loadout};
use crate::payloads::{normalize_key, Campaign, Dispatch, Faction, MajorOrder, WarStatus};
use crate::types::{Embed, InteractionCallbackData, InteractionResponse, EPHEMERAL};

/// Discord rejects message content longer than this many characters.
pub const MESSAGE_LIMIT: usize = 2000;

/// Only this many campaigns take part in war status filtering.
pub const CAMPAIGN_FILTER_LIMIT: usize = 10;

pub const NO_WAR_STATUS: &str = "No war status data available.";
pub const NO_MAJOR_ORDERS: &str = "No major orders available.";
pub const NO_DISPATCHES: &str = "No dispatch messages available.";
pub const NO_DISPATCH_MESSAGE: &str = "No message available.";
pub const NO_CAMPAIGNS: &str = "No active campaigns available.";
pub const NO_LOADOUTS: &str = "No loadouts available for that front.";

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// What a command answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Embed(Embed),
    /// Only visible to the user who ran the command.
    Ephemeral(String),
}

impl Reply {
    /// Plain text capped at [`MESSAGE_LIMIT`].
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(truncate(text.into(), MESSAGE_LIMIT))
    }

    pub fn into_response(self) -> InteractionResponse {
        InteractionResponse::message(self.into_data())
    }

    /// Message body, usable both as an initial response and as an edit.
    pub fn into_data(self) -> InteractionCallbackData {
        match self {
            Reply::Text(text) => InteractionCallbackData {
                content: Some(text),
                ..Default::default()
            },
            Reply::Embed(embed) => InteractionCallbackData {
                embeds: Some(vec![embed]),
                ..Default::default()
            },
            Reply::Ephemeral(text) => InteractionCallbackData {
                content: Some(truncate(text, MESSAGE_LIMIT)),
                flags: Some(EPHEMERAL),
                ..Default::default()
            },
        }
    }
}

fn truncate(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    let mut cut: String = text.chars().take(limit - 1).collect();
    cut.push('…');
    cut
}

/// `1234567` → `"1,234,567"`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// War status
// ---------------------------------------------------------------------------

/// Planets under active campaign, one line each, in `planetStatus` order.
pub fn war_status(status: Option<&WarStatus>, campaigns: Option<&[Campaign]>) -> String {
    let (Some(status), Some(campaigns)) = (status, campaigns) else {
        return NO_WAR_STATUS.to_string();
    };
    if status.planet_status.is_empty() || campaigns.is_empty() {
        return NO_WAR_STATUS.to_string();
    }

    let active: HashSet<String> = campaigns
        .iter()
        .take(CAMPAIGN_FILTER_LIMIT)
        .flat_map(Campaign::match_keys)
        .collect();

    let lines: Vec<String> = status
        .planet_status
        .iter()
        .filter(|p| active.contains(&normalize_key(&p.planet.to_string())))
        .map(|p| {
            format!(
                "Planet {} | Owner {} | Health {} | Players {}",
                p.planet,
                p.owner,
                group_thousands(p.health),
                group_thousands(p.players)
            )
        })
        .collect();

    if lines.is_empty() {
        return NO_WAR_STATUS.to_string();
    }

    format!("🌌 Galactic War Status (active campaigns):\n{}", lines.join("\n"))
}

// ---------------------------------------------------------------------------
// Major orders
// ---------------------------------------------------------------------------

/// The first major order with per-task progress and an optional reward.
pub fn major_order(orders: Option<&[MajorOrder]>) -> String {
    let Some(order) = orders.and_then(|o| o.first()) else {
        return NO_MAJOR_ORDERS.to_string();
    };

    let title = order.title().unwrap_or("Major Order");
    let brief = order.brief().unwrap_or("No brief available.");

    let mut text = format!("📜 {}:\n{}\n\nProgress:", title, brief);
    for (i, (current, target)) in order.task_progress().enumerate() {
        text.push_str(&format!(
            "\n• Task {}: {}/{}",
            i + 1,
            group_thousands(current),
            group_thousands(target)
        ));
    }
    if let Some(amount) = order.reward_amount() {
        text.push_str(&format!("\n\nRewards: Warbond Medals: {}", group_thousands(amount)));
    }
    text
}

// ---------------------------------------------------------------------------
// Dispatches
// ---------------------------------------------------------------------------

/// The most recent dispatch, i.e. the last element of the feed.
pub fn latest_dispatch(dispatches: Option<&[Dispatch]>) -> String {
    let Some(latest) = dispatches.and_then(|d| d.last()) else {
        return NO_DISPATCHES.to_string();
    };
    let message = latest
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(render_markup)
        .unwrap_or_else(|| NO_DISPATCH_MESSAGE.to_string());
    format!("📢 Latest Dispatch:\n{}", message)
}

/// Turn the API's `<i=N>highlight</i>` markup into Discord bold.
fn render_markup(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find("<i=") {
        out.push_str(&rest[..start]);
        let after = &rest[start..];
        match after.find('>') {
            Some(end) => {
                out.push_str("**");
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(after);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out.replace("</i>", "**")
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

pub fn campaigns(campaigns: Option<&[Campaign]>) -> String {
    let Some(campaigns) = campaigns.filter(|c| !c.is_empty()) else {
        return NO_CAMPAIGNS.to_string();
    };
    let list: Vec<String> = campaigns
        .iter()
        .map(|c| format!("• {}", c.display_name()))
        .collect();
    format!("🎖️ Active Campaigns:\n{}", list.join("\n"))
}

// ---------------------------------------------------------------------------
// Loadouts and help
// ---------------------------------------------------------------------------

pub fn loadout(faction: Faction, picked: Option<&Loadout>) -> Reply {
    match picked {
        Some(entry) => Reply::Embed(loadouts::loadout_embed(faction, entry)),
        None => Reply::text(NO_LOADOUTS),
    }
}

pub fn help_text() -> String {
    let mut text = String::from("🤖 **Available Commands:**");
    for cmd in Command::ALL {
        text.push_str(&format!("\n• `{}` — {}", cmd, cmd.description()));
    }
    text
}

pub fn unknown_command(name: &str) -> Reply {
    Reply::Ephemeral(format!("Unknown command `/{}`. Try `/help`.", name))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
