//! Typed views of the war API payloads.
//!
//! Every model is lenient: missing fields fall back to their defaults so a
//! partially populated response still renders instead of failing to decode.
//! Lists are decoded element by element, and records that do not fit are
//! dropped without taking their siblings with them.
//! Shapes follow `https://helldiverstrainingmanual.com/api/v1/war/*`.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

// ---------------------------------------------------------------------------
// Lenient lists
// ---------------------------------------------------------------------------

/// Decode each element on its own, skipping the ones that do not fit `T`.
pub fn decode_each<T: DeserializeOwned>(items: Vec<serde_json::Value>) -> Vec<T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                debug!(index = i, error = %e, "skipping undecodable list element");
                None
            }
        })
        .collect()
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(decode_each(items.unwrap_or_default()))
}

// ---------------------------------------------------------------------------
// Factions
// ---------------------------------------------------------------------------

/// The warring parties, keyed by the API's numeric owner id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Faction {
    Humans,
    Illuminate,
    Terminids,
    Automatons,
}

impl Faction {
    pub fn from_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(Faction::Humans),
            2 => Some(Faction::Illuminate),
            3 => Some(Faction::Terminids),
            4 => Some(Faction::Automatons),
            _ => None,
        }
    }

    /// Display name used in war status lines.
    pub fn label(self) -> &'static str {
        match self {
            Faction::Humans => "Helldivers",
            Faction::Illuminate => "Illuminate",
            Faction::Terminids => "Bugs",
            Faction::Automatons => "Automaton",
        }
    }
}

/// A planet owner: a known faction, or the raw id when it isn't recognised.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOwner")]
pub enum Owner {
    Faction(Faction),
    Unknown(String),
}

impl Default for Owner {
    fn default() -> Self {
        Owner::Unknown(String::new())
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Faction(faction) => f.write_str(faction.label()),
            Owner::Unknown(raw) => f.write_str(raw),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOwner {
    Id(u64),
    Text(String),
}

impl From<RawOwner> for Owner {
    fn from(raw: RawOwner) -> Self {
        match raw {
            RawOwner::Id(id) => Faction::from_id(id)
                .map(Owner::Faction)
                .unwrap_or_else(|| Owner::Unknown(id.to_string())),
            RawOwner::Text(text) => Owner::Unknown(text),
        }
    }
}

// ---------------------------------------------------------------------------
// War status
// ---------------------------------------------------------------------------

/// `GET /war/status`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarStatus {
    #[serde(default, deserialize_with = "lenient_list")]
    pub planet_status: Vec<PlanetStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanetStatus {
    #[serde(alias = "index", alias = "name")]
    pub planet: PlanetRef,
    #[serde(default)]
    pub owner: Owner,
    #[serde(default)]
    pub health: u64,
    #[serde(default)]
    pub players: u64,
}

/// How the API identifies a planet: by name or by numeric index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PlanetRef {
    Index(u64),
    Name(String),
}

impl fmt::Display for PlanetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanetRef::Index(index) => write!(f, "{}", index),
            PlanetRef::Name(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Campaigns
// ---------------------------------------------------------------------------

/// One entry of `GET /war/campaign`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Campaign {
    Named {
        name: String,
        #[serde(default, rename = "planetIndex")]
        planet_index: Option<u64>,
    },
    Bare(String),
    Other(serde_json::Value),
}

impl Campaign {
    /// Text shown for this campaign in lists.
    pub fn display_name(&self) -> String {
        match self {
            Campaign::Named { name, .. } => name.clone(),
            Campaign::Bare(name) => name.clone(),
            Campaign::Other(raw) => raw.to_string(),
        }
    }

    /// Normalised keys a planet can be matched against.
    pub fn match_keys(&self) -> Vec<String> {
        match self {
            Campaign::Named { name, planet_index } => {
                let mut keys = vec![normalize_key(name)];
                keys.extend(planet_index.map(|i| i.to_string()));
                keys
            }
            Campaign::Bare(name) => vec![normalize_key(name)],
            Campaign::Other(serde_json::Value::Number(n)) => vec![n.to_string()],
            Campaign::Other(_) => Vec::new(),
        }
    }
}

/// Case-insensitive, whitespace-trimmed comparison key.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// ---------------------------------------------------------------------------
// Major orders
// ---------------------------------------------------------------------------

/// One entry of `GET /war/major-orders`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorOrder {
    #[serde(default)]
    pub progress: Vec<u64>,
    #[serde(default)]
    pub setting: OrderSetting,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSetting {
    pub override_title: Option<String>,
    pub override_brief: Option<String>,
    #[serde(default)]
    pub tasks: Vec<OrderTask>,
    pub reward: Option<Reward>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTask {
    #[serde(default)]
    pub values: Vec<u64>,
}

impl OrderTask {
    /// The task's goal; the API stores it in the third value slot.
    pub fn target(&self) -> u64 {
        self.values.get(2).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Reward {
    pub amount: Option<u64>,
}

impl MajorOrder {
    pub fn title(&self) -> Option<&str> {
        non_empty(self.setting.override_title.as_deref())
    }

    pub fn brief(&self) -> Option<&str> {
        non_empty(self.setting.override_brief.as_deref())
    }

    /// `(current, target)` per task, in task order. Missing progress is 0.
    pub fn task_progress(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.setting
            .tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (self.progress.get(i).copied().unwrap_or(0), task.target()))
    }

    pub fn reward_amount(&self) -> Option<u64> {
        self.setting.reward.as_ref().and_then(|r| r.amount)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Dispatches
// ---------------------------------------------------------------------------

/// One entry of `GET /war/news`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dispatch {
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
