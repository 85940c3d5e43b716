//! The closed set of slash commands the bot answers.
//!
//! Registration payloads are derived from [`Command::ALL`], so every command
//! Discord knows about has a handler arm in [`crate::handlers`].

use std::fmt;

use crate::payloads::Faction;
use crate::types::ApplicationCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    War,
    Orders,
    Dispatch,
    Campaigns,
    BugLoadout,
    BotLoadout,
    Help,
}

impl Command {
    pub const ALL: [Command; 7] = [
        Command::War,
        Command::Orders,
        Command::Dispatch,
        Command::Campaigns,
        Command::BugLoadout,
        Command::BotLoadout,
        Command::Help,
    ];

    /// Exact-match lookup of a registered command name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|cmd| cmd.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::War => "war",
            Command::Orders => "orders",
            Command::Dispatch => "dispatch",
            Command::Campaigns => "campaigns",
            Command::BugLoadout => "loadout-bugs",
            Command::BotLoadout => "loadout-bots",
            Command::Help => "help",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::War => "Show current galactic war status",
            Command::Orders => "Show current major orders",
            Command::Dispatch => "Show latest dispatch message",
            Command::Campaigns => "Show active campaigns",
            Command::BugLoadout => "Get a random loadout for fighting the Terminids",
            Command::BotLoadout => "Get a random loadout for fighting the Automatons",
            Command::Help => "Show available commands",
        }
    }

    /// Whether answering needs a round trip to the war API.
    pub fn fetches_war_data(self) -> bool {
        matches!(
            self,
            Command::War | Command::Orders | Command::Dispatch | Command::Campaigns
        )
    }

    /// The enemy faction a loadout command draws from.
    pub fn loadout_faction(self) -> Option<Faction> {
        match self {
            Command::BugLoadout => Some(Faction::Terminids),
            Command::BotLoadout => Some(Faction::Automatons),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Returns the list of slash commands to register with Discord.
pub fn slash_commands() -> Vec<ApplicationCommand> {
    Command::ALL
        .iter()
        .map(|cmd| ApplicationCommand::chat_input(cmd.name(), cmd.description()))
        .collect()
}
