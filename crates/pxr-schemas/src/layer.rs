//! Persistence layers and the config families that move between them.
//!
//! Configuration flows `CONFIG -> DISK -> MEMORY -> RUNTIME`; the derived `Ord`
//! follows that order. `CONFIG` is the bootstrap file and is only ever a source.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SchemaError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PersistenceLayer {
    Config,
    Disk,
    Memory,
    Runtime,
}

impl PersistenceLayer {
    pub const ALL: [PersistenceLayer; 4] = [
        PersistenceLayer::Config,
        PersistenceLayer::Disk,
        PersistenceLayer::Memory,
        PersistenceLayer::Runtime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersistenceLayer::Config => "CONFIG",
            PersistenceLayer::Disk => "DISK",
            PersistenceLayer::Memory => "MEMORY",
            PersistenceLayer::Runtime => "RUNTIME",
        }
    }

    /// `CONFIG` can be loaded from but never written to.
    pub fn is_read_only(&self) -> bool {
        matches!(self, PersistenceLayer::Config)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferAction {
    Load,
    Save,
}

impl TransferAction {
    pub const ALL: [TransferAction; 2] = [TransferAction::Load, TransferAction::Save];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferAction::Load => "LOAD",
            TransferAction::Save => "SAVE",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    From,
    To,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::From, Direction::To];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::From => "FROM",
            Direction::To => "TO",
        }
    }
}

/// A config family as named by the admin protocol's LOAD/SAVE verbs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfigSettings {
    #[serde(rename = "MYSQL USERS")]
    MysqlUsers,
    #[serde(rename = "MYSQL SERVERS")]
    MysqlServers,
    #[serde(rename = "MYSQL QUERY RULES")]
    MysqlQueryRules,
    #[serde(rename = "MYSQL VARIABLES")]
    MysqlVariables,
    #[serde(rename = "ADMIN VARIABLES")]
    AdminVariables,
    #[serde(rename = "SCHEDULER")]
    Scheduler,
}

impl ConfigSettings {
    pub const ALL: [ConfigSettings; 6] = [
        ConfigSettings::MysqlUsers,
        ConfigSettings::MysqlServers,
        ConfigSettings::MysqlQueryRules,
        ConfigSettings::MysqlVariables,
        ConfigSettings::AdminVariables,
        ConfigSettings::Scheduler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigSettings::MysqlUsers => "MYSQL USERS",
            ConfigSettings::MysqlServers => "MYSQL SERVERS",
            ConfigSettings::MysqlQueryRules => "MYSQL QUERY RULES",
            ConfigSettings::MysqlVariables => "MYSQL VARIABLES",
            ConfigSettings::AdminVariables => "ADMIN VARIABLES",
            ConfigSettings::Scheduler => "SCHEDULER",
        }
    }
}

/// Upper-case and collapse internal whitespace so `"mysql  users"` parses.
fn normalize_token(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase()
}

macro_rules! impl_token_traits {
    ($ty:ty, $what:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = SchemaError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = normalize_token(s);
                <$ty>::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| SchemaError::UnknownToken {
                        what: $what,
                        raw: s.to_string(),
                    })
            }
        }
    };
}

impl_token_traits!(PersistenceLayer, "config layer");
impl_token_traits!(TransferAction, "action");
impl_token_traits!(Direction, "direction");
impl_token_traits!(ConfigSettings, "config settings");
