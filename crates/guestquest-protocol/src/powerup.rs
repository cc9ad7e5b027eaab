//! The fixed power-up catalog and the shape of power-up results.
//!
//! Players can't configure power-ups. Every game starts each player with
//! the same uses per kind, and the catalog is sent to clients in
//! `game_started.availablePowerUps` so they can render names and icons.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use guestquest_catalog::AttributeValue;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// The kinds of power-up a player can spend.
///
/// Serialized in `snake_case` (`"reveal_attribute"`), which is also the
/// key used in the `powerUps` count maps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PowerUpKind {
    /// Reveal one attribute of the opponent's character.
    RevealAttribute,
    /// Name characters that are definitely not the opponent's.
    EliminationHint,
    /// Ask two questions this turn; guessing is blocked for the turn.
    DoubleQuestion,
}

impl PowerUpKind {
    /// Every kind, in catalog order.
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::RevealAttribute,
        PowerUpKind::EliminationHint,
        PowerUpKind::DoubleQuestion,
    ];

    /// The wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RevealAttribute => "reveal_attribute",
            Self::EliminationHint => "elimination_hint",
            Self::DoubleQuestion => "double_question",
        }
    }

    /// Display name, e.g. `"Reveal Attribute"`.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::RevealAttribute => "Reveal Attribute",
            Self::EliminationHint => "Elimination Hint",
            Self::DoubleQuestion => "Double Question",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::RevealAttribute => {
                "Reveal one random attribute of your opponent's character"
            }
            Self::EliminationHint => {
                "Learn two characters that are not your opponent's"
            }
            Self::DoubleQuestion => "Ask two questions this turn (no guessing)",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::RevealAttribute => "🔍",
            Self::EliminationHint => "❌",
            Self::DoubleQuestion => "❓",
        }
    }

    /// Uses each player starts a game with.
    pub fn initial_uses(self) -> u32 {
        1
    }

    /// The catalog entry sent to clients.
    pub fn info(self) -> PowerUpInfo {
        PowerUpInfo {
            name: self.display_name().to_owned(),
            description: self.description().to_owned(),
            icon: self.icon().to_owned(),
            uses: self.initial_uses(),
        }
    }

    /// The full catalog, keyed by kind.
    pub fn catalog() -> BTreeMap<PowerUpKind, PowerUpInfo> {
        Self::ALL.into_iter().map(|kind| (kind, kind.info())).collect()
    }

    /// A fresh per-player counter map: every kind at its initial uses.
    pub fn starting_counts() -> BTreeMap<PowerUpKind, u32> {
        Self::ALL
            .into_iter()
            .map(|kind| (kind, kind.initial_uses()))
            .collect()
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerUpKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                ProtocolError::InvalidMessage(format!("unknown power-up '{s}'"))
            })
    }
}

/// One catalog entry as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpInfo {
    pub name: String,
    pub description: String,
    pub icon: String,
    /// Uses each player starts with.
    pub uses: u32,
}

/// The `result` field of `powerup_used`.
///
/// Internally tagged (`#[serde(tag = "type")]`) so the client can switch
/// on `result.type` without a second level of nesting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PowerUpEffect {
    /// One attribute of the opponent's character.
    RevealAttribute {
        attribute: String,
        value: AttributeValue,
    },
    /// Names of characters guaranteed not to be the opponent's.
    EliminationHint { characters: Vec<String> },
    /// The current turn now allows two questions.
    DoubleQuestion { message: String },
    /// The power-up had nothing to act on (e.g. no attributes).
    NothingToReveal { message: String },
}
