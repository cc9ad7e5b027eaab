//! Room configuration and lifecycle phase.

use std::time::Duration;

use guestquest_tick::TimerConfig;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration shared by every room the registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum players required to start the game.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Time a player has to act before the turn is forced over.
    pub turn_duration: Duration,

    /// How often `timer_sync` is broadcast during a turn.
    pub sync_interval: Duration,

    /// Whether every player must be ready before `start_game` succeeds.
    pub require_ready: bool,

    /// How many characters an elimination hint names.
    pub elimination_hint_count: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 2,
            turn_duration: Duration::from_secs(60),
            sync_interval: Duration::from_secs(1),
            require_ready: true,
            elimination_hint_count: 2,
        }
    }
}

impl RoomConfig {
    /// The timer settings derived from this config.
    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            turn_duration: self.turn_duration,
            sync_interval: self.sync_interval,
        }
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// Where a room is in its lifecycle.
///
/// ```text
///            start_game              correct guess
///   Lobby ───────────────→ InGame ─────────────────→ GameOver
///     ↑                      │                          │
///     └──── player leaves ───┘                          │
///     └────────── return_to_lobby / player leaves ──────┘
/// ```
///
/// - **Lobby**: players join, toggle ready, and the host may change the
///   character set.
/// - **InGame**: turns are running and the countdown is live.
/// - **GameOver**: someone guessed correctly. The result stays on screen
///   until a player returns the room to the lobby or leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Lobby,
    InGame,
    GameOver,
}

impl GamePhase {
    /// Returns `true` if new players may join.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    /// Returns `true` once `start_game` has succeeded and until the room
    /// goes back to the lobby.
    pub fn is_started(&self) -> bool {
        matches!(self, Self::InGame | Self::GameOver)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::InGame => write!(f, "InGame"),
            Self::GameOver => write!(f, "GameOver"),
        }
    }
}
