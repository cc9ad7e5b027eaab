//! Identity types, message addressing, and per-turn flags.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player, assigned when they join a room.
///
/// `#[serde(transparent)]` puts the bare number on the wire, so
/// `PlayerId(42)` is just `42` in `room_updated.players[].id`. Ids stay
/// below 2^53 so JavaScript clients read them exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The short code players type in to join a room, e.g. `"K7Q2ZD"`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Normalizes user input: surrounding whitespace is dropped and
    /// letters are upper-cased, so `" k7q2zd"` finds room `K7Q2ZD`.
    pub fn normalize(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one question within a room. Answers must echo it back.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who should receive a server message.
///
/// Turn-engine operations return `Vec<(Recipient, ServerMessage)>`; the
/// room actor resolves each recipient against its player list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every player in the room.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Everyone except the listed players. Used for `question_pending`,
    /// which goes to observers other than the asker and the target.
    AllExcept(Vec<PlayerId>),
}

impl Recipient {
    /// Returns `true` if a message addressed this way reaches `player`.
    pub fn includes(&self, player: PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(p) => *p == player,
            Self::AllExcept(excluded) => !excluded.contains(&player),
        }
    }
}

// ---------------------------------------------------------------------------
// TurnState
// ---------------------------------------------------------------------------

/// What the current player has done so far this turn.
///
/// Reset to `TurnState::default()` at the start of every turn and sent
/// to clients as `turnActions` in `turn_changed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnState {
    pub question_asked: bool,
    pub power_up_used: bool,
    pub guess_made: bool,
    pub double_question_active: bool,
    pub double_question_used: bool,
    pub questions_asked_count: u32,
}
