//! Client and server messages.
//!
//! Both enums are *adjacently tagged*:
//!
//! ```text
//! { "type": "ask_question", "payload": { "question": "Glasses?" } }
//! ```
//!
//! `rename_all = "snake_case"` turns variant names into the `type` tag and
//! `rename_all_fields = "camelCase"` turns field names into the payload
//! keys the browser client uses (`roomCode`, `questionId`, ...).
//!
//! Messages with no fields are written as empty struct variants
//! (`StartGame {}`) so that the client's `"payload": {}` decodes.

use std::collections::BTreeMap;

use guestquest_catalog::{Character, CharacterCard};
use serde::{Deserialize, Serialize};

use crate::{PlayerId, PowerUpEffect, PowerUpInfo, PowerUpKind, QuestionId, RoomCode, TurnState};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Open a new room. An unknown or missing set falls back to `classic`.
    CreateRoom {
        #[serde(default)]
        character_set: Option<String>,
    },

    JoinRoom {
        room_code: String,
        player_name: String,
    },

    /// Flip the sender's ready flag. The `ready` value is accepted for
    /// compatibility and ignored.
    ToggleReady {
        #[serde(default)]
        ready: Option<bool>,
    },

    StartGame {},

    AskQuestion {
        question: String,
    },

    AnswerQuestion {
        answer: String,
        question_id: QuestionId,
    },

    /// Spend a power-up. Kept as a raw string so that an unknown kind is
    /// a game-level rejection rather than a malformed message.
    UsePowerup {
        power_up_type: String,
    },

    MakeGuess {
        character: String,
    },

    EndTurn {},

    LeaveRoom {},

    ChangeCharacterSet {
        character_set: String,
    },

    /// After `game_over`, bring the room back to the lobby.
    ReturnToLobby {},

    ListCharacterSets {},
}

impl ClientMessage {
    /// The wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::ToggleReady { .. } => "toggle_ready",
            Self::StartGame {} => "start_game",
            Self::AskQuestion { .. } => "ask_question",
            Self::AnswerQuestion { .. } => "answer_question",
            Self::UsePowerup { .. } => "use_powerup",
            Self::MakeGuess { .. } => "make_guess",
            Self::EndTurn {} => "end_turn",
            Self::LeaveRoom {} => "leave_room",
            Self::ChangeCharacterSet { .. } => "change_character_set",
            Self::ReturnToLobby {} => "return_to_lobby",
            Self::ListCharacterSets {} => "list_character_sets",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// One row of the lobby's player list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
}

/// Everything the server may push to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "snake_case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    // -- Lobby --
    RoomCreated {
        room_code: RoomCode,
        available_character_sets: Vec<String>,
    },

    RoomUpdated {
        players: Vec<PlayerSummary>,
        can_start: bool,
    },

    CharacterSetChanged {
        character_set: String,
        set_name: String,
        character_count: usize,
    },

    CharacterSets {
        sets: BTreeMap<String, String>,
    },

    LeftRoom {
        success: bool,
    },

    // -- Game start --
    /// Private to each player: only `your_character` carries attributes.
    GameStarted {
        your_character: Character,
        current_turn: String,
        players: Vec<String>,
        all_characters: Vec<CharacterCard>,
        character_set: String,
        power_ups: BTreeMap<PowerUpKind, u32>,
        available_power_ups: BTreeMap<PowerUpKind, PowerUpInfo>,
    },

    // -- Questions --
    /// To the target only.
    QuestionReceived {
        question: String,
        asking_player: String,
        question_id: QuestionId,
    },

    /// To the asker only.
    QuestionSent {
        question: String,
        target_player: String,
    },

    /// To observers other than the asker and the target.
    QuestionPending {
        asking_player: String,
        target_player: String,
        question: String,
    },

    QuestionAnswered {
        asking_player: String,
        target_player: String,
        question: String,
        answer: String,
    },

    DoubleQuestionUsed {
        player: String,
        message: String,
    },

    // -- Turns and timer --
    TurnChanged {
        current_turn: String,
        turn_actions: TurnState,
        time_remaining: u64,
    },

    TurnTimeout {
        player: String,
        message: String,
    },

    TimerSync {
        time_remaining: u64,
        current_turn: String,
    },

    // -- Power-ups --
    PowerupUsed {
        player: String,
        power_up_type: PowerUpKind,
        power_up_name: String,
        result: PowerUpEffect,
    },

    /// To the actor only, after spending a power-up.
    PowerupsUpdated {
        power_ups: BTreeMap<PowerUpKind, u32>,
    },

    // -- Guessing and game end --
    GuessMade {
        player: String,
        character: String,
        correct: bool,
    },

    GameOver {
        winner: String,
        character: String,
        target_character: Character,
    },

    GameEnded {
        reason: String,
    },

    Error {
        message: String,
    },
}

impl ServerMessage {
    /// Shorthand for `ServerMessage::Error { message }`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
