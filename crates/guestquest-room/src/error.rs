//! Error types for the room layer.
//!
//! Every variant's `Display` text is what the offending client sees in
//! `error{message}`, so the wording is written for players, not logs.

/// Errors that can occur during room and turn operations.
///
/// None of these are fatal: the action is rejected, room state is left
/// unchanged, and the player may try something else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    // -- Turn and action rules --
    #[error("It's not your turn")]
    NotYourTurn,

    #[error("You have already asked all your questions this turn")]
    QuestionLimitExceeded,

    #[error("Waiting for the current question to be answered")]
    QuestionPending,

    #[error("Question cannot be empty")]
    EmptyQuestion,

    #[error("Answer cannot be empty")]
    EmptyAnswer,

    /// No uses left, or an unknown power-up kind.
    #[error("Power-up not available")]
    PowerUpUnavailable,

    #[error("You used a power-up last turn; wait a turn before using another")]
    PowerUpOnCooldown,

    #[error("You have already used a power-up this turn")]
    PowerUpAlreadyUsed,

    #[error("Power-ups must be used before asking a question")]
    PowerUpAfterQuestion,

    #[error("You can't make a guess this turn")]
    GuessNotAllowedThisTurn,

    #[error("That question is no longer awaiting an answer")]
    InvalidQuestionId,

    #[error("There is no question for you to answer")]
    NoPendingQuestion,

    // -- Game lifecycle --
    #[error("The game is not in progress")]
    GameNotStarted,

    #[error("Game has already started")]
    GameInProgress,

    #[error("Need at least {0} players to start")]
    NotEnoughPlayers(usize),

    #[error("All players must be ready to start")]
    PlayersNotReady,

    #[error("This character set has too few characters for every player")]
    NotEnoughCharacters,

    // -- Rooms and sessions --
    #[error("Room not found")]
    RoomNotFound,

    #[error("A player with this name is already in the room")]
    DuplicateName,

    #[error("You are already in a room. Leave your current room first.")]
    AlreadyInRoom,

    #[error("Room is full")]
    RoomFull,

    #[error("Name must be 3-20 letters or digits")]
    InvalidName,

    #[error("You are not in a room")]
    NotInRoom,

    #[error("Unknown character set '{0}'")]
    InvalidCharacterSet(String),

    #[error("Only the room host can do that")]
    NotHost,

    /// The room's actor task is gone (shut down or crashed).
    #[error("Room is no longer available")]
    Unavailable,
}

impl From<guestquest_session::SessionError> for GameError {
    fn from(err: guestquest_session::SessionError) -> Self {
        match err {
            guestquest_session::SessionError::AlreadyInRoom(..) => Self::AlreadyInRoom,
            guestquest_session::SessionError::NotInRoom(_) => Self::NotInRoom,
        }
    }
}
