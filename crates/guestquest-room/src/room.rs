//! The room aggregate and its lobby lifecycle.
//!
//! A [`Room`] owns everything about one game session: players in join
//! order, the character pool, turn bookkeeping, the pending question and
//! the turn timer. It does no I/O. Every operation returns the messages
//! it wants delivered as an [`Outbound`] list, and the room actor fans
//! them out.
//!
//! Turn-engine operations live in `engine.rs` as a second `impl Room`.

use guestquest_catalog::CharacterSet;
use guestquest_protocol::{
    PlayerId, QuestionId, Recipient, RoomCode, ServerMessage, TurnState,
};
use guestquest_tick::TurnTimer;

use crate::player::validate_name;
use crate::random::GameRng;
use crate::{GameError, GamePhase, Player, RoomConfig};

/// Messages produced by a room operation, with their addressees.
pub type Outbound = Vec<(Recipient, ServerMessage)>;

/// The question currently waiting for an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuestion {
    pub id: QuestionId,
    pub text: String,
    pub asker: PlayerId,
    pub target: PlayerId,
}

/// One game session.
pub struct Room {
    pub(crate) code: RoomCode,
    pub(crate) config: RoomConfig,
    pub(crate) phase: GamePhase,
    pub(crate) players: Vec<Player>,
    /// Copied at creation so catalog reloads don't touch a live room.
    pub(crate) character_set: CharacterSet,
    pub(crate) current_turn: usize,
    pub(crate) turn_state: TurnState,
    pub(crate) pending_question: Option<PendingQuestion>,
    pub(crate) next_question_id: u64,
    pub(crate) timer: TurnTimer,
    pub(crate) rng: GameRng,
}

impl Room {
    pub fn new(
        code: RoomCode,
        character_set: CharacterSet,
        config: RoomConfig,
        rng: GameRng,
    ) -> Self {
        let timer = TurnTimer::new(config.timer_config());
        Self {
            code,
            config,
            phase: GamePhase::Lobby,
            players: Vec::new(),
            character_set,
            current_turn: 0,
            turn_state: TurnState::default(),
            pending_question: None,
            next_question_id: 1,
            timer,
            rng,
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Players in join order (which is also turn order).
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn character_set(&self) -> &CharacterSet {
        &self.character_set
    }

    pub fn turn_state(&self) -> &TurnState {
        &self.turn_state
    }

    pub fn pending_question(&self) -> Option<&PendingQuestion> {
        self.pending_question.as_ref()
    }

    pub fn timer(&self) -> &TurnTimer {
        &self.timer
    }

    /// Mutable timer access for the actor's select loop.
    pub fn timer_mut(&mut self) -> &mut TurnTimer {
        &mut self.timer
    }

    /// The player whose turn it is, while a game is running.
    pub fn current_player(&self) -> Option<&Player> {
        if self.phase == GamePhase::InGame {
            self.players.get(self.current_turn)
        } else {
            None
        }
    }

    /// The room's first player, who may change the character set.
    pub fn host(&self) -> Option<&Player> {
        self.players.first()
    }

    pub fn can_start(&self) -> bool {
        self.players.len() >= self.config.min_players
            && self.players.iter().all(|p| p.ready)
    }

    pub(crate) fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub(crate) fn room_updated(&self) -> ServerMessage {
        ServerMessage::RoomUpdated {
            players: self.players.iter().map(Player::summary).collect(),
            can_start: self.can_start(),
        }
    }

    // -----------------------------------------------------------------
    // Lobby lifecycle
    // -----------------------------------------------------------------

    /// Seats a new player.
    ///
    /// # Errors
    /// `GameInProgress` once a game has started, `RoomFull`,
    /// `InvalidName`, or `DuplicateName` (exact, case-sensitive match).
    pub fn join(
        &mut self,
        player_id: PlayerId,
        name: &str,
    ) -> Result<Outbound, GameError> {
        if !self.phase.is_joinable() {
            return Err(GameError::GameInProgress);
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::RoomFull);
        }
        validate_name(name)?;
        if self.players.iter().any(|p| p.name == name) {
            return Err(GameError::DuplicateName);
        }

        self.players.push(Player::new(player_id, name));
        tracing::info!(
            room = %self.code,
            %player_id,
            name,
            players = self.players.len(),
            "player joined"
        );
        Ok(vec![(Recipient::All, self.room_updated())])
    }

    /// Removes a player. Used for both voluntary leaves and disconnects.
    ///
    /// Leaving mid-game ends the game for everyone else and returns the
    /// room to the lobby. When the last player leaves the timer is
    /// stopped and nothing is emitted; the caller tears the room down.
    pub fn leave(&mut self, player_id: PlayerId) -> Result<Outbound, GameError> {
        let index = self.index_of(player_id).ok_or(GameError::NotInRoom)?;
        let leaver = self.players.remove(index);
        tracing::info!(
            room = %self.code,
            %player_id,
            name = %leaver.name,
            players = self.players.len(),
            "player left"
        );

        if self.players.is_empty() {
            self.timer.cancel();
            return Ok(Vec::new());
        }

        let mut out = vec![(Recipient::All, self.room_updated())];
        match self.phase {
            GamePhase::InGame => {
                self.reset_to_lobby();
                out.push((
                    Recipient::All,
                    ServerMessage::GameEnded {
                        reason: format!("{} left the game", leaver.name),
                    },
                ));
                tracing::info!(room = %self.code, "game ended early");
            }
            GamePhase::GameOver => self.reset_to_lobby(),
            GamePhase::Lobby => {}
        }
        Ok(out)
    }

    /// Flips the player's ready flag.
    pub fn toggle_ready(
        &mut self,
        player_id: PlayerId,
    ) -> Result<Outbound, GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::GameInProgress);
        }
        let index = self.index_of(player_id).ok_or(GameError::NotInRoom)?;
        let player = &mut self.players[index];
        player.ready = !player.ready;
        tracing::debug!(room = %self.code, %player_id, ready = player.ready, "ready toggled");
        Ok(vec![(Recipient::All, self.room_updated())])
    }

    /// Swaps the character pool. Lobby only, host only.
    pub fn change_character_set(
        &mut self,
        player_id: PlayerId,
        set: CharacterSet,
    ) -> Result<Outbound, GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::GameInProgress);
        }
        if self.index_of(player_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        if self.host().map(|p| p.id) != Some(player_id) {
            return Err(GameError::NotHost);
        }

        tracing::info!(room = %self.code, set = %set.id, "character set changed");
        let msg = ServerMessage::CharacterSetChanged {
            character_set: set.id.clone(),
            set_name: set.set_name.clone(),
            character_count: set.characters.len(),
        };
        self.character_set = set;
        Ok(vec![(Recipient::All, msg)])
    }

    /// Brings a finished game back to the lobby. Ready flags are cleared
    /// so both players confirm the rematch.
    pub fn return_to_lobby(
        &mut self,
        player_id: PlayerId,
    ) -> Result<Outbound, GameError> {
        if self.index_of(player_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        match self.phase {
            GamePhase::GameOver => {}
            GamePhase::InGame => return Err(GameError::GameInProgress),
            GamePhase::Lobby => return Err(GameError::GameNotStarted),
        }
        self.reset_to_lobby();
        for player in &mut self.players {
            player.ready = false;
        }
        tracing::info!(room = %self.code, "returned to lobby");
        Ok(vec![(Recipient::All, self.room_updated())])
    }

    /// Stops the game machinery and clears per-game state.
    pub(crate) fn reset_to_lobby(&mut self) {
        self.timer.cancel();
        self.phase = GamePhase::Lobby;
        self.current_turn = 0;
        self.turn_state = TurnState::default();
        self.pending_question = None;
        for player in &mut self.players {
            player.clear_game_state();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::seeded_rng;
    use guestquest_catalog::CharacterCatalog;

    fn room() -> Room {
        let set = CharacterCatalog::builtin().default_set().unwrap().clone();
        Room::new(
            RoomCode("ABC123".into()),
            set,
            RoomConfig::default(),
            seeded_rng(1),
        )
    }

    fn only_message(out: Outbound) -> ServerMessage {
        assert_eq!(out.len(), 1, "expected one message, got {out:?}");
        out.into_iter().next().unwrap().1
    }

    #[test]
    fn test_join_broadcasts_room_updated() {
        let mut room = room();
        let out = room.join(PlayerId(1), "Alice").unwrap();

        assert_eq!(out[0].0, Recipient::All);
        match only_message(out) {
            ServerMessage::RoomUpdated { players, can_start } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].name, "Alice");
                assert!(!players[0].ready);
                assert!(!can_start);
            }
            other => panic!("expected room_updated, got {other:?}"),
        }
    }

    #[test]
    fn test_join_duplicate_name_rejected() {
        let mut room = room();
        room.join(PlayerId(1), "Alice").unwrap();
        assert_eq!(
            room.join(PlayerId(2), "Alice").unwrap_err(),
            GameError::DuplicateName
        );
        // Names are case-sensitive.
        assert!(room.join(PlayerId(2), "alice").is_ok());
    }

    #[test]
    fn test_join_third_player_rejected() {
        let mut room = room();
        room.join(PlayerId(1), "Alice").unwrap();
        room.join(PlayerId(2), "Bob").unwrap();
        assert_eq!(
            room.join(PlayerId(3), "Carol").unwrap_err(),
            GameError::RoomFull
        );
    }

    #[test]
    fn test_join_invalid_name_rejected() {
        let mut room = room();
        assert_eq!(room.join(PlayerId(1), "A!").unwrap_err(), GameError::InvalidName);
        assert!(room.players().is_empty());
    }

    #[test]
    fn test_join_after_start_rejected() {
        let mut room = room();
        room.join(PlayerId(1), "Alice").unwrap();
        room.phase = GamePhase::InGame;
        assert_eq!(
            room.join(PlayerId(2), "Bob").unwrap_err(),
            GameError::GameInProgress
        );
    }

    #[test]
    fn test_toggle_ready_flips_and_updates_can_start() {
        let mut room = room();
        room.join(PlayerId(1), "Alice").unwrap();
        room.join(PlayerId(2), "Bob").unwrap();

        room.toggle_ready(PlayerId(1)).unwrap();
        let out = room.toggle_ready(PlayerId(2)).unwrap();
        assert!(matches!(
            only_message(out),
            ServerMessage::RoomUpdated { can_start: true, .. }
        ));

        room.toggle_ready(PlayerId(1)).unwrap();
        assert!(!room.player(PlayerId(1)).unwrap().ready);
        assert!(!room.can_start());
    }

    #[test]
    fn test_toggle_ready_unknown_player() {
        let mut room = room();
        assert_eq!(
            room.toggle_ready(PlayerId(9)).unwrap_err(),
            GameError::NotInRoom
        );
    }

    #[test]
    fn test_change_character_set_host_only() {
        let catalog = CharacterCatalog::builtin();
        let fantasy = catalog.get_set("fantasy").unwrap().clone();
        let mut room = room();
        room.join(PlayerId(1), "Alice").unwrap();
        room.join(PlayerId(2), "Bob").unwrap();

        assert_eq!(
            room.change_character_set(PlayerId(2), fantasy.clone())
                .unwrap_err(),
            GameError::NotHost
        );

        let out = room.change_character_set(PlayerId(1), fantasy).unwrap();
        match only_message(out) {
            ServerMessage::CharacterSetChanged {
                character_set,
                set_name,
                character_count,
            } => {
                assert_eq!(character_set, "fantasy");
                assert_eq!(set_name, "Fantasy");
                assert_eq!(character_count, 8);
            }
            other => panic!("expected character_set_changed, got {other:?}"),
        }
        assert_eq!(room.character_set().id, "fantasy");
    }

    #[test]
    fn test_leave_in_lobby_broadcasts_room_updated() {
        let mut room = room();
        room.join(PlayerId(1), "Alice").unwrap();
        room.join(PlayerId(2), "Bob").unwrap();

        let out = room.leave(PlayerId(2)).unwrap();
        assert!(matches!(only_message(out), ServerMessage::RoomUpdated { .. }));
        assert_eq!(room.players().len(), 1);
    }

    #[test]
    fn test_leave_last_player_emits_nothing() {
        let mut room = room();
        room.join(PlayerId(1), "Alice").unwrap();
        assert!(room.leave(PlayerId(1)).unwrap().is_empty());
        assert!(room.players().is_empty());
    }

    #[test]
    fn test_leave_unknown_player() {
        let mut room = room();
        assert_eq!(room.leave(PlayerId(5)).unwrap_err(), GameError::NotInRoom);
    }

    #[test]
    fn test_return_to_lobby_requires_game_over() {
        let mut room = room();
        room.join(PlayerId(1), "Alice").unwrap();
        assert_eq!(
            room.return_to_lobby(PlayerId(1)).unwrap_err(),
            GameError::GameNotStarted
        );
        room.phase = GamePhase::InGame;
        assert_eq!(
            room.return_to_lobby(PlayerId(1)).unwrap_err(),
            GameError::GameInProgress
        );
        room.phase = GamePhase::GameOver;
        room.players[0].ready = true;
        room.return_to_lobby(PlayerId(1)).unwrap();
        assert_eq!(room.phase(), GamePhase::Lobby);
        assert!(!room.players()[0].ready);
    }
}
