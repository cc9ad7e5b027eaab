//! The turn engine: game start, questions, power-ups, guesses, turn
//! advancement and the turn countdown.
//!
//! # Turn shape
//!
//! ```text
//! TURN_START ─┬─ use_powerup? ─┬─ ask_question ── answer_question ──┐
//!             │                └─ make_guess (wrong) ───────────────┤
//!             ├─ end_turn ──────────────────────────────────────────┤
//!             └─ countdown expires ─────────────────────────────────┤
//!                                                                   ▼
//!                                                     end_turn → next player
//! ```
//!
//! A double-question turn loops `ask_question → answer_question` twice
//! and never allows a guess. A correct guess leaves the cycle for
//! `GameOver`.
//!
//! Every path that advances the turn goes through [`Room::end_turn`],
//! which cancels the countdown before starting the next one; a path that
//! ends the game cancels it outright.

use guestquest_catalog::CharacterSet;
use guestquest_protocol::{
    PlayerId, PowerUpKind, QuestionId, Recipient, ServerMessage, TurnState,
};
use guestquest_tick::TimerEvent;
use rand::seq::SliceRandom;
use tokio::time::Instant;

use crate::powerup;
use crate::room::{Outbound, PendingQuestion};
use crate::{GameError, GamePhase, Room};

/// Questions allowed in a double-question turn.
const DOUBLE_QUESTION_LIMIT: u32 = 2;

/// A player action routed to a room.
///
/// Mirrors the in-room subset of `ClientMessage`. Room membership
/// messages (`join_room`, `leave_room`) go through dedicated actor
/// commands instead because their callers need a reply.
#[derive(Debug, Clone)]
pub enum RoomAction {
    ToggleReady,
    StartGame,
    AskQuestion { question: String },
    AnswerQuestion { question_id: QuestionId, answer: String },
    UsePowerUp { power_up_type: String },
    MakeGuess { character: String },
    EndTurn,
    /// The set has already been resolved against the catalog.
    ChangeCharacterSet(CharacterSet),
    ReturnToLobby,
}

impl RoomAction {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ToggleReady => "toggle_ready",
            Self::StartGame => "start_game",
            Self::AskQuestion { .. } => "ask_question",
            Self::AnswerQuestion { .. } => "answer_question",
            Self::UsePowerUp { .. } => "use_powerup",
            Self::MakeGuess { .. } => "make_guess",
            Self::EndTurn => "end_turn",
            Self::ChangeCharacterSet(_) => "change_character_set",
            Self::ReturnToLobby => "return_to_lobby",
        }
    }
}

impl Room {
    /// Applies one player action.
    pub fn apply(
        &mut self,
        player_id: PlayerId,
        action: RoomAction,
        now: Instant,
    ) -> Result<Outbound, GameError> {
        match action {
            RoomAction::ToggleReady => self.toggle_ready(player_id),
            RoomAction::StartGame => self.start_game(player_id, now),
            RoomAction::AskQuestion { question } => {
                self.ask_question(player_id, &question)
            }
            RoomAction::AnswerQuestion {
                question_id,
                answer,
            } => self.answer_question(player_id, question_id, &answer, now),
            RoomAction::UsePowerUp { power_up_type } => {
                self.use_power_up(player_id, &power_up_type)
            }
            RoomAction::MakeGuess { character } => {
                self.make_guess(player_id, &character, now)
            }
            RoomAction::EndTurn => self.handle_end_turn(player_id, now),
            RoomAction::ChangeCharacterSet(set) => {
                self.change_character_set(player_id, set)
            }
            RoomAction::ReturnToLobby => self.return_to_lobby(player_id),
        }
    }

    // -----------------------------------------------------------------
    // Game start
    // -----------------------------------------------------------------

    /// Deals characters and starts the first turn.
    ///
    /// Any member may start the game once enough players are present and
    /// (with readiness gating) all of them are ready.
    pub fn start_game(
        &mut self,
        player_id: PlayerId,
        now: Instant,
    ) -> Result<Outbound, GameError> {
        if self.index_of(player_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        if self.phase != GamePhase::Lobby {
            return Err(GameError::GameInProgress);
        }
        if self.players.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers(self.config.min_players));
        }
        if self.config.require_ready && !self.players.iter().all(|p| p.ready) {
            return Err(GameError::PlayersNotReady);
        }
        if self.character_set.characters.len() < self.players.len() {
            return Err(GameError::NotEnoughCharacters);
        }

        let mut deck = self.character_set.characters.clone();
        deck.shuffle(self.rng.as_mut());
        for (player, character) in self.players.iter_mut().zip(deck) {
            player.deal(character);
        }

        self.phase = GamePhase::InGame;
        self.current_turn = 0;
        self.turn_state = TurnState::default();
        self.pending_question = None;
        self.timer.start(now);

        tracing::info!(
            room = %self.code,
            set = %self.character_set.id,
            players = self.players.len(),
            "game started"
        );

        let current_turn = self.players[0].name.clone();
        let names: Vec<String> =
            self.players.iter().map(|p| p.name.clone()).collect();
        let roster: Vec<_> =
            self.character_set.characters.iter().map(|c| c.card()).collect();
        let catalog = PowerUpKind::catalog();

        let out = self
            .players
            .iter()
            .filter_map(|player| {
                let character = player.character.clone()?;
                Some((
                    Recipient::Player(player.id),
                    ServerMessage::GameStarted {
                        your_character: character,
                        current_turn: current_turn.clone(),
                        players: names.clone(),
                        all_characters: roster.clone(),
                        character_set: self.character_set.id.clone(),
                        power_ups: player.power_ups.clone(),
                        available_power_ups: catalog.clone(),
                    },
                ))
            })
            .collect();
        Ok(out)
    }

    // -----------------------------------------------------------------
    // Questions
    // -----------------------------------------------------------------

    /// Asks the opponent a question. The turn does not advance until it
    /// is answered.
    pub fn ask_question(
        &mut self,
        player_id: PlayerId,
        question: &str,
    ) -> Result<Outbound, GameError> {
        let asker = self.require_turn(player_id)?;

        let state = &self.turn_state;
        let limit_reached = if state.double_question_used {
            state.questions_asked_count >= DOUBLE_QUESTION_LIMIT
        } else {
            state.question_asked
        };
        if limit_reached {
            return Err(GameError::QuestionLimitExceeded);
        }
        if self.pending_question.is_some() {
            return Err(GameError::QuestionPending);
        }
        let question = question.trim();
        if question.is_empty() {
            return Err(GameError::EmptyQuestion);
        }

        let target = self.opponent_of(asker);
        let id = QuestionId(self.next_question_id);
        self.next_question_id += 1;
        self.turn_state.question_asked = true;

        let asker = &self.players[asker];
        let target = &self.players[target];
        self.pending_question = Some(PendingQuestion {
            id,
            text: question.to_owned(),
            asker: asker.id,
            target: target.id,
        });
        tracing::debug!(room = %self.code, %id, asker = %asker.name, "question asked");

        Ok(vec![
            (
                Recipient::Player(target.id),
                ServerMessage::QuestionReceived {
                    question: question.to_owned(),
                    asking_player: asker.name.clone(),
                    question_id: id,
                },
            ),
            (
                Recipient::Player(asker.id),
                ServerMessage::QuestionSent {
                    question: question.to_owned(),
                    target_player: target.name.clone(),
                },
            ),
            (
                Recipient::AllExcept(vec![asker.id, target.id]),
                ServerMessage::QuestionPending {
                    asking_player: asker.name.clone(),
                    target_player: target.name.clone(),
                    question: question.to_owned(),
                },
            ),
        ])
    }

    /// Answers the pending question. Ends the turn unless this was the
    /// first question of a double-question turn.
    pub fn answer_question(
        &mut self,
        player_id: PlayerId,
        question_id: QuestionId,
        answer: &str,
        now: Instant,
    ) -> Result<Outbound, GameError> {
        if self.phase != GamePhase::InGame {
            return Err(GameError::GameNotStarted);
        }
        if self.index_of(player_id).is_none() {
            return Err(GameError::NotInRoom);
        }
        let pending = match &self.pending_question {
            Some(p) if p.target == player_id => p,
            _ => return Err(GameError::NoPendingQuestion),
        };
        if pending.id != question_id {
            return Err(GameError::InvalidQuestionId);
        }
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(GameError::EmptyAnswer);
        }

        let Some(pending) = self.pending_question.take() else {
            return Err(GameError::NoPendingQuestion);
        };
        self.turn_state.questions_asked_count += 1;

        let asker_name = self.name_of(pending.asker);
        let mut out = vec![(
            Recipient::All,
            ServerMessage::QuestionAnswered {
                asking_player: asker_name.clone(),
                target_player: self.name_of(pending.target),
                question: pending.text,
                answer: answer.to_owned(),
            },
        )];

        let state = &mut self.turn_state;
        if state.double_question_used
            && state.questions_asked_count < DOUBLE_QUESTION_LIMIT
        {
            state.question_asked = false;
            out.push((
                Recipient::All,
                ServerMessage::DoubleQuestionUsed {
                    player: asker_name.clone(),
                    message: format!("{asker_name} can ask one more question"),
                },
            ));
        } else {
            state.question_asked = true;
            out.extend(self.end_turn(now));
        }
        Ok(out)
    }

    // -----------------------------------------------------------------
    // Power-ups
    // -----------------------------------------------------------------

    /// Spends one use of a power-up and broadcasts its effect.
    ///
    /// Power-ups must come before the turn's question, only one may be
    /// used per turn, and using one blocks power-ups on the player's
    /// next turn.
    pub fn use_power_up(
        &mut self,
        player_id: PlayerId,
        power_up_type: &str,
    ) -> Result<Outbound, GameError> {
        let actor = self.require_turn(player_id)?;

        if self.turn_state.power_up_used {
            return Err(GameError::PowerUpAlreadyUsed);
        }
        if self.turn_state.question_asked {
            return Err(GameError::PowerUpAfterQuestion);
        }
        if self.players[actor].power_up_cooldown {
            return Err(GameError::PowerUpOnCooldown);
        }
        let kind: PowerUpKind = power_up_type
            .parse()
            .map_err(|_| GameError::PowerUpUnavailable)?;
        let remaining = self.players[actor].remaining(kind);
        if remaining == 0 {
            return Err(GameError::PowerUpUnavailable);
        }

        let opponent = self.opponent_of(actor);
        let effect = powerup::resolve(
            kind,
            self.players[opponent].character.as_ref(),
            &self.character_set.characters,
            self.config.elimination_hint_count,
            self.rng.as_mut(),
        );

        let player = &mut self.players[actor];
        player.power_ups.insert(kind, remaining - 1);
        player.power_up_cooldown = true;
        self.turn_state.power_up_used = true;
        if kind == PowerUpKind::DoubleQuestion {
            self.turn_state.double_question_active = true;
            self.turn_state.double_question_used = true;
        }

        let player = &self.players[actor];
        tracing::debug!(room = %self.code, player = %player.name, %kind, "power-up used");
        Ok(vec![
            (
                Recipient::All,
                ServerMessage::PowerupUsed {
                    player: player.name.clone(),
                    power_up_type: kind,
                    power_up_name: kind.display_name().to_owned(),
                    result: effect,
                },
            ),
            (
                Recipient::Player(player.id),
                ServerMessage::PowerupsUpdated {
                    power_ups: player.power_ups.clone(),
                },
            ),
        ])
    }

    // -----------------------------------------------------------------
    // Guessing
    // -----------------------------------------------------------------

    /// Guesses the opponent's character by exact name.
    pub fn make_guess(
        &mut self,
        player_id: PlayerId,
        character: &str,
        now: Instant,
    ) -> Result<Outbound, GameError> {
        let guesser = self.require_turn(player_id)?;

        if self.pending_question.is_some() {
            return Err(GameError::QuestionPending);
        }
        let state = &self.turn_state;
        if state.guess_made
            || state.double_question_active
            || state.double_question_used
        {
            return Err(GameError::GuessNotAllowedThisTurn);
        }

        let opponent = self.opponent_of(guesser);
        let guesser_name = self.players[guesser].name.clone();
        let target = self.players[opponent].character.clone();

        match target {
            Some(target) if target.name == character => {
                self.timer.cancel();
                self.phase = GamePhase::GameOver;
                self.pending_question = None;
                tracing::info!(room = %self.code, winner = %guesser_name, "game over");
                Ok(vec![(
                    Recipient::All,
                    ServerMessage::GameOver {
                        winner: guesser_name,
                        character: character.to_owned(),
                        target_character: target,
                    },
                )])
            }
            _ => {
                self.turn_state.guess_made = true;
                let mut out = vec![(
                    Recipient::All,
                    ServerMessage::GuessMade {
                        player: guesser_name,
                        character: character.to_owned(),
                        correct: false,
                    },
                )];
                out.extend(self.end_turn(now));
                Ok(out)
            }
        }
    }

    // -----------------------------------------------------------------
    // Turn advancement
    // -----------------------------------------------------------------

    /// Voluntarily ends the current player's turn. Discards an
    /// unanswered question.
    pub fn handle_end_turn(
        &mut self,
        player_id: PlayerId,
        now: Instant,
    ) -> Result<Outbound, GameError> {
        self.require_turn(player_id)?;
        Ok(self.end_turn(now))
    }

    /// Passes the turn to the next player and restarts the countdown.
    ///
    /// The ender's cooldown is cleared only if they did not spend a
    /// power-up this turn, so a cooldown always covers the spender's
    /// next full turn.
    pub(crate) fn end_turn(&mut self, now: Instant) -> Outbound {
        self.timer.cancel();

        let ender = self.current_turn;
        if !self.turn_state.power_up_used {
            if let Some(player) = self.players.get_mut(ender) {
                player.power_up_cooldown = false;
            }
        }
        self.turn_state = TurnState::default();
        self.pending_question = None;
        self.current_turn = self.opponent_of(ender);
        self.timer.start(now);

        let current = self.name_of_index(self.current_turn);
        tracing::debug!(room = %self.code, current = %current, "turn changed");
        vec![(
            Recipient::All,
            ServerMessage::TurnChanged {
                current_turn: current,
                turn_actions: self.turn_state,
                time_remaining: self.timer.full_turn_secs(),
            },
        )]
    }

    /// Reacts to the turn countdown.
    ///
    /// A sync becomes `timer_sync`. Expiry becomes a final
    /// `timer_sync{0}`, then `turn_timeout` for the player who ran out
    /// of time, then the usual `turn_changed`.
    pub fn on_timer(&mut self, event: TimerEvent, now: Instant) -> Outbound {
        if self.phase != GamePhase::InGame {
            self.timer.cancel();
            return Vec::new();
        }
        let current = self.name_of_index(self.current_turn);
        match event {
            TimerEvent::Sync { remaining_secs } => vec![(
                Recipient::All,
                ServerMessage::TimerSync {
                    time_remaining: remaining_secs,
                    current_turn: current,
                },
            )],
            TimerEvent::Expired => {
                tracing::info!(room = %self.code, player = %current, "turn timed out");
                let mut out = vec![
                    (
                        Recipient::All,
                        ServerMessage::TimerSync {
                            time_remaining: 0,
                            current_turn: current.clone(),
                        },
                    ),
                    (
                        Recipient::All,
                        ServerMessage::TurnTimeout {
                            message: format!("{current}'s turn timed out"),
                            player: current,
                        },
                    ),
                ];
                out.extend(self.end_turn(now));
                out
            }
        }
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    /// Checks that a game is running and it is `player_id`'s turn.
    /// Returns the player's index.
    fn require_turn(&self, player_id: PlayerId) -> Result<usize, GameError> {
        if self.phase != GamePhase::InGame {
            return Err(GameError::GameNotStarted);
        }
        let index = self.index_of(player_id).ok_or(GameError::NotInRoom)?;
        if index != self.current_turn {
            return Err(GameError::NotYourTurn);
        }
        Ok(index)
    }

    /// The seat after `index` in turn order.
    fn opponent_of(&self, index: usize) -> usize {
        if self.players.is_empty() {
            0
        } else {
            (index + 1) % self.players.len()
        }
    }

    fn name_of(&self, id: PlayerId) -> String {
        self.player(id).map(|p| p.name.clone()).unwrap_or_default()
    }

    fn name_of_index(&self, index: usize) -> String {
        self.players
            .get(index)
            .map(|p| p.name.clone())
            .unwrap_or_default()
    }
}

// =========================================================================
// Tests
// =========================================================================
