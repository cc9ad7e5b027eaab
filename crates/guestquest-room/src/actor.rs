//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel, so no two commands ever mutate the same room at once.
//! The actor also owns the room's turn countdown: it selects over the
//! command channel and the timer, so a timer event is handled exactly like
//! a command, on the same task and never concurrently with one.

use std::collections::HashMap;

use guestquest_catalog::CharacterSet;
use guestquest_protocol::{PlayerId, RoomCode, ServerMessage};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::random::GameRng;
use crate::room::Outbound;
use crate::{GameError, GamePhase, Room, RoomAction, RoomConfig};

/// Default command channel size for room actors.
pub(crate) const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Channel sender for delivering outbound messages to a player's
/// connection handler.
pub type PlayerSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
pub(crate) enum RoomCommand {
    /// Seat a new player.
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), GameError>>,
    },

    /// Remove a player. Replies with the number of players left; the
    /// actor stops once that reaches zero.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<usize, GameError>>,
    },

    /// Apply an in-room action. Rejections go back to the player as
    /// `error{message}`.
    Action {
        player_id: PlayerId,
        action: RoomAction,
    },

    /// Request a room summary.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Stop the actor if nobody is seated. Replies whether it stopped.
    Close { reply: oneshot::Sender<bool> },

    /// Stop the actor and its countdown.
    Shutdown,
}

/// A snapshot of room metadata (not the game state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub code: RoomCode,
    pub phase: GamePhase,
    pub player_count: usize,
    pub max_players: usize,
    /// Id of the room's current character set.
    pub character_set: String,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it's just an `mpsc::Sender` wrapper. The
/// [`GameRegistry`](crate::GameRegistry) holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Seats a player. `sender` receives every message addressed to them
    /// from now on, starting with the `room_updated` for this join.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            player_id,
            name: name.into(),
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| GameError::Unavailable)?
    }

    /// Removes a player and returns how many remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            player_id,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| GameError::Unavailable)?
    }

    /// Sends an in-room action (fire-and-forget).
    pub async fn send_action(
        &self,
        player_id: PlayerId,
        action: RoomAction,
    ) -> Result<(), GameError> {
        self.send(RoomCommand::Action { player_id, action }).await
    }

    /// Requests the current room info.
    pub async fn get_info(&self) -> Result<RoomInfo, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::GetInfo { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// Stops the room if it has no players. Returns `true` when it did.
    pub async fn close(&self) -> Result<bool, GameError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Close { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| GameError::Unavailable)
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), GameError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, command: RoomCommand) -> Result<(), GameError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| GameError::Unavailable)
    }
}

#[cfg(test)]
impl RoomHandle {
    /// A handle whose commands are read by the caller instead of an actor.
    pub(crate) fn unattended(code: RoomCode) -> (Self, mpsc::Receiver<RoomCommand>) {
        let (sender, receiver) = mpsc::channel(1);
        (Self { code, sender }, receiver)
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown, until the room empties, or until
    /// every handle is gone.
    async fn run(mut self) {
        tracing::info!(room = %self.room.code, "room actor started");

        loop {
            tokio::select! {
                command = self.receiver.recv() => {
                    let Some(command) = command else { break };
                    if !self.handle_command(command) {
                        break;
                    }
                }
                event = self.room.timer.wait() => {
                    let out = self.room.on_timer(event, Instant::now());
                    self.dispatch(out);
                }
            }
        }

        self.room.timer.cancel();
        tracing::info!(room = %self.room.code, "room actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle_command(&mut self, command: RoomCommand) -> bool {
        match command {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = self.room.join(player_id, &name).map(|out| {
                    self.senders.insert(player_id, sender);
                    self.dispatch(out);
                });
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player_id, reply } => {
                let result = self.room.leave(player_id).map(|out| {
                    self.senders.remove(&player_id);
                    self.dispatch(out);
                    self.room.players().len()
                });
                let emptied = matches!(result, Ok(0));
                let _ = reply.send(result);
                if emptied {
                    tracing::info!(room = %self.room.code, "last player left");
                    return false;
                }
            }
            RoomCommand::Action { player_id, action } => {
                self.handle_action(player_id, action);
            }
            RoomCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::Close { reply } => {
                let empty = self.room.players().is_empty();
                let _ = reply.send(empty);
                if empty {
                    tracing::info!(room = %self.room.code, "closing empty room");
                    return false;
                }
            }
            RoomCommand::Shutdown => {
                tracing::info!(room = %self.room.code, "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_action(&mut self, player_id: PlayerId, action: RoomAction) {
        let kind = action.kind();
        match self.room.apply(player_id, action, Instant::now()) {
            Ok(out) => self.dispatch(out),
            Err(error) => {
                tracing::debug!(
                    room = %self.room.code,
                    %player_id,
                    action = kind,
                    %error,
                    "action rejected"
                );
                self.send_to(player_id, ServerMessage::error(error.to_string()));
            }
        }
    }

    /// Dispatches outbound messages to the players they address.
    fn dispatch(&self, out: Outbound) {
        for (recipient, msg) in out {
            for player in self.room.players() {
                if recipient.includes(player.id) {
                    self.send_to(player.id, msg.clone());
                }
            }
        }
    }

    /// Sends a message to a single player. Silently drops it if the
    /// receiver is gone (player disconnected).
    fn send_to(&self, player_id: PlayerId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            code: self.room.code.clone(),
            phase: self.room.phase,
            player_count: self.room.players.len(),
            max_players: self.room.config.max_players,
            character_set: self.room.character_set.id.clone(),
        }
    }
}

/// Spawns a new room actor task and returns a handle to communicate with
/// it.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub(crate) fn spawn_room(
    code: RoomCode,
    character_set: CharacterSet,
    config: RoomConfig,
    rng: GameRng,
    channel_size: usize,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        room: Room::new(code.clone(), character_set, config, rng),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
