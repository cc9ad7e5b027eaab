//! Game registry: creates, tracks, and routes connections to rooms.
//!
//! The registry's maps sit behind one lock that is only held for lookups
//! and bookkeeping. Anything that waits on a room actor (joins, leaves,
//! actions, info) clones the room's handle, releases the lock, and then
//! awaits, so a slow room never stalls the others.

use std::collections::HashMap;
use std::sync::Arc;

use guestquest_catalog::CharacterSet;
use guestquest_protocol::{PlayerId, RoomCode};
use guestquest_session::{ConnectionRegistry, SessionInfo, generate_player_id};
use guestquest_transport::ConnectionId;
use rand::Rng;
use tokio::sync::Mutex;

use crate::actor::{DEFAULT_CHANNEL_SIZE, spawn_room};
use crate::random::{GameRng, os_rng};
use crate::{GameError, PlayerSender, RoomAction, RoomConfig, RoomHandle, RoomInfo};

/// Characters a room code is drawn from.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of a room code.
const CODE_LEN: usize = 6;

/// Builds the generator for each new room.
pub type RandomFactory = Arc<dyn Fn() -> GameRng + Send + Sync>;

/// Owns every live room and knows which connection plays where.
///
/// This is the entry point for room operations from the protocol router.
/// The server keeps one registry for its whole lifetime and calls
/// [`shutdown_all`](Self::shutdown_all) on the way out.
pub struct GameRegistry {
    state: Mutex<RegistryState>,
    config: RoomConfig,
    random: RandomFactory,
}

#[derive(Default)]
struct RegistryState {
    /// Live rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Connection → (room, player). A connection is in at most one room.
    connections: ConnectionRegistry,

    /// Creator → the room they created that nobody has joined yet.
    unclaimed: HashMap<ConnectionId, RoomCode>,
}

impl RegistryState {
    /// Drops a room from every index.
    fn forget(&mut self, code: &RoomCode) -> Option<RoomHandle> {
        self.unclaimed.retain(|_, unclaimed| unclaimed != code);
        self.rooms.remove(code)
    }
}

impl GameRegistry {
    /// Creates an empty registry whose rooms shuffle with OS entropy.
    pub fn new(config: RoomConfig) -> Self {
        Self::with_random(config, Arc::new(os_rng))
    }

    /// Creates an empty registry whose rooms draw from `random()`.
    pub fn with_random(config: RoomConfig, random: RandomFactory) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            config,
            random,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Spawns a room playing `character_set` and returns its code.
    ///
    /// The creator is not seated; they join with `join_room` like anyone
    /// else. Until someone does, the room belongs to `creator`: it is
    /// closed when the creator disconnects or creates another room.
    pub async fn create_room(
        &self,
        creator: ConnectionId,
        character_set: CharacterSet,
    ) -> RoomCode {
        let set_id = character_set.id.clone();
        let (code, previous) = {
            let mut state = self.state.lock().await;
            let code = unused_code(&state.rooms);
            let handle = spawn_room(
                code.clone(),
                character_set,
                self.config.clone(),
                (self.random)(),
                DEFAULT_CHANNEL_SIZE,
            );
            state.rooms.insert(code.clone(), handle);
            let previous = state.unclaimed.insert(creator, code.clone());
            tracing::info!(room = %code, set = %set_id, rooms = state.rooms.len(), "room created");
            (code, previous)
        };

        if let Some(previous) = previous {
            self.close_if_empty(&previous).await;
        }
        code
    }

    /// Seats the connection in a room under `name`.
    ///
    /// # Errors
    /// `RoomNotFound`, `AlreadyInRoom`, then whatever the room rejects
    /// the join with (`GameInProgress`, `RoomFull`, `InvalidName`,
    /// `DuplicateName`).
    pub async fn join_room(
        &self,
        connection: ConnectionId,
        code: &RoomCode,
        name: &str,
        sender: PlayerSender,
    ) -> Result<PlayerId, GameError> {
        let handle = {
            let state = self.state.lock().await;
            let handle = state.rooms.get(code).cloned().ok_or(GameError::RoomNotFound)?;
            if state.connections.is_bound(connection) {
                return Err(GameError::AlreadyInRoom);
            }
            handle
        };

        let player_id = generate_player_id();
        match handle.join(player_id, name, sender).await {
            Ok(()) => {}
            Err(GameError::Unavailable) => {
                // The actor stopped (emptied or closed) after the lookup.
                self.destroy_room(code).await;
                return Err(GameError::RoomNotFound);
            }
            Err(error) => return Err(error),
        }

        let mut state = self.state.lock().await;
        state.unclaimed.retain(|_, unclaimed| unclaimed != code);
        state.connections.bind(connection, code.clone(), player_id)?;
        Ok(player_id)
    }

    /// Removes the connection from its room. The room is torn down when
    /// its last player leaves.
    pub async fn leave_room(&self, connection: ConnectionId) -> Result<(), GameError> {
        let (session, handle) = {
            let mut state = self.state.lock().await;
            let session = state.connections.unbind(connection)?;
            let handle = state.rooms.get(&session.room_code).cloned();
            (session, handle)
        };

        let Some(handle) = handle else {
            return Ok(());
        };
        match handle.leave(session.player_id).await {
            Ok(0) | Err(GameError::Unavailable) => {
                self.destroy_room(&session.room_code).await;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// Cleans up after a closed connection: closes the room it created if
    /// nobody joined it, then leaves the room it plays in, if any.
    pub async fn disconnect(&self, connection: ConnectionId) -> Result<(), GameError> {
        let created = self.state.lock().await.unclaimed.remove(&connection);
        if let Some(code) = created {
            self.close_if_empty(&code).await;
        }

        match self.leave_room(connection).await {
            Ok(()) | Err(GameError::NotInRoom) => Ok(()),
            Err(error) => Err(error),
        }
    }

    /// Routes an in-room action from a connection to its room.
    pub async fn route(
        &self,
        connection: ConnectionId,
        action: RoomAction,
    ) -> Result<(), GameError> {
        let (player_id, handle) = {
            let state = self.state.lock().await;
            let session = state
                .connections
                .lookup(connection)
                .ok_or(GameError::NotInRoom)?;
            let handle = state
                .rooms
                .get(&session.room_code)
                .cloned()
                .ok_or(GameError::RoomNotFound)?;
            (session.player_id, handle)
        };
        handle.send_action(player_id, action).await
    }

    /// Where the connection is currently playing, if anywhere.
    pub async fn session(&self, connection: ConnectionId) -> Option<SessionInfo> {
        self.state.lock().await.connections.lookup(connection).cloned()
    }

    /// Returns info about a specific room.
    pub async fn room_info(&self, code: &RoomCode) -> Result<RoomInfo, GameError> {
        let handle = self
            .state
            .lock()
            .await
            .rooms
            .get(code)
            .cloned()
            .ok_or(GameError::RoomNotFound)?;
        handle.get_info().await
    }

    /// Returns the number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.state.lock().await.rooms.len()
    }

    /// Stops every room actor and forgets every connection.
    pub async fn shutdown_all(&self) {
        let handles: Vec<RoomHandle> = {
            let mut state = self.state.lock().await;
            state.connections = ConnectionRegistry::new();
            state.unclaimed.clear();
            state.rooms.drain().map(|(_, handle)| handle).collect()
        };
        for handle in handles {
            let _ = handle.shutdown().await;
            tracing::info!(room = %handle.code(), "room destroyed");
        }
    }

    /// Closes a room if nobody is seated in it.
    async fn close_if_empty(&self, code: &RoomCode) {
        let handle = self.state.lock().await.rooms.get(code).cloned();
        let Some(handle) = handle else {
            return;
        };
        match handle.close().await {
            Ok(true) | Err(GameError::Unavailable) => self.destroy_room(code).await,
            Ok(false) => {}
            Err(error) => {
                tracing::debug!(room = %code, %error, "close failed");
            }
        }
    }

    /// Forgets a room and stops its actor if it is still running.
    async fn destroy_room(&self, code: &RoomCode) {
        let (handle, remaining) = {
            let mut state = self.state.lock().await;
            let handle = state.forget(code);
            (handle, state.rooms.len())
        };
        if let Some(handle) = handle {
            // Already stopped when it emptied itself; that send just fails.
            let _ = handle.shutdown().await;
            tracing::info!(room = %code, rooms = remaining, "room destroyed");
        }
    }
}

/// Draws codes until one isn't taken by a live room.
fn unused_code(rooms: &HashMap<RoomCode, RoomHandle>) -> RoomCode {
    let mut rng = rand::rng();
    loop {
        let code: String = (0..CODE_LEN)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        let code = RoomCode(code);
        if !rooms.contains_key(&code) {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::random::seeded_rng;
    use guestquest_catalog::CharacterCatalog;
    use tokio::sync::mpsc;

    fn registry() -> GameRegistry {
        GameRegistry::with_random(RoomConfig::default(), Arc::new(|| seeded_rng(1)))
    }

    fn classic() -> CharacterSet {
        CharacterCatalog::builtin().default_set().unwrap().clone()
    }

    fn conn(n: u64) -> ConnectionId {
        ConnectionId::new(n)
    }

    #[test]
    fn test_unused_code_shape() {
        let code = unused_code(&HashMap::new());
        assert_eq!(code.as_str().len(), CODE_LEN);
        assert!(code.as_str().bytes().all(|b| CODE_ALPHABET.contains(&b)));
    }

    #[tokio::test]
    async fn test_join_room_forgets_stopped_room() {
        let reg = registry();
        let code = reg.create_room(conn(1), classic()).await;
        let handle = reg.state.lock().await.rooms.get(&code).cloned().unwrap();
        handle.shutdown().await.unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let result = reg.join_room(conn(2), &code, "Bob", tx).await;

        assert_eq!(result.unwrap_err(), GameError::RoomNotFound);
        assert_eq!(reg.room_count().await, 0);
        assert!(reg.state.lock().await.unclaimed.is_empty());
    }

    #[tokio::test]
    async fn test_unresponsive_room_does_not_block_others() {
        let reg = Arc::new(registry());
        let healthy = reg.create_room(conn(1), classic()).await;
        let stuck = RoomCode("STUCK1".into());
        let (handle, mut commands) = RoomHandle::unattended(stuck.clone());
        reg.state.lock().await.rooms.insert(stuck.clone(), handle);

        let waiting = {
            let reg = Arc::clone(&reg);
            tokio::spawn(async move {
                let (tx, _rx) = mpsc::unbounded_channel();
                reg.join_room(conn(2), &stuck, "Alice", tx).await
            })
        };
        // Hold the join command so its reply never arrives.
        let _parked = commands.recv().await;

        let (tx, _rx) = mpsc::unbounded_channel();
        let joined = tokio::time::timeout(
            Duration::from_secs(5),
            reg.join_room(conn(3), &healthy, "Bob", tx),
        )
        .await;

        assert!(matches!(joined, Ok(Ok(_))));
        assert_eq!(reg.room_count().await, 2);
        waiting.abort();
    }
}
