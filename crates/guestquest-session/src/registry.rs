//! The connection registry: connection → (room, player).
//!
//! # Concurrency note
//!
//! `ConnectionRegistry` is a plain `HashMap`. It lives inside the game
//! registry, which the server guards with a single mutex, so every
//! lookup and removal is already serialized.

use std::collections::HashMap;

use guestquest_protocol::{PlayerId, RoomCode};
use guestquest_transport::ConnectionId;
use rand::Rng;

use crate::SessionError;

/// Largest id that a JavaScript `Number` represents exactly (2^53 - 1).
const MAX_SAFE_ID: u64 = (1 << 53) - 1;

/// Where a connection is currently playing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub room_code: RoomCode,
    pub player_id: PlayerId,
}

/// Tracks which room and player each live connection belongs to.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    sessions: HashMap<ConnectionId, SessionInfo>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a connection to a room as the given player.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyInRoom`] if the connection is
    /// already bound. The existing binding is left untouched.
    pub fn bind(
        &mut self,
        connection: ConnectionId,
        room_code: RoomCode,
        player_id: PlayerId,
    ) -> Result<(), SessionError> {
        if let Some(existing) = self.sessions.get(&connection) {
            return Err(SessionError::AlreadyInRoom(
                connection,
                existing.room_code.clone(),
            ));
        }
        tracing::debug!(%connection, %room_code, %player_id, "connection bound");
        self.sessions.insert(
            connection,
            SessionInfo {
                room_code,
                player_id,
            },
        );
        Ok(())
    }

    /// Removes and returns a connection's binding.
    ///
    /// # Errors
    /// Returns [`SessionError::NotInRoom`] if the connection isn't bound.
    pub fn unbind(
        &mut self,
        connection: ConnectionId,
    ) -> Result<SessionInfo, SessionError> {
        let info = self
            .sessions
            .remove(&connection)
            .ok_or(SessionError::NotInRoom(connection))?;
        tracing::debug!(%connection, room_code = %info.room_code, "connection unbound");
        Ok(info)
    }

    pub fn lookup(&self, connection: ConnectionId) -> Option<&SessionInfo> {
        self.sessions.get(&connection)
    }

    pub fn is_bound(&self, connection: ConnectionId) -> bool {
        self.sessions.contains_key(&connection)
    }

    /// Number of bound connections.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Generates a random player id in `1..=2^53-1`.
pub fn generate_player_id() -> PlayerId {
    PlayerId(rand::rng().random_range(1..=MAX_SAFE_ID))
}

// =========================================================================
// Tests
// =========================================================================
