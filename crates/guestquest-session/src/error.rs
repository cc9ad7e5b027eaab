//! Error types for the session layer.

use guestquest_protocol::RoomCode;
use guestquest_transport::ConnectionId;

/// Errors that can occur while binding connections to rooms.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection is already bound to a room. A connection plays in
    /// at most one room at a time.
    #[error("connection {0} is already in room {1}")]
    AlreadyInRoom(ConnectionId, RoomCode),

    /// The connection isn't bound to any room.
    #[error("connection {0} is not in a room")]
    NotInRoom(ConnectionId),
}
