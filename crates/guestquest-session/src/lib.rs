//! Session tracking for Guest Quest.
//!
//! A *session* here is the binding between one live connection and the
//! room/player it is currently playing as. There are no accounts and no
//! reconnection: the binding is created on `join_room` and dropped on
//! `leave_room` or disconnect.
//!
//! ```text
//! Room Layer (above)     ← asks "which room is this connection in?"
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Transport / Protocol (below) ← ConnectionId, PlayerId, RoomCode
//! ```

mod error;
mod registry;

pub use error::SessionError;
pub use registry::{ConnectionRegistry, SessionInfo, generate_player_id};
