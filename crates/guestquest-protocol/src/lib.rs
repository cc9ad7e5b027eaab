//! Wire protocol for Guest Quest.
//!
//! Every message on the wire is a JSON object `{ "type": ..., "payload": ... }`.
//! This crate defines:
//!
//! - **Messages** ([`ClientMessage`], [`ServerMessage`]): everything a
//!   browser may send and everything the server may push back.
//! - **Identity types** ([`PlayerId`], [`RoomCode`], [`QuestionId`]) and
//!   [`Recipient`], which the room layer uses to address its output.
//! - **Power-ups** ([`PowerUpKind`], [`PowerUpInfo`], [`PowerUpEffect`]):
//!   the fixed power-up catalog and the shape of their results.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes ↔ messages.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientMessage) → Room (turn engine)
//! ```

mod codec;
mod error;
mod message;
mod powerup;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{ClientMessage, PlayerSummary, ServerMessage};
pub use powerup::{PowerUpEffect, PowerUpInfo, PowerUpKind};
pub use types::{PlayerId, QuestionId, Recipient, RoomCode, TurnState};
