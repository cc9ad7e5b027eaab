//! # Guest Quest
//!
//! Server for a two-player "guess the character" game played over
//! WebSocket.
//!
//! Each player secretly holds a character from a shared set and tries to
//! identify the opponent's by asking free-form questions, spending
//! power-ups, and finally guessing. The server is authoritative over the
//! room and turn state machine, the power-ups, the turn countdown, and
//! the winner.
//!
//! Messages are JSON objects shaped `{ "type": ..., "payload": {...} }`;
//! see [`ClientMessage`](guestquest_protocol::ClientMessage) and
//! [`ServerMessage`](guestquest_protocol::ServerMessage).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use guestquest::prelude::*;
//!
//! # async fn demo() -> Result<(), GuestQuestError> {
//! let server = GuestQuestServer::builder()
//!     .bind("0.0.0.0:3000")
//!     .build()
//!     .await?;
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

mod error;
mod handler;
mod router;
mod server;

pub use error::GuestQuestError;
pub use router::ProtocolRouter;
pub use server::{GuestQuestServer, GuestQuestServerBuilder};

pub mod prelude {
    pub use crate::{
        GuestQuestError, GuestQuestServer, GuestQuestServerBuilder,
        ProtocolRouter,
    };
    pub use guestquest_catalog::{
        AttributeValue, Character, CharacterCard, CharacterCatalog,
        CharacterSet,
    };
    pub use guestquest_protocol::{
        ClientMessage, Codec, JsonCodec, PlayerId, PowerUpEffect,
        PowerUpKind, QuestionId, RoomCode, ServerMessage, TurnState,
    };
    pub use guestquest_room::{
        GameError, GameRng, GamePhase, GameRegistry, RandomFactory,
        RoomConfig, os_rng, seeded_rng,
    };
    pub use guestquest_tick::TimerConfig;
}
