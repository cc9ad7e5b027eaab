//! Rooms and the turn engine for Guest Quest.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! [`Room`]: players, the secret characters, turn bookkeeping and the
//! turn countdown.
//!
//! # Key types
//!
//! - [`Room`]: the room aggregate; lobby lifecycle plus the turn engine
//! - [`GameRegistry`]: creates/destroys rooms, routes connections
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`GamePhase`]: lifecycle state machine
//! - [`RoomConfig`]: room settings (player limits, turn length, etc.)
//! - [`GameRng`]: injectable randomness for shuffles and power-ups

mod actor;
mod config;
mod engine;
mod error;
mod player;
mod powerup;
mod random;
mod registry;
mod room;

pub use actor::{PlayerSender, RoomHandle, RoomInfo};
pub use config::{GamePhase, RoomConfig};
pub use engine::RoomAction;
pub use error::GameError;
pub use player::{Player, validate_name};
pub use powerup::resolve as resolve_power_up;
pub use random::{GameRng, os_rng, seeded_rng};
pub use registry::{GameRegistry, RandomFactory};
pub use room::{Outbound, PendingQuestion, Room};
