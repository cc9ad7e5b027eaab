//! Unified error type for the Guest Quest server.

use guestquest_catalog::CatalogError;
use guestquest_protocol::ProtocolError;
use guestquest_room::GameError;
use guestquest_session::SessionError;
use guestquest_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GuestQuestError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A character set failed to load.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A connection/room binding error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A rejected room or turn operation.
    #[error(transparent)]
    Game(#[from] GameError),
}
