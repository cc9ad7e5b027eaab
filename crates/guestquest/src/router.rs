//! Maps decoded client messages onto registry and room operations.
//!
//! The router is transport-free: it receives a [`ClientMessage`] together
//! with the connection it came from and that connection's outbox. Direct
//! replies (`room_created`, `left_room`, `character_sets`, `error`) go into
//! the same outbox as room broadcasts, so a client sees them in the order
//! they were produced.

use guestquest_catalog::{CharacterCatalog, CharacterSet};
use guestquest_protocol::{ClientMessage, RoomCode, ServerMessage};
use guestquest_room::{
    GameError, GameRegistry, PlayerSender, RoomAction, RoomInfo,
};
use guestquest_transport::ConnectionId;

/// Routes client messages for every connection on the server.
pub struct ProtocolRouter {
    registry: GameRegistry,
    catalog: CharacterCatalog,
}

impl ProtocolRouter {
    pub fn new(registry: GameRegistry, catalog: CharacterCatalog) -> Self {
        Self {
            registry,
            catalog,
        }
    }

    pub fn catalog(&self) -> &CharacterCatalog {
        &self.catalog
    }

    /// Handles one message from `connection`. A rejection is reported to
    /// that connection alone as `error{message}`.
    pub async fn handle(
        &self,
        connection: ConnectionId,
        msg: ClientMessage,
        outbox: &PlayerSender,
    ) {
        let kind = msg.kind();
        tracing::trace!(%connection, kind, "client message");
        if let Err(error) = self.dispatch(connection, msg, outbox).await {
            tracing::debug!(%connection, kind, %error, "request rejected");
            let _ = outbox.send(ServerMessage::error(error.to_string()));
        }
    }

    /// Cleans up after a closed connection: an implicit `leave_room`
    /// with no acknowledgement, plus closing any room it created that
    /// nobody joined.
    pub async fn disconnect(&self, connection: ConnectionId) {
        if let Err(error) = self.registry.disconnect(connection).await {
            tracing::debug!(%connection, %error, "disconnect cleanup failed");
        }
    }

    /// Looks up a live room.
    pub async fn room_info(&self, code: &RoomCode) -> Result<RoomInfo, GameError> {
        self.registry.room_info(code).await
    }

    pub async fn room_count(&self) -> usize {
        self.registry.room_count().await
    }

    /// Stops every room. Used on server shutdown.
    pub async fn shutdown(&self) {
        self.registry.shutdown_all().await;
    }

    async fn dispatch(
        &self,
        connection: ConnectionId,
        msg: ClientMessage,
        outbox: &PlayerSender,
    ) -> Result<(), GameError> {
        let action = match msg {
            ClientMessage::CreateRoom { character_set } => {
                let set = self.set_for_new_room(character_set.as_deref())?;
                let room_code = self.registry.create_room(connection, set).await;
                let _ = outbox.send(ServerMessage::RoomCreated {
                    room_code,
                    available_character_sets: self.catalog.list_set_ids(),
                });
                return Ok(());
            }
            ClientMessage::JoinRoom {
                room_code,
                player_name,
            } => {
                let code = RoomCode::normalize(&room_code);
                self.registry
                    .join_room(connection, &code, player_name.trim(), outbox.clone())
                    .await?;
                return Ok(());
            }
            ClientMessage::LeaveRoom {} => {
                self.registry.leave_room(connection).await?;
                let _ = outbox.send(ServerMessage::LeftRoom { success: true });
                return Ok(());
            }
            ClientMessage::ListCharacterSets {} => {
                let _ = outbox.send(ServerMessage::CharacterSets {
                    sets: self.catalog.list_set_names(),
                });
                return Ok(());
            }
            ClientMessage::ChangeCharacterSet { character_set } => {
                let set = self
                    .catalog
                    .get_set(&character_set)
                    .cloned()
                    .ok_or(GameError::InvalidCharacterSet(character_set))?;
                RoomAction::ChangeCharacterSet(set)
            }
            ClientMessage::ToggleReady { .. } => RoomAction::ToggleReady,
            ClientMessage::StartGame {} => RoomAction::StartGame,
            ClientMessage::AskQuestion { question } => {
                RoomAction::AskQuestion { question }
            }
            ClientMessage::AnswerQuestion {
                answer,
                question_id,
            } => RoomAction::AnswerQuestion {
                question_id,
                answer,
            },
            ClientMessage::UsePowerup { power_up_type } => {
                RoomAction::UsePowerUp { power_up_type }
            }
            ClientMessage::MakeGuess { character } => {
                RoomAction::MakeGuess { character }
            }
            ClientMessage::EndTurn {} => RoomAction::EndTurn,
            ClientMessage::ReturnToLobby {} => RoomAction::ReturnToLobby,
        };
        self.registry.route(connection, action).await
    }

    /// Resolves the set for `create_room`, falling back to the default
    /// set for an unknown or missing id.
    fn set_for_new_room(
        &self,
        requested: Option<&str>,
    ) -> Result<CharacterSet, GameError> {
        if let Some(set) = requested.and_then(|id| self.catalog.get_set(id)) {
            return Ok(set.clone());
        }
        let fallback = self.catalog.default_set().ok_or_else(|| {
            GameError::InvalidCharacterSet(requested.unwrap_or_default().to_owned())
        })?;
        if let Some(id) = requested {
            tracing::warn!(
                requested = id,
                fallback = %fallback.id,
                "unknown character set, using default"
            );
        }
        Ok(fallback.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestquest_room::{RoomConfig, seeded_rng};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

    fn router() -> ProtocolRouter {
        let registry = GameRegistry::with_random(
            RoomConfig::default(),
            Arc::new(|| seeded_rng(3)),
        );
        ProtocolRouter::new(registry, CharacterCatalog::builtin())
    }

    fn outbox() -> (PlayerSender, Inbox) {
        mpsc::unbounded_channel()
    }

    async fn create(router: &ProtocolRouter, set: Option<&str>) -> RoomCode {
        let (tx, mut rx) = outbox();
        router
            .handle(
                ConnectionId::new(100),
                ClientMessage::CreateRoom {
                    character_set: set.map(str::to_owned),
                },
                &tx,
            )
            .await;
        match rx.recv().await.unwrap() {
            ServerMessage::RoomCreated { room_code, .. } => room_code,
            other => panic!("expected room_created, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_room_lists_available_sets() {
        let router = router();
        let (tx, mut rx) = outbox();
        router
            .handle(
                ConnectionId::new(1),
                ClientMessage::CreateRoom {
                    character_set: Some("fantasy".into()),
                },
                &tx,
            )
            .await;

        let ServerMessage::RoomCreated {
            room_code,
            available_character_sets,
        } = rx.recv().await.unwrap()
        else {
            panic!("expected room_created");
        };
        assert_eq!(available_character_sets, vec!["classic", "fantasy"]);
        let info = router.room_info(&room_code).await.unwrap();
        assert_eq!(info.character_set, "fantasy");
        assert_eq!(info.player_count, 0);
    }

    #[tokio::test]
    async fn test_create_room_unknown_set_falls_back_to_classic() {
        let router = router();
        let code = create(&router, Some("space")).await;
        assert_eq!(router.room_info(&code).await.unwrap().character_set, "classic");
    }

    #[tokio::test]
    async fn test_join_room_normalizes_code() {
        let router = router();
        let code = create(&router, None).await;
        let (tx, mut rx) = outbox();

        router
            .handle(
                ConnectionId::new(1),
                ClientMessage::JoinRoom {
                    room_code: format!("  {}  ", code.as_str().to_lowercase()),
                    player_name: "Alice".into(),
                },
                &tx,
            )
            .await;

        assert!(matches!(
            rx.recv().await.unwrap(),
            ServerMessage::RoomUpdated { .. }
        ));
    }

    #[tokio::test]
    async fn test_join_room_unknown_code_reports_error() {
        let router = router();
        let (tx, mut rx) = outbox();
        router
            .handle(
                ConnectionId::new(1),
                ClientMessage::JoinRoom {
                    room_code: "NOPE00".into(),
                    player_name: "Alice".into(),
                },
                &tx,
            )
            .await;
        assert_eq!(rx.recv().await.unwrap(), ServerMessage::error("Room not found"));
    }

    #[tokio::test]
    async fn test_leave_room_acknowledges_and_tears_down() {
        let router = router();
        let code = create(&router, None).await;
        let (tx, mut rx) = outbox();
        let conn = ConnectionId::new(1);
        router
            .handle(
                conn,
                ClientMessage::JoinRoom {
                    room_code: code.as_str().into(),
                    player_name: "Alice".into(),
                },
                &tx,
            )
            .await;
        rx.recv().await.unwrap();

        router.handle(conn, ClientMessage::LeaveRoom {}, &tx).await;

        assert_eq!(
            rx.recv().await.unwrap(),
            ServerMessage::LeftRoom { success: true }
        );
        assert_eq!(router.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_leave_room_when_not_in_one_reports_error() {
        let router = router();
        let (tx, mut rx) = outbox();
        router
            .handle(ConnectionId::new(1), ClientMessage::LeaveRoom {}, &tx)
            .await;
        assert_eq!(
            rx.recv().await.unwrap(),
            ServerMessage::error("You are not in a room")
        );
    }

    #[tokio::test]
    async fn test_list_character_sets() {
        let router = router();
        let (tx, mut rx) = outbox();
        router
            .handle(ConnectionId::new(1), ClientMessage::ListCharacterSets {}, &tx)
            .await;
        let ServerMessage::CharacterSets { sets } = rx.recv().await.unwrap() else {
            panic!("expected character_sets");
        };
        assert_eq!(sets["classic"], "Classic");
        assert_eq!(sets["fantasy"], "Fantasy");
    }

    #[tokio::test]
    async fn test_change_character_set_unknown_id() {
        let router = router();
        let (tx, mut rx) = outbox();
        router
            .handle(
                ConnectionId::new(1),
                ClientMessage::ChangeCharacterSet {
                    character_set: "space".into(),
                },
                &tx,
            )
            .await;
        assert_eq!(
            rx.recv().await.unwrap(),
            ServerMessage::error("Unknown character set 'space'")
        );
    }

    #[tokio::test]
    async fn test_change_character_set_reaches_room() {
        let router = router();
        let code = create(&router, None).await;
        let (tx, mut rx) = outbox();
        let conn = ConnectionId::new(1);
        router
            .handle(
                conn,
                ClientMessage::JoinRoom {
                    room_code: code.as_str().into(),
                    player_name: "Alice".into(),
                },
                &tx,
            )
            .await;
        rx.recv().await.unwrap();

        router
            .handle(
                conn,
                ClientMessage::ChangeCharacterSet {
                    character_set: "fantasy".into(),
                },
                &tx,
            )
            .await;

        assert!(matches!(
            rx.recv().await.unwrap(),
            ServerMessage::CharacterSetChanged { ref character_set, .. } if character_set == "fantasy"
        ));
    }

    #[tokio::test]
    async fn test_game_action_outside_room_reports_error() {
        let router = router();
        let (tx, mut rx) = outbox();
        router
            .handle(ConnectionId::new(1), ClientMessage::StartGame {}, &tx)
            .await;
        assert_eq!(
            rx.recv().await.unwrap(),
            ServerMessage::error("You are not in a room")
        );
    }

    #[tokio::test]
    async fn test_disconnect_acts_as_silent_leave() {
        let router = router();
        let code = create(&router, None).await;
        let (alice_tx, mut alice) = outbox();
        let (bob_tx, mut bob) = outbox();
        for (n, name, tx) in [(1, "Alice", &alice_tx), (2, "Bob", &bob_tx)] {
            router
                .handle(
                    ConnectionId::new(n),
                    ClientMessage::JoinRoom {
                        room_code: code.as_str().into(),
                        player_name: name.into(),
                    },
                    tx,
                )
                .await;
        }
        // Alice: her join and Bob's; Bob: his join.
        alice.recv().await.unwrap();
        alice.recv().await.unwrap();
        bob.recv().await.unwrap();

        router.disconnect(ConnectionId::new(1)).await;

        match bob.recv().await.unwrap() {
            ServerMessage::RoomUpdated { players, .. } => {
                assert_eq!(players.len(), 1);
                assert_eq!(players[0].name, "Bob");
            }
            other => panic!("expected room_updated, got {other:?}"),
        }
        assert!(alice.try_recv().is_err(), "no left_room on disconnect");
    }

    #[tokio::test]
    async fn test_disconnect_closes_rooms_nobody_joined() {
        let router = router();
        let (tx, mut rx) = outbox();
        let conn = ConnectionId::new(1);
        for _ in 0..50 {
            router
                .handle(conn, ClientMessage::CreateRoom { character_set: None }, &tx)
                .await;
            rx.recv().await.unwrap();
        }
        // Only the latest unjoined room per creator stays open.
        assert_eq!(router.room_count().await, 1);

        router.disconnect(conn).await;

        assert_eq!(router.room_count().await, 0);
    }
}
