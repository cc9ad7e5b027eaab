//! Integration tests for room actors and the game registry.
//!
//! Players are plain unbounded channels standing in for connection
//! handlers. Timer tests run with `start_paused = true` so a turn
//! countdown completes instantly.

use std::sync::Arc;
use std::time::Duration;

use guestquest_catalog::{CharacterCatalog, CharacterSet};
use guestquest_protocol::{RoomCode, ServerMessage};
use guestquest_room::{
    GameError, GamePhase, GameRegistry, PlayerSender, RoomAction, RoomConfig,
    seeded_rng,
};
use guestquest_transport::ConnectionId;
use tokio::sync::mpsc;

// =========================================================================
// Helpers
// =========================================================================

type Inbox = mpsc::UnboundedReceiver<ServerMessage>;

fn conn(n: u64) -> ConnectionId {
    ConnectionId::new(n)
}

fn classic() -> CharacterSet {
    CharacterCatalog::builtin().default_set().unwrap().clone()
}

/// A registry whose rooms deal from a fixed seed.
fn registry(turn_secs: u64) -> GameRegistry {
    let config = RoomConfig {
        turn_duration: Duration::from_secs(turn_secs),
        ..RoomConfig::default()
    };
    GameRegistry::with_random(config, Arc::new(|| seeded_rng(42)))
}

fn player() -> (PlayerSender, Inbox) {
    mpsc::unbounded_channel()
}

/// Receives until `pred` matches, returning everything seen (inclusive).
async fn recv_until(
    inbox: &mut Inbox,
    pred: impl Fn(&ServerMessage) -> bool,
) -> Vec<ServerMessage> {
    let mut seen = Vec::new();
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(600), inbox.recv())
            .await
            .expect("timed out waiting for message")
            .expect("room closed the channel");
        let done = pred(&msg);
        seen.push(msg);
        if done {
            return seen;
        }
    }
}

/// A started game between Alice (connection 1) and Bob (connection 2).
struct Game {
    code: RoomCode,
    alice: Inbox,
    bob: Inbox,
    /// Character names dealt to each player.
    alice_holds: String,
    bob_holds: String,
}

fn dealt(msgs: Vec<ServerMessage>) -> String {
    match msgs.last() {
        Some(ServerMessage::GameStarted { your_character, .. }) => {
            your_character.name.clone()
        }
        other => panic!("expected game_started, got {other:?}"),
    }
}

/// Creates a room with Alice and Bob, both ready and the game started.
async fn started_game(reg: &GameRegistry) -> Game {
    let code = reg.create_room(conn(1), classic()).await;
    let (alice_tx, mut alice) = player();
    let (bob_tx, mut bob) = player();
    reg.join_room(conn(1), &code, "Alice", alice_tx).await.unwrap();
    reg.join_room(conn(2), &code, "Bob", bob_tx).await.unwrap();
    reg.route(conn(1), RoomAction::ToggleReady).await.unwrap();
    reg.route(conn(2), RoomAction::ToggleReady).await.unwrap();
    reg.route(conn(1), RoomAction::StartGame).await.unwrap();

    let is_started = |m: &ServerMessage| matches!(m, ServerMessage::GameStarted { .. });
    let alice_holds = dealt(recv_until(&mut alice, is_started).await);
    let bob_holds = dealt(recv_until(&mut bob, is_started).await);
    Game {
        code,
        alice,
        bob,
        alice_holds,
        bob_holds,
    }
}

// =========================================================================
// Registry
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_unique_codes() {
    let reg = registry(60);
    let a = reg.create_room(conn(1), classic()).await;
    let b = reg.create_room(conn(2), classic()).await;

    assert_ne!(a, b);
    assert_eq!(reg.room_count().await, 2);
    for code in [&a, &b] {
        assert_eq!(code.as_str().len(), 6);
        assert!(code
            .as_str()
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}

#[tokio::test]
async fn test_join_room_unknown_code() {
    let reg = registry(60);
    let (tx, _rx) = player();
    let result = reg
        .join_room(conn(1), &RoomCode("ZZZZZZ".into()), "Alice", tx)
        .await;
    assert_eq!(result.unwrap_err(), GameError::RoomNotFound);
}

#[tokio::test]
async fn test_join_room_broadcasts_membership() {
    let reg = registry(60);
    let code = reg.create_room(conn(1), classic()).await;
    let (alice_tx, mut alice) = player();
    let (bob_tx, _bob) = player();

    let alice_id = reg.join_room(conn(1), &code, "Alice", alice_tx).await.unwrap();
    reg.join_room(conn(2), &code, "Bob", bob_tx).await.unwrap();

    let first = alice.recv().await.unwrap();
    assert!(matches!(
        first,
        ServerMessage::RoomUpdated { ref players, can_start: false } if players.len() == 1
    ));
    match alice.recv().await.unwrap() {
        ServerMessage::RoomUpdated { players, .. } => {
            let names: Vec<_> = players.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Alice", "Bob"]);
            assert_eq!(players[0].id, alice_id);
        }
        other => panic!("expected room_updated, got {other:?}"),
    }
    assert_eq!(reg.session(conn(1)).await.unwrap().room_code, code);
}

#[tokio::test]
async fn test_join_room_twice_from_same_connection() {
    let reg = registry(60);
    let first = reg.create_room(conn(1), classic()).await;
    let second = reg.create_room(conn(2), classic()).await;
    let (tx, _rx) = player();
    reg.join_room(conn(1), &first, "Alice", tx.clone()).await.unwrap();

    let result = reg.join_room(conn(1), &second, "Alice", tx).await;

    assert_eq!(result.unwrap_err(), GameError::AlreadyInRoom);
    assert_eq!(reg.session(conn(1)).await.unwrap().room_code, first);
}

#[tokio::test]
async fn test_join_room_rejections_leave_connection_unbound() {
    let reg = registry(60);
    let code = reg.create_room(conn(1), classic()).await;
    let (tx, _rx) = player();
    reg.join_room(conn(1), &code, "Alice", tx.clone()).await.unwrap();

    let dup = reg.join_room(conn(2), &code, "Alice", tx.clone()).await;
    assert_eq!(dup.unwrap_err(), GameError::DuplicateName);
    assert!(reg.session(conn(2)).await.is_none());

    reg.join_room(conn(2), &code, "Bob", tx.clone()).await.unwrap();
    let full = reg.join_room(conn(3), &code, "Carol", tx).await;
    assert_eq!(full.unwrap_err(), GameError::RoomFull);
}

#[tokio::test]
async fn test_leave_room_last_player_tears_room_down() {
    let reg = registry(60);
    let code = reg.create_room(conn(1), classic()).await;
    let (tx, _rx) = player();
    reg.join_room(conn(1), &code, "Alice", tx.clone()).await.unwrap();

    reg.leave_room(conn(1)).await.unwrap();

    assert_eq!(reg.room_count().await, 0);
    assert!(reg.session(conn(1)).await.is_none());
    let rejoin = reg.join_room(conn(2), &code, "Bob", tx).await;
    assert_eq!(rejoin.unwrap_err(), GameError::RoomNotFound);
}

#[tokio::test]
async fn test_leave_room_when_not_in_one() {
    let reg = registry(60);
    assert_eq!(
        reg.leave_room(conn(9)).await.unwrap_err(),
        GameError::NotInRoom
    );
}

#[tokio::test]
async fn test_route_without_room() {
    let reg = registry(60);
    assert_eq!(
        reg.route(conn(1), RoomAction::StartGame).await.unwrap_err(),
        GameError::NotInRoom
    );
}

#[tokio::test]
async fn test_disconnect_closes_rooms_nobody_joined() {
    let reg = registry(60);
    for _ in 0..50 {
        reg.create_room(conn(1), classic()).await;
    }
    // Each new room replaces the creator's previous unjoined one.
    assert_eq!(reg.room_count().await, 1);

    reg.disconnect(conn(1)).await.unwrap();

    assert_eq!(reg.room_count().await, 0);
}

#[tokio::test]
async fn test_create_room_closes_previous_unjoined_room() {
    let reg = registry(60);
    let first = reg.create_room(conn(1), classic()).await;
    let second = reg.create_room(conn(1), classic()).await;
    let (tx, _rx) = player();

    let stale = reg.join_room(conn(2), &first, "Bob", tx.clone()).await;
    assert_eq!(stale.unwrap_err(), GameError::RoomNotFound);
    reg.join_room(conn(2), &second, "Bob", tx).await.unwrap();
    assert_eq!(reg.room_count().await, 1);
}

#[tokio::test]
async fn test_disconnect_keeps_room_someone_joined() {
    let reg = registry(60);
    let code = reg.create_room(conn(1), classic()).await;
    let (tx, _rx) = player();
    reg.join_room(conn(2), &code, "Bob", tx).await.unwrap();

    reg.disconnect(conn(1)).await.unwrap();

    assert_eq!(reg.room_count().await, 1);
    assert_eq!(reg.session(conn(2)).await.unwrap().room_code, code);
    assert_eq!(reg.room_info(&code).await.unwrap().player_count, 1);
}

#[tokio::test]
async fn test_disconnect_leaves_and_tears_down() {
    let reg = registry(60);
    let code = reg.create_room(conn(1), classic()).await;
    let (tx, _rx) = player();
    reg.join_room(conn(1), &code, "Alice", tx).await.unwrap();

    reg.disconnect(conn(1)).await.unwrap();
    reg.disconnect(conn(1)).await.unwrap();

    assert_eq!(reg.room_count().await, 0);
    assert!(reg.session(conn(1)).await.is_none());
}

#[tokio::test]
async fn test_room_info_reports_phase_and_players() {
    let reg = registry(60);
    let Game { code, .. } = started_game(&reg).await;

    let info = reg.room_info(&code).await.unwrap();

    assert_eq!(info.code, code);
    assert_eq!(info.phase, GamePhase::InGame);
    assert_eq!(info.player_count, 2);
    assert_eq!(info.max_players, 2);
    assert_eq!(info.character_set, "classic");
}

// =========================================================================
// Actor behaviour
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_rejected_action_errors_only_the_sender() {
    let reg = registry(60);
    let Game {
        mut alice, mut bob, ..
    } = started_game(&reg).await;

    reg.route(
        conn(2),
        RoomAction::AskQuestion {
            question: "Hat?".into(),
        },
    )
    .await
    .unwrap();

    let msgs = recv_until(&mut bob, |m| matches!(m, ServerMessage::Error { .. })).await;
    assert_eq!(
        msgs.last().unwrap(),
        &ServerMessage::error("It's not your turn")
    );
    assert!(alice.try_recv().is_err(), "alice must not see bob's error");
}

#[tokio::test]
async fn test_game_started_deals_private_characters() {
    let reg = registry(60);
    let code = reg.create_room(conn(1), classic()).await;
    let (alice_tx, mut alice) = player();
    let (bob_tx, mut bob) = player();
    reg.join_room(conn(1), &code, "Alice", alice_tx).await.unwrap();
    reg.join_room(conn(2), &code, "Bob", bob_tx).await.unwrap();
    reg.route(conn(1), RoomAction::ToggleReady).await.unwrap();
    reg.route(conn(2), RoomAction::ToggleReady).await.unwrap();
    reg.route(conn(2), RoomAction::StartGame).await.unwrap();

    let is_started = |m: &ServerMessage| matches!(m, ServerMessage::GameStarted { .. });
    let a = recv_until(&mut alice, is_started).await.pop().unwrap();
    let b = recv_until(&mut bob, is_started).await.pop().unwrap();

    let (
        ServerMessage::GameStarted { your_character: mine, current_turn, .. },
        ServerMessage::GameStarted { your_character: theirs, .. },
    ) = (a, b)
    else {
        unreachable!();
    };
    assert_eq!(current_turn, "Alice");
    assert_ne!(mine.id, theirs.id);
    let set = classic();
    assert!(set.find_by_name(&mine.name).is_some());
    assert!(set.find_by_name(&theirs.name).is_some());
}

#[tokio::test]
async fn test_question_answer_guess_scenario() {
    let reg = registry(60);
    let Game {
        mut alice,
        mut bob,
        alice_holds,
        ..
    } = started_game(&reg).await;

    reg.route(
        conn(1),
        RoomAction::AskQuestion {
            question: "Does your character wear glasses?".into(),
        },
    )
    .await
    .unwrap();
    let received = recv_until(&mut bob, |m| {
        matches!(m, ServerMessage::QuestionReceived { .. })
    })
    .await;
    let Some(ServerMessage::QuestionReceived { question_id, .. }) = received.last()
    else {
        unreachable!();
    };

    reg.route(
        conn(2),
        RoomAction::AnswerQuestion {
            question_id: *question_id,
            answer: "yes".into(),
        },
    )
    .await
    .unwrap();
    let msgs = recv_until(&mut alice, |m| {
        matches!(m, ServerMessage::TurnChanged { .. })
    })
    .await;
    assert!(msgs.iter().any(|m| matches!(
        m,
        ServerMessage::QuestionAnswered { answer, .. } if answer == "yes"
    )));
    assert!(matches!(
        msgs.last(),
        Some(ServerMessage::TurnChanged { current_turn, .. }) if current_turn == "Bob"
    ));

    reg.route(
        conn(2),
        RoomAction::MakeGuess {
            character: alice_holds,
        },
    )
    .await
    .unwrap();
    let over = recv_until(&mut alice, |m| matches!(m, ServerMessage::GameOver { .. }))
        .await
        .pop()
        .unwrap();
    assert!(matches!(
        over,
        ServerMessage::GameOver { ref winner, .. } if winner == "Bob"
    ));
}

#[tokio::test]
async fn test_leave_mid_game_notifies_opponent() {
    let reg = registry(60);
    let Game { code, mut bob, .. } = started_game(&reg).await;

    reg.leave_room(conn(1)).await.unwrap();

    let msgs = recv_until(&mut bob, |m| matches!(m, ServerMessage::GameEnded { .. })).await;
    assert!(matches!(
        msgs.last(),
        Some(ServerMessage::GameEnded { reason }) if reason == "Alice left the game"
    ));
    let info = reg.room_info(&code).await.unwrap();
    assert_eq!(info.phase, GamePhase::Lobby);
    assert_eq!(info.player_count, 1);
}

// =========================================================================
// Turn countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_turn_timeout_without_any_action() {
    let reg = registry(3);
    let Game { mut alice, .. } = started_game(&reg).await;

    let msgs = recv_until(&mut alice, |m| {
        matches!(m, ServerMessage::TurnChanged { .. })
    })
    .await;

    assert_eq!(
        msgs,
        vec![
            ServerMessage::TimerSync {
                time_remaining: 2,
                current_turn: "Alice".into(),
            },
            ServerMessage::TimerSync {
                time_remaining: 1,
                current_turn: "Alice".into(),
            },
            ServerMessage::TimerSync {
                time_remaining: 0,
                current_turn: "Alice".into(),
            },
            ServerMessage::TurnTimeout {
                player: "Alice".into(),
                message: "Alice's turn timed out".into(),
            },
            ServerMessage::TurnChanged {
                current_turn: "Bob".into(),
                turn_actions: Default::default(),
                time_remaining: 3,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_turn_timer_stops_after_game_over() {
    let reg = registry(3);
    let Game {
        mut alice,
        bob_holds,
        ..
    } = started_game(&reg).await;

    reg.route(
        conn(1),
        RoomAction::MakeGuess {
            character: bob_holds,
        },
    )
    .await
    .unwrap();
    recv_until(&mut alice, |m| matches!(m, ServerMessage::GameOver { .. })).await;

    let silence = tokio::time::timeout(Duration::from_secs(30), alice.recv()).await;
    assert!(silence.is_err(), "no timer events after game over");
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_all_stops_rooms() {
    let reg = registry(3);
    let Game { mut alice, .. } = started_game(&reg).await;

    reg.shutdown_all().await;

    assert_eq!(reg.room_count().await, 0);
    assert!(reg.session(conn(1)).await.is_none());
    // The actor drops its senders once it stops.
    let closed = tokio::time::timeout(Duration::from_secs(30), async {
        while alice.recv().await.is_some() {}
    })
    .await;
    assert!(closed.is_ok());
}
