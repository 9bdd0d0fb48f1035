
use std::time::Duration;

use test_helpers::*;
use typemate_core::{RoomEvent, is_valid_room_code};
use typemate_persistence::ProgressUpdate;
use typemate_server::room_manager::SessionError;
use typemate_server::word_source::StaticWordSource;
use typemate_types::RoomStatus;

#[tokio::test]
async fn test_create_room_basic() {
    let setup = TestServerSetup::new().await;

    let created = setup.room_manager.create_room("Alice", 30).await.unwrap();
    assert!(is_valid_room_code(&created.room.code));
    assert_eq!(created.room.status, RoomStatus::Waiting);
    assert_eq!(created.room.duration, 30);
    assert_eq!(created.room.words.len(), 9);

    let players = setup
        .room_manager
        .players_in_room(created.room.id)
        .await
        .unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].name, "Alice");
    assert!(players[0].is_host);
    assert_eq!(players[0].progress, 0);
    assert_eq!(players[0].wpm, 0);
}

#[tokio::test]
async fn test_create_room_validates_input() {
    let setup = TestServerSetup::new().await;

    let result = setup.room_manager.create_room("   ", 30).await;
    assert!(matches!(result, Err(SessionError::InvalidInput(_))));

    let result = setup.room_manager.create_room("Alice", 45).await;
    assert!(matches!(result, Err(SessionError::InvalidInput(_))));
}

#[tokio::test]
async fn test_create_room_word_source_failure() {
    let setup =
        TestServerSetup::with_options(StaticWordSource::new(""), Duration::from_secs(3600)).await;

    let result = setup.room_manager.create_room("Alice", 30).await;
    assert!(matches!(result, Err(SessionError::WordSource(_))));
}

#[tokio::test]
async fn test_alice_and_bob_race_lifecycle() {
    let setup = TestServerSetup::new().await;

    let created = setup.create_room("Alice").await;
    let code = created.room.code.clone();

    let joined = setup.join(&code, "Bob").await;
    assert_eq!(joined.room.id, created.room.id);
    assert_eq!(joined.room.words, created.room.words);
    assert!(!joined.player.is_host);

    let snapshot = setup.room_manager.room_snapshot(&code).await.unwrap();
    assert_eq!(snapshot.players.len(), 2);

    let started = setup
        .room_manager
        .start_game(created.room.id, created.player.id)
        .await
        .unwrap();
    assert_eq!(started.status, RoomStatus::Playing);
    assert!(started.started_at.is_some());

    let late = setup.room_manager.join_room(&code, "Carol").await;
    match late {
        Err(err @ SessionError::InProgress { .. }) => {
            assert_eq!(err.to_string(), "Game already in progress")
        }
        other => panic!("Expected InProgress, got {:?}", other),
    }

    let snapshot = setup.room_manager.room_snapshot(&code).await.unwrap();
    assert_eq!(snapshot.players.len(), 2);
}

#[tokio::test]
async fn test_join_unknown_code() {
    let setup = TestServerSetup::new().await;

    match setup.room_manager.join_room("ZZZ999", "Bob").await {
        Err(err @ SessionError::NotFound { .. }) => assert_eq!(err.to_string(), "Room not found"),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_join_normalizes_code() {
    let setup = TestServerSetup::new().await;
    let created = setup.create_room("Alice").await;

    let messy = format!("  {}  ", created.room.code.to_lowercase());
    let joined = setup.join(&messy, "Bob").await;
    assert_eq!(joined.room.id, created.room.id);
}

#[tokio::test]
async fn test_only_host_can_start() {
    let setup = TestServerSetup::new().await;
    let created = setup.create_room("Alice").await;
    let bob = setup.join(&created.room.code, "Bob").await;

    let result = setup
        .room_manager
        .start_game(created.room.id, bob.player.id)
        .await;
    assert!(matches!(result, Err(SessionError::NotHost)));

    // A player from another room is not a member
    let other = setup.create_room("Dana").await;
    let result = setup
        .room_manager
        .start_game(created.room.id, other.player.id)
        .await;
    assert!(matches!(result, Err(SessionError::NotInRoom)));

    let room = setup.rooms.find_by_id(created.room.id).await.unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Waiting);
}

#[tokio::test]
async fn test_start_happens_once() {
    let setup = TestServerSetup::new().await;
    let created = setup.create_room("Alice").await;

    let first = setup
        .room_manager
        .start_game(created.room.id, created.player.id)
        .await
        .unwrap();

    let second = setup
        .room_manager
        .start_game(created.room.id, created.player.id)
        .await;
    assert!(matches!(
        second,
        Err(SessionError::InvalidState {
            current: RoomStatus::Playing,
            ..
        })
    ));

    let room = setup.rooms.find_by_id(created.room.id).await.unwrap().unwrap();
    assert_eq!(room.started_at, first.started_at);
}

#[tokio::test]
async fn test_concurrent_starts_have_one_winner() {
    let setup = TestServerSetup::new().await;
    let created = setup.create_room("Alice").await;

    let mut handles = Vec::new();
    for _ in 0..5 {
        let manager = setup.room_manager.clone();
        let (room_id, player_id) = (created.room.id, created.player.id);
        handles.push(tokio::spawn(async move {
            manager.start_game(room_id, player_id).await
        }));
    }

    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
}

#[tokio::test]
async fn test_finish_round_transitions() {
    let setup = TestServerSetup::new().await;
    let created = setup.create_room("Alice").await;

    // Not playing yet
    let result = setup.room_manager.finish_round(created.room.id).await;
    assert!(matches!(
        result,
        Err(SessionError::InvalidState {
            current: RoomStatus::Waiting,
            ..
        })
    ));

    setup
        .room_manager
        .start_game(created.room.id, created.player.id)
        .await
        .unwrap();

    let finished = setup.room_manager.expire_round(created.room.id).await.unwrap();
    assert_eq!(finished.status, RoomStatus::Finished);
    assert!(finished.finished_at.is_some());

    let again = setup.room_manager.finish_round(created.room.id).await;
    assert!(matches!(
        again,
        Err(SessionError::InvalidState {
            current: RoomStatus::Finished,
            ..
        })
    ));

    // Never back to playing
    let restart = setup
        .room_manager
        .start_game(created.room.id, created.player.id)
        .await;
    assert!(matches!(
        restart,
        Err(SessionError::InvalidState {
            current: RoomStatus::Finished,
            ..
        })
    ));
}

#[tokio::test]
async fn test_early_finish_is_refused() {
    let setup = TestServerSetup::new().await;
    let (room, players) = setup.start_race(&["Alice", "Bob"]).await;
    let mut events = setup.feed.subscribe(room.id);

    // A 30s round cannot be ended by a client a moment after it started
    let result = setup.room_manager.finish_round(room.id).await;
    match result {
        Err(err @ SessionError::InvalidState {
            current: RoomStatus::Playing,
            ..
        }) => assert!(err.to_string().starts_with("Room is playing")),
        other => panic!("Expected InvalidState, got {:?}", other),
    }

    let stored = setup.rooms.find_by_id(room.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RoomStatus::Playing);
    assert!(stored.finished_at.is_none());
    assert!(events.try_recv().is_err());

    // Racing continues
    let mut seat = setup.seat(&room, &players[1]);
    setup.progress.record_word(&mut seat, "the").await.unwrap();
}

#[tokio::test]
async fn test_finish_accepted_once_round_time_is_up() {
    let setup = TestServerSetup::new().await;
    let (room, _) = setup.start_short_race(&["Alice", "Bob"], 1).await;

    let finished = setup.room_manager.finish_round(room.id).await.unwrap();
    assert_eq!(finished.status, RoomStatus::Finished);
}

#[tokio::test]
async fn test_finished_room_ranks_players_by_wpm() {
    let setup = TestServerSetup::new().await;
    let (room, players) = setup.start_race(&["Alice", "Bob", "Carol"]).await;

    for (player, progress, wpm) in [(&players[0], 3, 12), (&players[1], 6, 48), (&players[2], 5, 30)] {
        let update = ProgressUpdate {
            progress,
            attempted: progress,
            wpm,
            accuracy: 100,
        };
        assert!(setup.players.update_progress(player.id, update).await.unwrap());
    }

    let mut events = setup.feed.subscribe(room.id);
    setup.room_manager.expire_round(room.id).await.unwrap();

    match events.recv().await.unwrap() {
        RoomEvent::StatusChanged { status, .. } => assert_eq!(status, RoomStatus::Finished),
        other => panic!("Expected StatusChanged, got {:?}", other),
    }
    match events.recv().await.unwrap() {
        RoomEvent::PlayersChanged { players, .. } => {
            let names: Vec<_> = players.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Bob", "Carol", "Alice"]);
        }
        other => panic!("Expected PlayersChanged, got {:?}", other),
    }

    let snapshot = setup.room_manager.room_snapshot(&room.code).await.unwrap();
    let names: Vec<_> = snapshot.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Bob", "Carol", "Alice"]);
}

#[tokio::test]
async fn test_malformed_codes_are_not_found() {
    let setup = TestServerSetup::new().await;
    setup.create_room("Alice").await;

    for code in ["", "ABC", "ABC-12", "ABCDEFG", "ÀBC123"] {
        assert!(
            matches!(
                setup.room_manager.join_room(code, "Bob").await,
                Err(SessionError::NotFound { .. })
            ),
            "code {:?}",
            code
        );
        assert!(matches!(
            setup.room_manager.room_snapshot(code).await,
            Err(SessionError::NotFound { .. })
        ));
    }
}

#[tokio::test]
async fn test_round_deadline_finishes_room() {
    let setup = TestServerSetup::new().await;
    let (room, _) = setup.start_race(&["Alice", "Bob"]).await;

    let handle = setup
        .room_manager
        .arm_round_deadline(room.id, Duration::from_millis(50));
    handle.await.unwrap();

    let room = setup.rooms.find_by_id(room.id).await.unwrap().unwrap();
    assert_eq!(room.status, RoomStatus::Finished);

    // A second deadline for the same room is harmless
    let handle = setup
        .room_manager
        .arm_round_deadline(room.id, Duration::from_millis(1));
    handle.await.unwrap();
}

#[tokio::test]
async fn test_leave_keeps_room_and_host() {
    let setup = TestServerSetup::new().await;
    let created = setup.create_room("Alice").await;
    let bob = setup.join(&created.room.code, "Bob").await;

    setup
        .room_manager
        .leave_room(created.room.id, bob.player.id)
        .await
        .unwrap();

    let snapshot = setup
        .room_manager
        .room_snapshot(&created.room.code)
        .await
        .unwrap();
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].id, created.player.id);
    assert!(snapshot.players[0].is_host);

    let again = setup
        .room_manager
        .leave_room(created.room.id, bob.player.id)
        .await;
    assert!(matches!(again, Err(SessionError::NotInRoom)));

    // The host leaving does not hand over the room or delete it
    setup
        .room_manager
        .leave_room(created.room.id, created.player.id)
        .await
        .unwrap();
    let snapshot = setup
        .room_manager
        .room_snapshot(&created.room.code)
        .await
        .unwrap();
    assert!(snapshot.players.is_empty());
    assert_eq!(snapshot.room.status, RoomStatus::Waiting);
}

#[tokio::test]
async fn test_change_feed_sees_joins_and_status() {
    let setup = TestServerSetup::new().await;
    let created = setup.create_room("Alice").await;
    let mut receiver = setup.feed.subscribe(created.room.id);

    setup.join(&created.room.code, "Bob").await;
    match receiver.recv().await.unwrap() {
        RoomEvent::PlayersChanged { players, .. } => assert_eq!(players.len(), 2),
        other => panic!("Expected PlayersChanged, got {:?}", other),
    }

    setup
        .room_manager
        .start_game(created.room.id, created.player.id)
        .await
        .unwrap();
    match receiver.recv().await.unwrap() {
        RoomEvent::StatusChanged {
            status, started_at, ..
        } => {
            assert_eq!(status, RoomStatus::Playing);
            assert!(started_at.is_some());
        }
        other => panic!("Expected StatusChanged, got {:?}", other),
    }
}

#[tokio::test]
async fn test_purge_keeps_rooms_inside_window() {
    let setup = TestServerSetup::new().await;
    let created = setup.create_room("Alice").await;
    setup.join(&created.room.code, "Bob").await;

    let (rooms, players) = setup.room_manager.purge_expired().await.unwrap();
    assert_eq!((rooms, players), (0, 0));
    assert!(setup.room_manager.room_snapshot(&created.room.code).await.is_ok());
}

#[tokio::test]
async fn test_purge_removes_expired_rooms() {
    let setup = TestServerSetup::with_ttl(Duration::ZERO).await;
    let created = setup.create_room("Alice").await;
    setup.join(&created.room.code, "Bob").await;

    tokio::time::sleep(Duration::from_millis(20)).await;

    let (rooms, players) = setup.room_manager.purge_expired().await.unwrap();
    assert_eq!((rooms, players), (1, 2));

    let result = setup.room_manager.room_snapshot(&created.room.code).await;
    assert!(matches!(result, Err(SessionError::NotFound { .. })));
}
