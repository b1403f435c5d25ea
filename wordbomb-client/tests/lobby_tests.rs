mod test_helpers;

use std::time::Duration;
use test_helpers::*;
use wordbomb_client::{LobbyError, lobby};
use wordbomb_store::{DEFAULT_CHAT_HISTORY, MemoryStore, RoomStore};
use wordbomb_types::{Difficulty, GameMode, RoomSettings, RoomStatus, StoreError};

async fn waiting_room(mode: GameMode) -> (MemoryStore, wordbomb_types::Room, wordbomb_types::Player) {
    let store = MemoryStore::new();
    let (room, host) = lobby::create_room(&store, RoomSettings::new("Host", mode, Difficulty::Easy))
        .await
        .unwrap();
    (store, room, host)
}

#[tokio::test]
async fn test_start_requires_host_and_two_players() {
    let (store, room, host) = waiting_room(GameMode::VsAll).await;

    assert!(matches!(
        lobby::start_game(&store, &room.code, host.id).await,
        Err(LobbyError::NotEnoughPlayers { count: 1 })
    ));

    let (guest, mode) = lobby::join_room(&store, &room.code.as_str().to_lowercase(), "Guest")
        .await
        .unwrap();
    assert_eq!(mode, GameMode::VsAll);

    assert!(matches!(
        lobby::start_game(&store, &room.code, guest.id).await,
        Err(LobbyError::NotHost)
    ));

    let started = lobby::start_game(&store, &room.code, host.id).await.unwrap();
    assert_eq!(started.status, RoomStatus::Playing);

    assert!(matches!(
        lobby::join_room(&store, room.code.as_str(), "Late").await,
        Err(StoreError::GameAlreadyStarted)
    ));
}

#[tokio::test]
async fn test_team_mode_requires_everyone_on_a_team() {
    let (store, room, host) = waiting_room(GameMode::Team2).await;
    let (guest, _) = lobby::join_room(&store, room.code.as_str(), "Guest").await.unwrap();

    lobby::select_team(&store, &host, 1).await.unwrap();
    match lobby::start_game(&store, &room.code, host.id).await {
        Err(e @ LobbyError::UnassignedPlayers { count: 1 }) => {
            assert_eq!(e.to_string(), "1 player(s) still in waiting area");
        }
        other => panic!("unexpected result {:?}", other.map(|r| r.status)),
    }

    lobby::select_team(&store, &guest, 2).await.unwrap();
    assert!(lobby::start_game(&store, &room.code, host.id).await.is_ok());

    let chat: Vec<String> = store
        .list_chat_messages(&room.code, DEFAULT_CHAT_HISTORY)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.message)
        .collect();
    assert_eq!(chat, vec!["Host joined Team Blue", "Guest joined Team Red"]);
}

#[tokio::test]
async fn test_add_bots_uses_unique_names() {
    let (store, room, host) = waiting_room(GameMode::VsAll).await;
    let bots = lobby::add_bots(&store, &room.code, 4, Difficulty::Hard).await.unwrap();
    assert_eq!(bots.len(), 4);

    let players = store.list_active_players(&room.code).await.unwrap();
    let mut names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), 5);
    assert!(bots.iter().all(|b| b.is_bot && b.bot_difficulty == Some(Difficulty::Hard)));

    // Bots count toward the start minimum.
    assert!(lobby::start_game(&store, &room.code, host.id).await.is_ok());
}

#[tokio::test]
async fn test_wait_for_start_sees_host_start() {
    let setup = TestRoomSetup::new(3).await;
    let room = lobby::wait_for_start(
        setup.store.as_ref(),
        &setup.room.code,
        Duration::from_millis(10),
    )
    .await
    .unwrap();
    assert_eq!(room.status, RoomStatus::Playing);
}

#[tokio::test]
async fn test_wait_for_start_reports_missing_room() {
    let store = MemoryStore::new();
    let code = wordbomb_types::RoomCode::parse("NOPE42").unwrap();
    assert!(matches!(
        lobby::wait_for_start(&store, &code, Duration::from_millis(10)).await,
        Err(StoreError::RoomNotFound { .. })
    ));
}

#[test]
fn test_team_names() {
    assert_eq!(lobby::team_name(1), "Blue");
    assert_eq!(lobby::team_name(6), "Orange");
    assert_eq!(lobby::team_name(9), "9");
}
