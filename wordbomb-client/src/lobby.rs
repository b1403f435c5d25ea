use std::time::Duration;
use tracing::{debug, info, warn};
use wordbomb_core::generate_bot_name;
use wordbomb_store::RoomStore;
use wordbomb_types::{
    Difficulty, GameMode, Player, PlayerId, Room, RoomCode, RoomSettings, RoomStatus, StoreError,
};

use crate::chat::post_system_message;
use crate::error::LobbyError;

const MIN_PLAYERS: usize = 2;
const TEAM_NAMES: &[&str] = &["Blue", "Red", "Green", "Yellow", "Purple", "Orange"];

pub fn team_name(team_number: u32) -> String {
    team_number
        .checked_sub(1)
        .and_then(|i| TEAM_NAMES.get(i as usize))
        .map(|name| name.to_string())
        .unwrap_or_else(|| team_number.to_string())
}

pub async fn create_room(store: &dyn RoomStore, settings: RoomSettings) -> Result<(Room, Player), StoreError> {
    let (room, host) = store.create_room(settings).await?;
    info!(
        "Room {} created ({:?}, {:?}, {} rounds)",
        room.code, room.game_mode, room.difficulty, room.max_rounds
    );
    Ok((room, host))
}

/// Join by a code as typed by the user; case and surrounding whitespace
/// are ignored.
pub async fn join_room(store: &dyn RoomStore, raw_code: &str, name: &str) -> Result<(Player, GameMode), StoreError> {
    let code = RoomCode::parse(raw_code)?;
    store.join_room(&code, name).await
}

/// Add `count` bots with fresh names.
pub async fn add_bots(
    store: &dyn RoomStore,
    code: &RoomCode,
    count: usize,
    difficulty: Difficulty,
) -> Result<Vec<Player>, StoreError> {
    let mut names: Vec<String> = store
        .list_active_players(code)
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();

    let mut bots = Vec::with_capacity(count);
    for _ in 0..count {
        let name = generate_bot_name(&names, &mut rand::rng());
        let bot = store.add_bot(code, &name, difficulty).await?;
        names.push(name);
        bots.push(bot);
    }
    Ok(bots)
}

pub async fn select_team(store: &dyn RoomStore, player: &Player, team_number: u32) -> Result<(), StoreError> {
    store.select_team(player.id, team_number).await?;
    post_system_message(
        store,
        &player.room_code,
        format!("{} joined Team {}", player.name, team_name(team_number)),
    )
    .await;
    Ok(())
}

/// Host only. Checks the start preconditions, then moves the room to
/// `playing`. The host's session publishes round 1 on its next poll.
pub async fn start_game(store: &dyn RoomStore, code: &RoomCode, player_id: PlayerId) -> Result<Room, LobbyError> {
    let room = store.get_room(code).await?;
    if room.host_id != player_id {
        return Err(LobbyError::NotHost);
    }
    if room.status != RoomStatus::Waiting {
        return Err(LobbyError::Store(StoreError::GameAlreadyStarted));
    }

    let players: Vec<Player> = store
        .list_active_players(code)
        .await?
        .into_iter()
        .filter(|p| p.is_participant())
        .collect();

    if room.game_mode.is_team_mode() {
        let unassigned = players.iter().filter(|p| p.team_number.is_none()).count();
        if unassigned > 0 {
            return Err(LobbyError::UnassignedPlayers { count: unassigned });
        }
    }
    if players.len() < MIN_PLAYERS {
        return Err(LobbyError::NotEnoughPlayers {
            count: players.len(),
        });
    }

    let room = store.set_room_status(code, RoomStatus::Playing).await?;
    info!("Room {} started with {} players", code, players.len());
    Ok(room)
}

/// Poll until the room leaves the lobby. Transient store failures are
/// retried; a missing room is returned as an error.
pub async fn wait_for_start(store: &dyn RoomStore, code: &RoomCode, poll_interval: Duration) -> Result<Room, StoreError> {
    let mut interval = tokio::time::interval(poll_interval);
    loop {
        interval.tick().await;
        match store.get_room(code).await {
            Ok(room) if room.status != RoomStatus::Waiting => {
                debug!("Room {} left the lobby ({:?})", code, room.status);
                return Ok(room);
            }
            Ok(_) => {}
            Err(e) if e.is_unavailable() => warn!("Lobby poll of {} failed: {}", code, e),
            Err(e) => return Err(e),
        }
    }
}
