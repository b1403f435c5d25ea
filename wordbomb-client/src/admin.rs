use std::sync::Arc;
use tracing::info;
use wordbomb_store::RoomStore;
use wordbomb_types::{PlayerId, Room, RoomCode, RoomStatus, StoreError};

use crate::chat::post_system_message;
use crate::error::LobbyError;

/// Host controls for a running room. Every action is announced in chat.
pub struct HostAdmin {
    store: Arc<dyn RoomStore>,
    room_code: RoomCode,
    host_id: PlayerId,
}

impl HostAdmin {
    /// Fails with `NotHost` unless `host_id` owns the room.
    pub async fn new(store: Arc<dyn RoomStore>, room_code: RoomCode, host_id: PlayerId) -> Result<Self, LobbyError> {
        let room = store.get_room(&room_code).await?;
        if room.host_id != host_id {
            return Err(LobbyError::NotHost);
        }
        Ok(Self {
            store,
            room_code,
            host_id,
        })
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room_code
    }

    /// Freeze the room with the round's remaining time in whole seconds,
    /// rounded down.
    pub async fn pause(&self, time_remaining: f64) -> Result<Room, StoreError> {
        let seconds = time_remaining.max(0.0).floor() as u32;
        let room = self.store.pause_game(&self.room_code, seconds).await?;
        if room.status == RoomStatus::Paused {
            self.announce("⏸️ Game paused by host").await;
        }
        Ok(room)
    }

    pub async fn resume(&self) -> Result<Room, StoreError> {
        let room = self.store.resume_game(&self.room_code).await?;
        if room.status == RoomStatus::Playing {
            self.announce("▶️ Game resumed by host").await;
        }
        Ok(room)
    }

    /// Remove a player. The host cannot kick themself.
    pub async fn kick(&self, player_id: PlayerId, name: &str) -> Result<(), StoreError> {
        if player_id == self.host_id {
            return Err(StoreError::InvalidSettings {
                reason: "The host cannot be removed".to_string(),
            });
        }
        self.store.kick_player(player_id).await?;
        self.announce(format!("🚫 {} was removed from the game", name)).await;
        Ok(())
    }

    pub async fn end_game(&self) -> Result<Room, StoreError> {
        let room = self
            .store
            .set_room_status(&self.room_code, RoomStatus::Finished)
            .await?;
        info!("Host ended room {}", self.room_code);
        self.announce("🏁 Game ended by host").await;
        Ok(room)
    }

    /// Chat line for a skip. The skip itself runs on the host's session.
    pub async fn announce_skip(&self, round_number: u32) {
        self.announce(format!("⏭️ Round {} skipped by host", round_number)).await;
    }

    async fn announce(&self, message: impl Into<String>) {
        post_system_message(self.store.as_ref(), &self.room_code, message).await;
    }
}
