use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Difficulty, PlayerId, RoomCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Player {
    pub id: PlayerId,
    pub room_code: RoomCode,
    pub name: String,
    pub is_host: bool,
    pub is_bot: bool,
    pub bot_difficulty: Option<Difficulty>,
    pub is_spectator: bool,
    pub team_number: Option<u32>,
    pub score: u32,
    pub lives: u32,
    pub is_active: bool, // false once the player left or was kicked
    pub joined_at: DateTime<Utc>,
}

impl Player {
    /// A fresh human player with zero score.
    pub fn new(room_code: RoomCode, name: impl Into<String>, lives: u32) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            room_code,
            name: name.into(),
            is_host: false,
            is_bot: false,
            bot_difficulty: None,
            is_spectator: false,
            team_number: None,
            score: 0,
            lives,
            is_active: true,
            joined_at: Utc::now(),
        }
    }

    pub fn new_bot(room_code: RoomCode, name: impl Into<String>, difficulty: Difficulty, lives: u32) -> Self {
        Self {
            is_bot: true,
            bot_difficulty: Some(difficulty),
            ..Self::new(room_code, name, lives)
        }
    }

    /// Whether this player competes (answers and appears in rankings).
    pub fn is_participant(&self) -> bool {
        self.is_active && !self.is_spectator
    }
}
