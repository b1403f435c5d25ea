use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::PlayerId;

/// Failures reported by the room store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, thiserror::Error)]
#[ts(export)]
pub enum StoreError {
    #[error("store unavailable: {message}")]
    Unavailable { message: String },
    #[error("room {code} not found")]
    RoomNotFound { code: String },
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("name {name} already taken")]
    NameTaken { name: String },
    #[error("player {player_id} not found")]
    PlayerNotFound { player_id: PlayerId },
    #[error("team {team} is full")]
    TeamFull { team: u32 },
    #[error("player already answered round {round_number}")]
    DuplicateAnswer { round_number: u32 },
    #[error("word {word} already used in round {round_number}")]
    WordTaken { word: String, round_number: u32 },
    #[error("round {attempted} is not newer than current round {current}")]
    StaleRound { current: u32, attempted: u32 },
    #[error("invalid room settings: {reason}")]
    InvalidSettings { reason: String },
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }

    /// Text shown on the create/join forms.
    pub fn user_message(&self) -> String {
        match self {
            StoreError::RoomNotFound { .. } => "Room not found".to_string(),
            StoreError::GameAlreadyStarted => "Game already started".to_string(),
            StoreError::NameTaken { .. } => "Name already taken".to_string(),
            StoreError::TeamFull { .. } => "Team is full".to_string(),
            StoreError::InvalidSettings { reason } => format!("Invalid settings: {}", reason),
            _ => "Something went wrong, please try again".to_string(),
        }
    }
}
