use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::{PlayerId, StoreError};

pub const ROOM_CODE_LENGTH: usize = 6;

/// External identity of a room. Always stored upper-cased, so lookups are
/// case-insensitive once a code has been parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct RoomCode(String);

impl RoomCode {
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.len() != ROOM_CODE_LENGTH || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StoreError::RoomNotFound { code });
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum GameMode {
    Solo,
    VsAll,
    #[serde(rename = "team_2")]
    Team2,
    #[serde(rename = "team_3")]
    Team3,
    #[serde(rename = "team_4")]
    Team4,
}

impl GameMode {
    pub fn is_team_mode(&self) -> bool {
        self.team_size().is_some()
    }

    /// Players per team, `None` outside team modes.
    pub fn team_size(&self) -> Option<usize> {
        match self {
            GameMode::Team2 => Some(2),
            GameMode::Team3 => Some(3),
            GameMode::Team4 => Some(4),
            GameMode::Solo | GameMode::VsAll => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Round length in seconds.
    pub fn time_limit_secs(&self) -> u32 {
        match self {
            Difficulty::Easy => 15,
            Difficulty::Medium => 10,
            Difficulty::Hard => 7,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum RoomStatus {
    Waiting,  // Lobby, players joining
    Playing,  // Rounds in progress
    Paused,   // Host paused the game
    Finished, // Terminal
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Room {
    pub code: RoomCode,
    pub host_id: PlayerId,
    pub game_mode: GameMode,
    pub difficulty: Difficulty,
    pub max_rounds: u32,
    pub lives_per_player: u32,
    pub points_per_word: u32,
    pub status: RoomStatus,
    pub current_round: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub is_paused: bool,
    pub paused_time_remaining: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    pub fn is_finished(&self) -> bool {
        self.status == RoomStatus::Finished
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.difficulty.time_limit_secs()
    }
}

/// Everything the host chooses when creating a room.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoomSettings {
    pub host_name: String,
    pub game_mode: GameMode,
    pub difficulty: Difficulty,
    pub max_rounds: u32,
    pub lives_per_player: u32,
    pub points_per_word: u32,
    pub host_is_spectator: bool,
}

impl RoomSettings {
    pub fn new(host_name: impl Into<String>, game_mode: GameMode, difficulty: Difficulty) -> Self {
        Self {
            host_name: host_name.into(),
            game_mode,
            difficulty,
            max_rounds: 10,
            lives_per_player: 3,
            points_per_word: 50,
            host_is_spectator: false,
        }
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.host_name.trim().is_empty() {
            return Err(StoreError::InvalidSettings {
                reason: "host name must not be empty".to_string(),
            });
        }
        if self.max_rounds == 0 {
            return Err(StoreError::InvalidSettings {
                reason: "max_rounds must be at least 1".to_string(),
            });
        }
        if self.points_per_word == 0 {
            return Err(StoreError::InvalidSettings {
                reason: "points_per_word must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_code_is_case_insensitive() {
        let lower = RoomCode::parse("ab12cd").unwrap();
        let upper = RoomCode::parse("  AB12CD ").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.as_str(), "AB12CD");
    }

    #[test]
    fn test_room_code_rejects_bad_shapes() {
        assert!(RoomCode::parse("ABC").is_err());
        assert!(RoomCode::parse("ABCDEFG").is_err());
        assert!(RoomCode::parse("AB-12C").is_err());
    }

    #[test]
    fn test_difficulty_time_limits() {
        assert_eq!(Difficulty::Easy.time_limit_secs(), 15);
        assert_eq!(Difficulty::Medium.time_limit_secs(), 10);
        assert_eq!(Difficulty::Hard.time_limit_secs(), 7);
    }

    #[test]
    fn test_game_mode_wire_names() {
        assert_eq!(serde_json::to_string(&GameMode::VsAll).unwrap(), "\"vs_all\"");
        assert_eq!(serde_json::to_string(&GameMode::Team3).unwrap(), "\"team_3\"");
        let parsed: GameMode = serde_json::from_str("\"team_2\"").unwrap();
        assert_eq!(parsed.team_size(), Some(2));
        assert!(!GameMode::VsAll.is_team_mode());
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = RoomSettings::new("Host", GameMode::VsAll, Difficulty::Medium);
        assert!(settings.validate().is_ok());

        settings.max_rounds = 0;
        assert!(matches!(
            settings.validate(),
            Err(StoreError::InvalidSettings { .. })
        ));

        let blank = RoomSettings::new("   ", GameMode::VsAll, Difficulty::Easy);
        assert!(blank.validate().is_err());
    }
}
