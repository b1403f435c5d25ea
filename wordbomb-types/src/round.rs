use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{PlayerId, RoomCode};

/// The single live round row of a room. Written only by the round sequencer
/// (the host), read by every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundState {
    pub room_code: RoomCode,
    pub round_number: u32,
    pub current_combo: String,
    pub time_limit: u32,
    pub round_start_time: DateTime<Utc>,
}

impl RoundState {
    /// Seconds of the round still left at `now`, clamped to `[0, time_limit]`.
    /// A start time in the future yields the full limit.
    pub fn remaining_at(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = (now - self.round_start_time).num_milliseconds() as f64 / 1000.0;
        (self.time_limit as f64 - elapsed.max(0.0)).clamp(0.0, self.time_limit as f64)
    }

    /// Seconds until the round opens, zero once it has started.
    pub fn lead_in_at(&self, now: DateTime<Utc>) -> f64 {
        let until_start = (self.round_start_time - now).num_milliseconds() as f64 / 1000.0;
        until_start.max(0.0)
    }
}

/// One accepted submission. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Answer {
    pub room_code: RoomCode,
    pub player_id: PlayerId,
    pub round_number: u32,
    pub word: String, // always lowercase
    pub points: u32,
    pub time_taken: f64,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChatMessage {
    pub room_code: RoomCode,
    pub player_id: Option<PlayerId>, // None for system messages
    pub player_name: String,
    pub message: String,
    pub is_system_message: bool,
    pub created_at: DateTime<Utc>,
}
