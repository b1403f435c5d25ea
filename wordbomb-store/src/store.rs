use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wordbomb_types::{
    Answer, ChatMessage, Difficulty, GameMode, Player, PlayerId, Room, RoomCode, RoomSettings,
    RoomStatus, RoundState, StoreError,
};

use crate::subscription::Subscription;

pub type StoreResult<T> = Result<T, StoreError>;

pub const DEFAULT_CHAT_HISTORY: usize = 50;

/// Authoritative room, player, round, answer and chat state shared by every
/// client in a room. Each call is an independent write; there are no
/// multi-statement transactions.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Create a room and its host player. The code is unique among rooms
    /// that have not finished.
    async fn create_room(&self, settings: RoomSettings) -> StoreResult<(Room, Player)>;

    async fn join_room(&self, code: &RoomCode, name: &str) -> StoreResult<(Player, GameMode)>;

    async fn get_room(&self, code: &RoomCode) -> StoreResult<Room>;

    /// Players that have not left or been kicked, in join order.
    async fn list_active_players(&self, code: &RoomCode) -> StoreResult<Vec<Player>>;

    async fn add_bot(&self, code: &RoomCode, name: &str, difficulty: Difficulty) -> StoreResult<Player>;

    async fn remove_all_bots(&self, code: &RoomCode) -> StoreResult<usize>;

    async fn select_team(&self, player_id: PlayerId, team_number: u32) -> StoreResult<()>;

    async fn leave_team(&self, player_id: PlayerId) -> StoreResult<()>;

    async fn leave_room(&self, player_id: PlayerId) -> StoreResult<()>;

    async fn kick_player(&self, player_id: PlayerId) -> StoreResult<()>;

    async fn set_room_status(&self, code: &RoomCode, status: RoomStatus) -> StoreResult<Room>;

    async fn pause_game(&self, code: &RoomCode, time_remaining: u32) -> StoreResult<Room>;

    async fn resume_game(&self, code: &RoomCode) -> StoreResult<Room>;

    /// Replace the room's round row. Fails with `StaleRound` unless
    /// `round_number` is greater than the current one.
    async fn publish_round_state(
        &self,
        code: &RoomCode,
        round_number: u32,
        combo: &str,
        round_start_time: DateTime<Utc>,
    ) -> StoreResult<RoundState>;

    async fn get_round_state(&self, code: &RoomCode) -> StoreResult<Option<RoundState>>;

    async fn subscribe_round_state(&self, code: &RoomCode) -> StoreResult<Subscription<RoundState>>;

    /// Append an answer. At most one per player and round.
    async fn record_answer(&self, answer: Answer) -> StoreResult<()>;

    async fn list_round_answers(&self, code: &RoomCode, round_number: u32) -> StoreResult<Vec<Answer>>;

    async fn subscribe_answers(&self, code: &RoomCode) -> StoreResult<Subscription<Answer>>;

    /// Atomically add `points` and return the new score.
    async fn increment_player_score(&self, player_id: PlayerId, points: u32) -> StoreResult<u32>;

    async fn send_chat_message(&self, message: ChatMessage) -> StoreResult<()>;

    /// The latest `limit` messages, oldest first.
    async fn list_chat_messages(&self, code: &RoomCode, limit: usize) -> StoreResult<Vec<ChatMessage>>;

    async fn subscribe_chat_messages(&self, code: &RoomCode) -> StoreResult<Subscription<ChatMessage>>;

    async fn subscribe_room(&self, code: &RoomCode) -> StoreResult<Subscription<Room>>;
}
