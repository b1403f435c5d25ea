use chrono::Utc;
use tracing::warn;
use wordbomb_store::RoomStore;
use wordbomb_types::{ChatMessage, RoomCode};

pub const SYSTEM_NAME: &str = "System";

/// Post a system line to the room chat. Chat is best-effort, failures are
/// only logged.
pub async fn post_system_message(store: &dyn RoomStore, room_code: &RoomCode, message: impl Into<String>) {
    let message = ChatMessage {
        room_code: room_code.clone(),
        player_id: None,
        player_name: SYSTEM_NAME.to_string(),
        message: message.into(),
        is_system_message: true,
        created_at: Utc::now(),
    };

    if let Err(e) = store.send_chat_message(message).await {
        warn!("Failed to post system message to room {}: {}", room_code, e);
    }
}
