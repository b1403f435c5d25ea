use chrono::Utc;
use tracing::{error, info};
use wordbomb_core::Verdict;
use wordbomb_store::RoomStore;
use wordbomb_types::{Answer, PlayerId, RoomCode, StoreError};

/// Record an accepted word and credit its points. Humans and bots share
/// this path.
///
/// The answer row is the source of truth for "answered this round"; a failed
/// score increment afterwards is logged and swallowed so the round goes on.
pub async fn submit_answer(
    store: &dyn RoomStore,
    room_code: &RoomCode,
    player_id: PlayerId,
    round_number: u32,
    verdict: &Verdict,
    time_taken: f64,
) -> Result<Answer, StoreError> {
    let answer = Answer {
        room_code: room_code.clone(),
        player_id,
        round_number,
        word: verdict.word.clone(),
        points: verdict.points,
        time_taken,
        submitted_at: Utc::now(),
    };

    store.record_answer(answer.clone()).await?;

    match store.increment_player_score(player_id, verdict.points).await {
        Ok(score) => info!(
            "Player {} scored {} with {:?} in round {} (total {})",
            player_id, verdict.points, verdict.word, round_number, score
        ),
        Err(e) => error!(
            "Answer recorded but score update failed for player {}: {}",
            player_id, e
        ),
    }

    Ok(answer)
}
