use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};
use wordbomb_types::{
    Answer, ChatMessage, Difficulty, GameMode, Player, PlayerId, Room, RoomCode, RoomSettings,
    RoomStatus, RoundState, StoreError,
};

use crate::room_code::generate_room_code;
use crate::store::{RoomStore, StoreResult};
use crate::subscription::Subscription;

const CHANNEL_CAPACITY: usize = 64;
const CODE_ATTEMPTS: usize = 100;

struct RoomRecord {
    room: Room,
    players: Vec<Player>,
    round_state: Option<RoundState>,
    answers: Vec<Answer>,
    chat: Vec<ChatMessage>,
    round_tx: broadcast::Sender<RoundState>,
    answer_tx: broadcast::Sender<Answer>,
    chat_tx: broadcast::Sender<ChatMessage>,
    room_tx: broadcast::Sender<Room>,
}

impl RoomRecord {
    fn new(room: Room) -> Self {
        Self {
            room,
            players: Vec::new(),
            round_state: None,
            answers: Vec::new(),
            chat: Vec::new(),
            round_tx: broadcast::channel(CHANNEL_CAPACITY).0,
            answer_tx: broadcast::channel(CHANNEL_CAPACITY).0,
            chat_tx: broadcast::channel(CHANNEL_CAPACITY).0,
            room_tx: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    fn player_mut(&mut self, player_id: PlayerId) -> StoreResult<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(StoreError::PlayerNotFound { player_id })
    }

    fn name_taken(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.is_active && p.name == name)
    }
}

/// In-process `RoomStore`. Push notifications can be made lossy and the
/// whole store can be taken offline to exercise the polling backstop.
pub struct MemoryStore {
    rooms: RwLock<HashMap<RoomCode, RoomRecord>>,
    player_rooms: DashMap<PlayerId, RoomCode>,
    available: AtomicBool,
    drop_rate: f64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            player_rooms: DashMap::new(),
            available: AtomicBool::new(true),
            drop_rate: 0.0,
        }
    }

    /// Drop this fraction of push notifications. Stored state is unaffected.
    pub fn with_notification_drop_rate(mut self, rate: f64) -> Self {
        self.drop_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// While unavailable every call fails with `StoreError::Unavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
        info!("Store availability set to {}", available);
    }

    fn ensure_available(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable {
                message: "store is offline".to_string(),
            })
        }
    }

    fn room_of(&self, player_id: PlayerId) -> StoreResult<RoomCode> {
        self.player_rooms
            .get(&player_id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::PlayerNotFound { player_id })
    }

    fn notify<T>(&self, tx: &broadcast::Sender<T>, value: T) {
        if self.drop_rate > 0.0 && rand::rng().random_bool(self.drop_rate) {
            debug!("Dropped a push notification");
            return;
        }
        // No receivers is fine.
        let _ = tx.send(value);
    }

    fn fresh_code(rooms: &HashMap<RoomCode, RoomRecord>) -> StoreResult<RoomCode> {
        let mut rng = rand::rng();
        for _ in 0..CODE_ATTEMPTS {
            let code = generate_room_code(&mut rng)?;
            match rooms.get(&code) {
                Some(record) if !record.room.is_finished() => continue,
                _ => return Ok(code),
            }
        }
        Err(StoreError::Unavailable {
            message: "could not allocate a room code".to_string(),
        })
    }

    async fn update_player(
        &self,
        player_id: PlayerId,
        apply: impl FnOnce(&mut RoomRecord, PlayerId) -> StoreResult<()> + Send,
    ) -> StoreResult<()> {
        self.ensure_available()?;
        let code = self.room_of(player_id)?;
        let mut rooms = self.rooms.write().await;
        let record = rooms
            .get_mut(&code)
            .ok_or_else(|| StoreError::RoomNotFound { code: code.to_string() })?;
        apply(record, player_id)
    }

    async fn update_room(
        &self,
        code: &RoomCode,
        apply: impl FnOnce(&mut Room) + Send,
    ) -> StoreResult<Room> {
        self.ensure_available()?;
        let mut rooms = self.rooms.write().await;
        let record = rooms
            .get_mut(code)
            .ok_or_else(|| StoreError::RoomNotFound { code: code.to_string() })?;
        apply(&mut record.room);
        let room = record.room.clone();
        self.notify(&record.room_tx, room.clone());
        Ok(room)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(code: &RoomCode) -> StoreError {
    StoreError::RoomNotFound {
        code: code.to_string(),
    }
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create_room(&self, settings: RoomSettings) -> StoreResult<(Room, Player)> {
        self.ensure_available()?;
        settings.validate()?;

        let mut rooms = self.rooms.write().await;
        let code = Self::fresh_code(&rooms)?;
        if let Some(old) = rooms.remove(&code) {
            for player in old.players {
                self.player_rooms.remove(&player.id);
            }
        }

        let mut host = Player::new(code.clone(), settings.host_name.trim(), settings.lives_per_player);
        host.is_host = true;
        host.is_spectator = settings.host_is_spectator;

        let room = Room {
            code: code.clone(),
            host_id: host.id,
            game_mode: settings.game_mode,
            difficulty: settings.difficulty,
            max_rounds: settings.max_rounds,
            lives_per_player: settings.lives_per_player,
            points_per_word: settings.points_per_word,
            status: RoomStatus::Waiting,
            current_round: 0,
            started_at: None,
            finished_at: None,
            is_paused: false,
            paused_time_remaining: None,
            created_at: Utc::now(),
        };

        let mut record = RoomRecord::new(room.clone());
        record.players.push(host.clone());
        rooms.insert(code.clone(), record);
        self.player_rooms.insert(host.id, code.clone());

        info!("Created room {} hosted by {}", code, host.name);
        Ok((room, host))
    }

    async fn join_room(&self, code: &RoomCode, name: &str) -> StoreResult<(Player, GameMode)> {
        self.ensure_available()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::InvalidSettings {
                reason: "player name is empty".to_string(),
            });
        }

        let mut rooms = self.rooms.write().await;
        let record = rooms.get_mut(code).ok_or_else(|| not_found(code))?;
        if record.room.status != RoomStatus::Waiting {
            return Err(StoreError::GameAlreadyStarted);
        }
        if record.name_taken(name) {
            return Err(StoreError::NameTaken {
                name: name.to_string(),
            });
        }

        let player = Player::new(code.clone(), name, record.room.lives_per_player);
        record.players.push(player.clone());
        self.player_rooms.insert(player.id, code.clone());

        info!("{} joined room {}", player.name, code);
        Ok((player, record.room.game_mode))
    }

    async fn get_room(&self, code: &RoomCode) -> StoreResult<Room> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        rooms
            .get(code)
            .map(|record| record.room.clone())
            .ok_or_else(|| not_found(code))
    }

    async fn list_active_players(&self, code: &RoomCode) -> StoreResult<Vec<Player>> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        let record = rooms.get(code).ok_or_else(|| not_found(code))?;
        Ok(record.players.iter().filter(|p| p.is_active).cloned().collect())
    }

    async fn add_bot(&self, code: &RoomCode, name: &str, difficulty: Difficulty) -> StoreResult<Player> {
        self.ensure_available()?;
        let mut rooms = self.rooms.write().await;
        let record = rooms.get_mut(code).ok_or_else(|| not_found(code))?;
        if record.room.status != RoomStatus::Waiting {
            return Err(StoreError::GameAlreadyStarted);
        }
        if record.name_taken(name) {
            return Err(StoreError::NameTaken {
                name: name.to_string(),
            });
        }

        let bot = Player::new_bot(code.clone(), name, difficulty, record.room.lives_per_player);
        record.players.push(bot.clone());
        self.player_rooms.insert(bot.id, code.clone());

        info!("Added {:?} bot {} to room {}", difficulty, bot.name, code);
        Ok(bot)
    }

    async fn remove_all_bots(&self, code: &RoomCode) -> StoreResult<usize> {
        self.ensure_available()?;
        let mut rooms = self.rooms.write().await;
        let record = rooms.get_mut(code).ok_or_else(|| not_found(code))?;

        let mut removed = 0;
        for bot in record.players.iter_mut().filter(|p| p.is_bot && p.is_active) {
            bot.is_active = false;
            removed += 1;
        }
        info!("Removed {} bots from room {}", removed, code);
        Ok(removed)
    }

    async fn select_team(&self, player_id: PlayerId, team_number: u32) -> StoreResult<()> {
        self.update_player(player_id, |record, player_id| {
            let team_size = record.room.game_mode.team_size().ok_or_else(|| {
                StoreError::InvalidSettings {
                    reason: "room has no teams".to_string(),
                }
            })?;
            if team_number == 0 {
                return Err(StoreError::InvalidSettings {
                    reason: "teams are numbered from 1".to_string(),
                });
            }

            let members = record
                .players
                .iter()
                .filter(|p| p.is_active && p.id != player_id && p.team_number == Some(team_number))
                .count();
            if members >= team_size {
                return Err(StoreError::TeamFull { team: team_number });
            }

            record.player_mut(player_id)?.team_number = Some(team_number);
            debug!("Player {} joined team {}", player_id, team_number);
            Ok(())
        })
        .await
    }

    async fn leave_team(&self, player_id: PlayerId) -> StoreResult<()> {
        self.update_player(player_id, |record, player_id| {
            record.player_mut(player_id)?.team_number = None;
            Ok(())
        })
        .await
    }

    async fn leave_room(&self, player_id: PlayerId) -> StoreResult<()> {
        self.update_player(player_id, |record, player_id| {
            let player = record.player_mut(player_id)?;
            player.is_active = false;
            info!("{} left room {}", player.name, player.room_code);
            Ok(())
        })
        .await
    }

    async fn kick_player(&self, player_id: PlayerId) -> StoreResult<()> {
        self.update_player(player_id, |record, player_id| {
            let player = record.player_mut(player_id)?;
            player.is_active = false;
            info!("{} was kicked from room {}", player.name, player.room_code);
            Ok(())
        })
        .await
    }

    async fn set_room_status(&self, code: &RoomCode, status: RoomStatus) -> StoreResult<Room> {
        self.update_room(code, |room| {
            if room.is_finished() {
                debug!("Room {} already finished, ignoring {:?}", room.code, status);
                return;
            }
            let now = Utc::now();
            room.status = status;
            match status {
                RoomStatus::Playing => {
                    room.started_at.get_or_insert(now);
                    room.is_paused = false;
                }
                RoomStatus::Paused => room.is_paused = true,
                RoomStatus::Finished => {
                    room.finished_at = Some(now);
                    room.is_paused = false;
                }
                RoomStatus::Waiting => {}
            }
            info!("Room {} is now {:?}", room.code, status);
        })
        .await
    }

    async fn pause_game(&self, code: &RoomCode, time_remaining: u32) -> StoreResult<Room> {
        self.update_room(code, |room| {
            if room.status != RoomStatus::Playing {
                return;
            }
            room.status = RoomStatus::Paused;
            room.is_paused = true;
            room.paused_time_remaining = Some(time_remaining);
            info!("Room {} paused with {}s left", room.code, time_remaining);
        })
        .await
    }

    async fn resume_game(&self, code: &RoomCode) -> StoreResult<Room> {
        self.ensure_available()?;
        let mut rooms = self.rooms.write().await;
        let record = rooms.get_mut(code).ok_or_else(|| not_found(code))?;
        if record.room.status != RoomStatus::Paused {
            return Ok(record.room.clone());
        }
        record.room.status = RoomStatus::Playing;
        record.room.is_paused = false;
        info!("Room {} resumed", code);

        // Re-anchor the round so a fresh reader derives the frozen time.
        // Same round number, so live readers treat it as a duplicate.
        if let (Some(round), Some(remaining)) =
            (record.round_state.as_mut(), record.room.paused_time_remaining)
        {
            let remaining = remaining.min(round.time_limit);
            round.round_start_time =
                Utc::now() - chrono::Duration::seconds((round.time_limit - remaining) as i64);
            debug!("Round {} of {} re-anchored with {}s left", round.round_number, code, remaining);
            let round = round.clone();
            self.notify(&record.round_tx, round);
        }

        let room = record.room.clone();
        self.notify(&record.room_tx, room.clone());
        Ok(room)
    }

    async fn publish_round_state(
        &self,
        code: &RoomCode,
        round_number: u32,
        combo: &str,
        round_start_time: DateTime<Utc>,
    ) -> StoreResult<RoundState> {
        self.ensure_available()?;
        let mut rooms = self.rooms.write().await;
        let record = rooms.get_mut(code).ok_or_else(|| not_found(code))?;

        let current = record.round_state.as_ref().map_or(0, |r| r.round_number);
        if round_number <= current || record.room.is_finished() {
            warn!(
                "Rejected round {} for room {} (current {})",
                round_number, code, current
            );
            return Err(StoreError::StaleRound {
                current,
                attempted: round_number,
            });
        }

        let round = RoundState {
            room_code: code.clone(),
            round_number,
            current_combo: combo.to_string(),
            time_limit: record.room.time_limit_secs(),
            round_start_time,
        };
        record.round_state = Some(round.clone());
        record.room.current_round = round_number;

        info!("Room {} round {} published ({})", code, round_number, combo);
        self.notify(&record.round_tx, round.clone());
        self.notify(&record.room_tx, record.room.clone());
        Ok(round)
    }

    async fn get_round_state(&self, code: &RoomCode) -> StoreResult<Option<RoundState>> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        let record = rooms.get(code).ok_or_else(|| not_found(code))?;
        Ok(record.round_state.clone())
    }

    async fn subscribe_round_state(&self, code: &RoomCode) -> StoreResult<Subscription<RoundState>> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        let record = rooms.get(code).ok_or_else(|| not_found(code))?;
        Ok(Subscription::new(format!("round:{}", code), record.round_tx.subscribe()))
    }

    async fn record_answer(&self, answer: Answer) -> StoreResult<()> {
        self.ensure_available()?;
        let mut rooms = self.rooms.write().await;
        let record = rooms
            .get_mut(&answer.room_code)
            .ok_or_else(|| not_found(&answer.room_code))?;

        let duplicate = record
            .answers
            .iter()
            .any(|a| a.player_id == answer.player_id && a.round_number == answer.round_number);
        if duplicate {
            return Err(StoreError::DuplicateAnswer {
                round_number: answer.round_number,
            });
        }
        let word_taken = record
            .answers
            .iter()
            .any(|a| a.round_number == answer.round_number && a.word.eq_ignore_ascii_case(&answer.word));
        if word_taken {
            return Err(StoreError::WordTaken {
                word: answer.word,
                round_number: answer.round_number,
            });
        }

        debug!(
            "Answer {} from {} in round {}",
            answer.word, answer.player_id, answer.round_number
        );
        record.answers.push(answer.clone());
        self.notify(&record.answer_tx, answer);
        Ok(())
    }

    async fn list_round_answers(&self, code: &RoomCode, round_number: u32) -> StoreResult<Vec<Answer>> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        let record = rooms.get(code).ok_or_else(|| not_found(code))?;
        Ok(record
            .answers
            .iter()
            .filter(|a| a.round_number == round_number)
            .cloned()
            .collect())
    }

    async fn subscribe_answers(&self, code: &RoomCode) -> StoreResult<Subscription<Answer>> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        let record = rooms.get(code).ok_or_else(|| not_found(code))?;
        Ok(Subscription::new(format!("answers:{}", code), record.answer_tx.subscribe()))
    }

    async fn increment_player_score(&self, player_id: PlayerId, points: u32) -> StoreResult<u32> {
        let mut new_score = 0;
        self.update_player(player_id, |record, player_id| {
            let player = record.player_mut(player_id)?;
            player.score += points;
            new_score = player.score;
            Ok(())
        })
        .await?;
        Ok(new_score)
    }

    async fn send_chat_message(&self, message: ChatMessage) -> StoreResult<()> {
        self.ensure_available()?;
        let mut rooms = self.rooms.write().await;
        let record = rooms
            .get_mut(&message.room_code)
            .ok_or_else(|| not_found(&message.room_code))?;
        record.chat.push(message.clone());
        self.notify(&record.chat_tx, message);
        Ok(())
    }

    async fn list_chat_messages(&self, code: &RoomCode, limit: usize) -> StoreResult<Vec<ChatMessage>> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        let record = rooms.get(code).ok_or_else(|| not_found(code))?;
        let start = record.chat.len().saturating_sub(limit);
        Ok(record.chat[start..].to_vec())
    }

    async fn subscribe_chat_messages(&self, code: &RoomCode) -> StoreResult<Subscription<ChatMessage>> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        let record = rooms.get(code).ok_or_else(|| not_found(code))?;
        Ok(Subscription::new(format!("chat:{}", code), record.chat_tx.subscribe()))
    }

    async fn subscribe_room(&self, code: &RoomCode) -> StoreResult<Subscription<Room>> {
        self.ensure_available()?;
        let rooms = self.rooms.read().await;
        let record = rooms.get(code).ok_or_else(|| not_found(code))?;
        Ok(Subscription::new(format!("room:{}", code), record.room_tx.subscribe()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn create_test_room(store: &MemoryStore, mode: GameMode) -> (Room, Player) {
        let settings = RoomSettings::new("Host", mode, Difficulty::Medium);
        store.create_room(settings).await.unwrap()
    }

    fn answer(room: &Room, player_id: PlayerId, round_number: u32, word: &str) -> Answer {
        Answer {
            room_code: room.code.clone(),
            player_id,
            round_number,
            word: word.to_string(),
            points: 50,
            time_taken: 1.5,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_join_room() {
        let store = MemoryStore::new();
        let (room, host) = create_test_room(&store, GameMode::VsAll).await;
        assert!(host.is_host);
        assert_eq!(room.status, RoomStatus::Waiting);
        assert_eq!(room.host_id, host.id);

        let lower = RoomCode::parse(&room.code.as_str().to_lowercase()).unwrap();
        let (player, mode) = store.join_room(&lower, "Alice").await.unwrap();
        assert_eq!(mode, GameMode::VsAll);
        assert_eq!(player.lives, 3);
        assert_eq!(store.list_active_players(&room.code).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_join_preconditions() {
        let store = MemoryStore::new();
        let (room, _) = create_test_room(&store, GameMode::VsAll).await;

        let missing = RoomCode::parse("ZZZZZZ").unwrap();
        assert!(matches!(
            store.join_room(&missing, "Alice").await,
            Err(StoreError::RoomNotFound { .. })
        ));

        store.join_room(&room.code, "Alice").await.unwrap();
        let taken = store.join_room(&room.code, "Alice").await.unwrap_err();
        assert_eq!(taken.user_message(), "Name already taken");
        // Names are case-sensitive.
        store.join_room(&room.code, "alice").await.unwrap();

        store.set_room_status(&room.code, RoomStatus::Playing).await.unwrap();
        assert_eq!(
            store.join_room(&room.code, "Late").await,
            Err(StoreError::GameAlreadyStarted)
        );
    }

    #[tokio::test]
    async fn test_round_numbers_only_increase() {
        let store = MemoryStore::new();
        let (room, _) = create_test_room(&store, GameMode::VsAll).await;
        let now = Utc::now();

        let first = store.publish_round_state(&room.code, 1, "ER", now).await.unwrap();
        assert_eq!(first.time_limit, 10);
        store.publish_round_state(&room.code, 2, "TH", now).await.unwrap();

        assert_eq!(
            store.publish_round_state(&room.code, 2, "AB", now).await,
            Err(StoreError::StaleRound { current: 2, attempted: 2 })
        );
        let current = store.get_round_state(&room.code).await.unwrap().unwrap();
        assert_eq!(current.current_combo, "TH");
        assert_eq!(store.get_room(&room.code).await.unwrap().current_round, 2);
    }

    #[tokio::test]
    async fn test_one_answer_per_player_per_round() {
        let store = MemoryStore::new();
        let (room, host) = create_test_room(&store, GameMode::VsAll).await;

        store.record_answer(answer(&room, host.id, 1, "bakery")).await.unwrap();
        assert_eq!(
            store.record_answer(answer(&room, host.id, 1, "water")).await,
            Err(StoreError::DuplicateAnswer { round_number: 1 })
        );
        store.record_answer(answer(&room, host.id, 2, "water")).await.unwrap();
        assert_eq!(store.list_round_answers(&room.code, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_word_taken_once_per_round() {
        let store = MemoryStore::new();
        let (room, host) = create_test_room(&store, GameMode::VsAll).await;
        let (alice, _) = store.join_room(&room.code, "Alice").await.unwrap();

        store.record_answer(answer(&room, host.id, 1, "bakery")).await.unwrap();
        assert_eq!(
            store.record_answer(answer(&room, alice.id, 1, "Bakery")).await,
            Err(StoreError::WordTaken {
                word: "Bakery".to_string(),
                round_number: 1
            })
        );
        store.record_answer(answer(&room, alice.id, 1, "baker")).await.unwrap();
        store.record_answer(answer(&room, alice.id, 2, "bakery")).await.unwrap();
    }

    #[tokio::test]
    async fn test_resume_reanchors_round_start() {
        let store = MemoryStore::new();
        let (room, _) = create_test_room(&store, GameMode::VsAll).await;
        store.set_room_status(&room.code, RoomStatus::Playing).await.unwrap();

        let started = Utc::now() - chrono::Duration::seconds(8);
        store.publish_round_state(&room.code, 1, "ER", started).await.unwrap();
        store.pause_game(&room.code, 6).await.unwrap();

        let mut rounds = store.subscribe_round_state(&room.code).await.unwrap();
        store.resume_game(&room.code).await.unwrap();

        let round = store.get_round_state(&room.code).await.unwrap().unwrap();
        assert_eq!(round.round_number, 1);
        assert!((round.remaining_at(Utc::now()) - 6.0).abs() < 0.5);
        assert_eq!(rounds.recv().await.unwrap().round_number, 1);

        // Resuming a room that is not paused leaves the round alone.
        store.resume_game(&room.code).await.unwrap();
        let again = store.get_round_state(&room.code).await.unwrap().unwrap();
        assert_eq!(again.round_start_time, round.round_start_time);
    }

    #[tokio::test]
    async fn test_subscriptions_deliver_changes() {
        let store = MemoryStore::new();
        let (room, host) = create_test_room(&store, GameMode::VsAll).await;
        let mut rounds = store.subscribe_round_state(&room.code).await.unwrap();
        let mut answers = store.subscribe_answers(&room.code).await.unwrap();

        store.publish_round_state(&room.code, 1, "ER", Utc::now()).await.unwrap();
        store.record_answer(answer(&room, host.id, 1, "bakery")).await.unwrap();

        assert_eq!(rounds.recv().await.unwrap().round_number, 1);
        assert_eq!(answers.recv().await.unwrap().word, "bakery");

        rounds.unsubscribe();
        store.publish_round_state(&room.code, 2, "TH", Utc::now()).await.unwrap();
        assert!(rounds.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_dropped_notifications_keep_state() {
        let store = MemoryStore::new().with_notification_drop_rate(1.0);
        let (room, _) = create_test_room(&store, GameMode::VsAll).await;
        let mut rounds = store.subscribe_round_state(&room.code).await.unwrap();

        store.publish_round_state(&room.code, 1, "ER", Utc::now()).await.unwrap();
        assert!(rounds.try_recv().is_none());
        assert!(store.get_round_state(&room.code).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_team_capacity() {
        let store = MemoryStore::new();
        let (room, host) = create_test_room(&store, GameMode::Team2).await;
        let (alice, _) = store.join_room(&room.code, "Alice").await.unwrap();
        let (bob, _) = store.join_room(&room.code, "Bob").await.unwrap();

        store.select_team(host.id, 1).await.unwrap();
        store.select_team(alice.id, 1).await.unwrap();
        let full = store.select_team(bob.id, 1).await.unwrap_err();
        assert_eq!(full, StoreError::TeamFull { team: 1 });
        assert_eq!(full.user_message(), "Team is full");

        // Re-selecting your own team is not a capacity problem.
        store.select_team(alice.id, 1).await.unwrap();

        store.leave_team(alice.id).await.unwrap();
        store.select_team(bob.id, 1).await.unwrap();
    }

    #[tokio::test]
    async fn test_score_increment_is_cumulative() {
        let store = MemoryStore::new();
        let (room, host) = create_test_room(&store, GameMode::VsAll).await;

        let handles: Vec<_> = (0..10).map(|_| store.increment_player_score(host.id, 5)).collect();
        for handle in handles {
            handle.await.unwrap();
        }
        let players = store.list_active_players(&room.code).await.unwrap();
        assert_eq!(players[0].score, 50);
    }

    #[tokio::test]
    async fn test_kick_and_bots_are_soft_deleted() {
        let store = MemoryStore::new();
        let (room, _) = create_test_room(&store, GameMode::VsAll).await;
        let (alice, _) = store.join_room(&room.code, "Alice").await.unwrap();
        store.add_bot(&room.code, "SwiftFox", Difficulty::Hard).await.unwrap();
        store.add_bot(&room.code, "LazyPanda", Difficulty::Easy).await.unwrap();

        store.kick_player(alice.id).await.unwrap();
        assert_eq!(store.remove_all_bots(&room.code).await.unwrap(), 2);
        assert_eq!(store.list_active_players(&room.code).await.unwrap().len(), 1);

        // Kicked names can be reused.
        store.join_room(&room.code, "Alice").await.unwrap();
    }

    #[tokio::test]
    async fn test_pause_and_resume() {
        let store = MemoryStore::new();
        let (room, _) = create_test_room(&store, GameMode::VsAll).await;
        let mut updates = store.subscribe_room(&room.code).await.unwrap();

        store.set_room_status(&room.code, RoomStatus::Playing).await.unwrap();
        let paused = store.pause_game(&room.code, 6).await.unwrap();
        assert_eq!(paused.status, RoomStatus::Paused);
        assert_eq!(paused.paused_time_remaining, Some(6));

        let resumed = store.resume_game(&room.code).await.unwrap();
        assert_eq!(resumed.status, RoomStatus::Playing);
        assert!(!resumed.is_paused);

        assert_eq!(updates.recv().await.unwrap().status, RoomStatus::Playing);
        assert_eq!(updates.recv().await.unwrap().status, RoomStatus::Paused);
    }

    #[tokio::test]
    async fn test_finished_is_terminal() {
        let store = MemoryStore::new();
        let (room, _) = create_test_room(&store, GameMode::VsAll).await;
        store.set_room_status(&room.code, RoomStatus::Finished).await.unwrap();

        let room = store.set_room_status(&room.code, RoomStatus::Playing).await.unwrap();
        assert_eq!(room.status, RoomStatus::Finished);
        assert!(room.finished_at.is_some());
        assert!(matches!(
            store.publish_round_state(&room.code, 1, "ER", Utc::now()).await,
            Err(StoreError::StaleRound { .. })
        ));
    }

    #[tokio::test]
    async fn test_chat_history_limit() {
        let store = MemoryStore::new();
        let (room, host) = create_test_room(&store, GameMode::VsAll).await;
        for i in 0..5 {
            store
                .send_chat_message(ChatMessage {
                    room_code: room.code.clone(),
                    player_id: Some(host.id),
                    player_name: host.name.clone(),
                    message: format!("msg {}", i),
                    is_system_message: false,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let recent = store.list_chat_messages(&room.code, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].message, "msg 3");
    }

    #[tokio::test]
    async fn test_offline_store_reports_unavailable() {
        let store = MemoryStore::new();
        let (room, _) = create_test_room(&store, GameMode::VsAll).await;

        store.set_available(false);
        let err = store.get_room(&room.code).await.unwrap_err();
        assert!(err.is_unavailable());
        assert!(store.increment_player_score(Uuid::new_v4(), 1).await.is_err());

        store.set_available(true);
        assert!(store.get_room(&room.code).await.is_ok());
    }
}
