#![allow(dead_code)]

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wordbomb_client::{Config, GameSession, lobby};
use wordbomb_core::{GameEvent, GameEventHandler, WordValidator};
use wordbomb_store::{MemoryStore, RoomStore};
use wordbomb_types::{Answer, Difficulty, GameMode, Player, Room, RoomSettings, RoundState};

/// Creates a test WordValidator with a known set of words
pub fn create_test_validator() -> WordValidator {
    let test_words = vec![
        "think", "three", "other", "brother", "weather", "thing", "nothing", "mother",
        "bakery", "baker", "mountain", "fountain", "water", "counter", "station",
    ];
    WordValidator::from_word_list(&test_words.join("\n"))
}

/// Config with no lead-in and instant bots so tests drive time by hand.
pub fn test_config() -> Config {
    Config {
        tick_interval: Duration::from_millis(10),
        poll_interval: Duration::from_millis(20),
        lobby_poll_interval: Duration::from_millis(10),
        results_countdown_secs: 1,
        lead_in_secs: 0,
        bot_delay_scale: 0.0,
        ..Config::default()
    }
}

/// A started room with a host and one guest.
pub struct TestRoomSetup {
    pub memory: Arc<MemoryStore>,
    pub store: Arc<dyn RoomStore>,
    pub validator: Arc<WordValidator>,
    pub config: Config,
    pub room: Room,
    pub host: Player,
    pub guest: Player,
}

impl TestRoomSetup {
    pub async fn new(max_rounds: u32) -> Self {
        Self::with_store(MemoryStore::new(), max_rounds, false).await
    }

    pub async fn with_store(memory: MemoryStore, max_rounds: u32, host_is_spectator: bool) -> Self {
        Self::build(memory, max_rounds, host_is_spectator, 0, 0.0).await
    }

    /// A room with `bots` hard bots whose think time is scaled by `delay_scale`.
    pub async fn with_bots(max_rounds: u32, bots: usize, delay_scale: f64) -> Self {
        Self::build(MemoryStore::new(), max_rounds, false, bots, delay_scale).await
    }

    async fn build(
        memory: MemoryStore,
        max_rounds: u32,
        host_is_spectator: bool,
        bots: usize,
        delay_scale: f64,
    ) -> Self {
        let memory = Arc::new(memory);
        let store: Arc<dyn RoomStore> = memory.clone();

        let mut settings = RoomSettings::new("Host", GameMode::VsAll, Difficulty::Medium);
        settings.max_rounds = max_rounds;
        settings.host_is_spectator = host_is_spectator;
        let (room, host) = lobby::create_room(store.as_ref(), settings).await.unwrap();
        let (guest, _) = lobby::join_room(store.as_ref(), room.code.as_str(), "Guest")
            .await
            .unwrap();

        // A spectating host needs a second participant to start.
        if host_is_spectator {
            store.join_room(&room.code, "Third").await.unwrap();
        }
        if bots > 0 {
            lobby::add_bots(store.as_ref(), &room.code, bots, Difficulty::Hard)
                .await
                .unwrap();
        }
        let room = lobby::start_game(store.as_ref(), &room.code, host.id).await.unwrap();

        Self {
            memory,
            store,
            validator: Arc::new(create_test_validator()),
            config: Config {
                bot_delay_scale: delay_scale,
                ..test_config()
            },
            room,
            host,
            guest,
        }
    }

    pub fn session(&self, player: &Player) -> GameSession {
        GameSession::new(
            self.store.clone(),
            self.validator.clone(),
            self.config.clone(),
            self.room.clone(),
            player,
        )
        .with_rng(StdRng::seed_from_u64(7))
    }

    /// Write a round as the host would.
    pub async fn publish_round(&self, round_number: u32, combo: &str) -> RoundState {
        self.publish_round_at(round_number, combo, Utc::now()).await
    }

    pub async fn publish_round_at(&self, round_number: u32, combo: &str, start: DateTime<Utc>) -> RoundState {
        self.store
            .publish_round_state(&self.room.code, round_number, combo, start)
            .await
            .unwrap()
    }

    pub async fn round_answers(&self, round_number: u32) -> Vec<Answer> {
        self.store
            .list_round_answers(&self.room.code, round_number)
            .await
            .unwrap()
    }

    pub async fn bots(&self) -> Vec<Player> {
        self.store
            .list_active_players(&self.room.code)
            .await
            .unwrap()
            .into_iter()
            .filter(|p| p.is_bot)
            .collect()
    }

    pub async fn score_of(&self, player: &Player) -> u32 {
        self.store
            .list_active_players(&self.room.code)
            .await
            .unwrap()
            .into_iter()
            .find(|p| p.id == player.id)
            .map(|p| p.score)
            .unwrap_or(0)
    }
}

/// Records every session event for later inspection.
#[derive(Clone, Default)]
pub struct EventCollector {
    pub events: Arc<Mutex<Vec<GameEvent>>>,
}

impl EventCollector {
    pub fn events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl GameEventHandler for EventCollector {
    fn handle_event(&mut self, event: GameEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Wait in short real-time steps until every scheduled bot turn has run.
pub async fn settle_bots(session: &GameSession) -> bool {
    for _ in 0..300 {
        if session.pending_bot_turns() == 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
