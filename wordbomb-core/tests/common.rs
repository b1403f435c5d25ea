#![allow(dead_code)]

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use wordbomb_core::{GameEvent, GameEventHandler, WordValidator};
use wordbomb_types::{Answer, Difficulty, GameMode, Player, PlayerId, Room, RoomCode, RoomStatus, RoundState};

/// Creates a test WordValidator with a known set of words
pub fn create_test_validator() -> WordValidator {
    let word_list = "bakery\nbaker\nmountain\nfountain\nwater\nother\nthe\nthink\nthree\nfrance\nbrother\nweather\nperformer\nlearn\nearth";
    WordValidator::from_word_list(word_list)
}

pub fn test_room_code() -> RoomCode {
    RoomCode::parse("TEST01").unwrap()
}

pub fn create_test_player(name: &str) -> Player {
    Player::new(test_room_code(), name, 3)
}

pub fn create_test_player_with_score(name: &str, score: u32, team: Option<u32>) -> Player {
    let mut player = create_test_player(name);
    player.score = score;
    player.team_number = team;
    player
}

pub fn create_test_room(host_id: PlayerId, max_rounds: u32) -> Room {
    Room {
        code: test_room_code(),
        host_id,
        game_mode: GameMode::VsAll,
        difficulty: Difficulty::Medium,
        max_rounds,
        lives_per_player: 3,
        points_per_word: 50,
        status: RoomStatus::Playing,
        current_round: 0,
        started_at: Some(Utc::now()),
        finished_at: None,
        is_paused: false,
        paused_time_remaining: None,
        created_at: Utc::now(),
    }
}

pub fn create_round(round_number: u32, combo: &str, start: DateTime<Utc>) -> RoundState {
    RoundState {
        room_code: test_room_code(),
        round_number,
        current_combo: combo.to_string(),
        time_limit: Difficulty::Medium.time_limit_secs(),
        round_start_time: start,
    }
}

pub fn create_answer(player_id: PlayerId, round_number: u32, word: &str, points: u32) -> Answer {
    Answer {
        room_code: test_room_code(),
        player_id,
        round_number,
        word: word.to_string(),
        points,
        time_taken: 2.0,
        submitted_at: Utc::now(),
    }
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<GameEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<GameEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn has_event_type(&self, check_fn: impl Fn(&GameEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl GameEventHandler for EventCollector {
    fn handle_event(&mut self, event: GameEvent) {
        self.events.lock().unwrap().push(event);
    }
}
