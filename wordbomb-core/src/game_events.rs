use wordbomb_types::{Answer, PlayerId, RoomCode};

use crate::scoring::Standings;

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    RoundStarted {
        room_code: RoomCode,
        round_number: u32,
        combo: String,
        time_left: f64,
    },
    AnswerAccepted {
        room_code: RoomCode,
        answer: Answer,
    },
    RoundTimedOut {
        room_code: RoomCode,
        round_number: u32,
    },
    ResultsShown {
        room_code: RoomCode,
        round_number: u32,
        countdown: u32,
    },
    GamePaused {
        room_code: RoomCode,
        time_remaining: u32,
    },
    GameResumed {
        room_code: RoomCode,
    },
    PlayerKicked {
        room_code: RoomCode,
        player_id: PlayerId,
    },
    GameFinished {
        room_code: RoomCode,
        standings: Standings,
    },
}

impl GameEvent {
    pub fn room_code(&self) -> &RoomCode {
        match self {
            GameEvent::RoundStarted { room_code, .. } => room_code,
            GameEvent::AnswerAccepted { room_code, .. } => room_code,
            GameEvent::RoundTimedOut { room_code, .. } => room_code,
            GameEvent::ResultsShown { room_code, .. } => room_code,
            GameEvent::GamePaused { room_code, .. } => room_code,
            GameEvent::GameResumed { room_code } => room_code,
            GameEvent::PlayerKicked { room_code, .. } => room_code,
            GameEvent::GameFinished { room_code, .. } => room_code,
        }
    }
}

/// Event handler trait for reacting to round lifecycle events
pub trait GameEventHandler: Send {
    fn handle_event(&mut self, event: GameEvent);
}

/// Simple event bus for distributing game events
pub struct GameEventBus {
    handlers: Vec<Box<dyn GameEventHandler>>,
}

impl GameEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: GameEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl Default for GameEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct TestHandler {
        events: Arc<Mutex<Vec<GameEvent>>>,
    }

    impl GameEventHandler for TestHandler {
        fn handle_event(&mut self, event: GameEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[test]
    fn test_event_bus_fans_out() {
        let mut bus = GameEventBus::new();
        let first = Arc::new(Mutex::new(Vec::new()));
        let second = Arc::new(Mutex::new(Vec::new()));
        bus.add_handler(Box::new(TestHandler { events: first.clone() }));
        bus.add_handler(Box::new(TestHandler { events: second.clone() }));

        let room_code = RoomCode::parse("ABCDEF").unwrap();
        bus.publish(GameEvent::RoundTimedOut {
            room_code: room_code.clone(),
            round_number: 2,
        });

        assert_eq!(bus.handler_count(), 2);
        assert_eq!(first.lock().unwrap().len(), 1);
        assert_eq!(second.lock().unwrap()[0].room_code(), &room_code);
    }
}
