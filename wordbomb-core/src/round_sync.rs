use chrono::{DateTime, Utc};
use tracing::{debug, info};
use wordbomb_types::{Answer, PlayerId, Room, RoomStatus, RoundState};

// Absorbs float drift from summing fractional tick deltas.
const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// No round observed yet.
    Waiting,
    /// Round published with a start time still in the future.
    LeadIn,
    Active,
    Results,
    Paused,
    Finished,
}

/// What `on_round_payload` did with a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOutcome {
    ColdJoin,
    NewRound,
    Duplicate,
    Stale,
}

impl PayloadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, PayloadOutcome::ColdJoin | PayloadOutcome::NewRound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Idle,
    LeadIn { remaining: f64 },
    Running { time_left: f64 },
    /// Fired once per round when the timer first reaches zero.
    TimedOut { round_number: u32 },
    Countdown { remaining: u32 },
    /// Fired once per round when the results countdown reaches zero.
    CountdownElapsed { round_number: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomTransition {
    Unchanged,
    Paused,
    Resumed,
    Finished,
}

/// Per-client view of the current round. Both delivery channels (push
/// notifications and polling) feed the same methods, and every method is
/// idempotent for a repeated input.
#[derive(Debug, Clone)]
pub struct RoundSyncState {
    player_id: PlayerId,
    round_number: u32,
    combo: String,
    time_left: f64,
    time_limit: u32,
    lead_in: f64,
    has_answered_this_round: bool,
    round_answers: Vec<Answer>,
    showing_results: bool,
    countdown_to_next_round: u32,
    last_applied_round_number: Option<u32>,
    timed_out: bool,
    countdown_carry: f64,
    countdown_fired: bool,
    paused: bool,
    finished: bool,
}

impl RoundSyncState {
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            round_number: 0,
            combo: String::new(),
            time_left: 0.0,
            time_limit: 0,
            lead_in: 0.0,
            has_answered_this_round: false,
            round_answers: Vec::new(),
            showing_results: false,
            countdown_to_next_round: 0,
            last_applied_round_number: None,
            timed_out: false,
            countdown_carry: 0.0,
            countdown_fired: false,
            paused: false,
            finished: false,
        }
    }

    /// Apply a round payload from either channel. The timer is derived from
    /// the published start time, never restarted from the full limit.
    pub fn on_round_payload(&mut self, payload: &RoundState, now: DateTime<Utc>) -> PayloadOutcome {
        if self.finished {
            return PayloadOutcome::Stale;
        }

        match self.last_applied_round_number {
            None => {
                self.adopt(payload, now);
                let current = self.round_number;
                self.round_answers.retain(|a| a.round_number == current);
                self.has_answered_this_round = self
                    .round_answers
                    .iter()
                    .any(|a| a.player_id == self.player_id);
                info!(
                    "Cold join into round {} ({}), {:.1}s left",
                    self.round_number, self.combo, self.time_left
                );
                PayloadOutcome::ColdJoin
            }
            Some(last) if payload.round_number > last => {
                self.adopt(payload, now);
                self.has_answered_this_round = false;
                self.round_answers.clear();
                info!(
                    "Round {} started ({}), {:.1}s left",
                    self.round_number, self.combo, self.time_left
                );
                PayloadOutcome::NewRound
            }
            Some(last) if payload.round_number == last => PayloadOutcome::Duplicate,
            Some(last) => {
                debug!(
                    "Ignoring stale round {} (already at {})",
                    payload.round_number, last
                );
                PayloadOutcome::Stale
            }
        }
    }

    fn adopt(&mut self, payload: &RoundState, now: DateTime<Utc>) {
        self.round_number = payload.round_number;
        self.combo = payload.current_combo.clone();
        self.time_limit = payload.time_limit;
        self.time_left = payload.remaining_at(now);
        self.lead_in = payload.lead_in_at(now);
        self.showing_results = false;
        self.countdown_to_next_round = 0;
        self.countdown_carry = 0.0;
        self.countdown_fired = false;
        self.timed_out = false;
        self.last_applied_round_number = Some(payload.round_number);
    }

    /// Advance local clocks by `delta` seconds.
    pub fn tick(&mut self, delta: f64) -> TickOutcome {
        if self.finished || self.paused || self.last_applied_round_number.is_none() {
            return TickOutcome::Idle;
        }

        if self.showing_results {
            return self.tick_countdown(delta);
        }

        if self.timed_out {
            return TickOutcome::Idle;
        }

        let mut delta = delta;
        if self.lead_in > TIME_EPSILON {
            self.lead_in -= delta;
            if self.lead_in > TIME_EPSILON {
                return TickOutcome::LeadIn {
                    remaining: self.lead_in,
                };
            }
            delta = -self.lead_in;
            self.lead_in = 0.0;
        }

        self.time_left -= delta;
        if self.time_left <= TIME_EPSILON {
            self.time_left = 0.0;
            self.timed_out = true;
            info!("Round {} timed out", self.round_number);
            return TickOutcome::TimedOut {
                round_number: self.round_number,
            };
        }

        TickOutcome::Running {
            time_left: self.time_left,
        }
    }

    fn tick_countdown(&mut self, delta: f64) -> TickOutcome {
        if self.countdown_fired {
            return TickOutcome::Idle;
        }

        self.countdown_carry += delta;
        while self.countdown_carry + TIME_EPSILON >= 1.0 && self.countdown_to_next_round > 0 {
            self.countdown_carry -= 1.0;
            self.countdown_to_next_round -= 1;
        }

        if self.countdown_to_next_round == 0 {
            self.countdown_fired = true;
            return TickOutcome::CountdownElapsed {
                round_number: self.round_number,
            };
        }

        TickOutcome::Countdown {
            remaining: self.countdown_to_next_round,
        }
    }

    /// Record an answer for the current round. Returns false for answers of
    /// other rounds and for replays of an answer already held.
    pub fn on_answer_notification(&mut self, answer: &Answer) -> bool {
        if self.last_applied_round_number.is_none() || answer.round_number != self.round_number {
            return false;
        }

        let already_held = self
            .round_answers
            .iter()
            .any(|a| a.player_id == answer.player_id && a.word == answer.word);
        if already_held {
            return false;
        }

        if answer.player_id == self.player_id {
            self.has_answered_this_round = true;
        }
        self.round_answers.push(answer.clone());
        true
    }

    /// Mirror room status into local phase.
    pub fn on_room_update(&mut self, room: &Room) -> RoomTransition {
        if self.finished {
            return RoomTransition::Unchanged;
        }

        match room.status {
            RoomStatus::Finished => {
                self.finished = true;
                self.showing_results = false;
                info!("Room {} finished", room.code);
                RoomTransition::Finished
            }
            RoomStatus::Paused if !self.paused => {
                self.paused = true;
                info!("Room {} paused", room.code);
                RoomTransition::Paused
            }
            RoomStatus::Playing if self.paused => {
                self.paused = false;
                // Adopt the host's frozen clock so late pause observers line up.
                if let Some(remaining) = room.paused_time_remaining {
                    if !self.timed_out && !self.showing_results {
                        self.time_left = (remaining as f64).min(self.time_limit as f64);
                    }
                }
                info!("Room {} resumed", room.code);
                RoomTransition::Resumed
            }
            _ => RoomTransition::Unchanged,
        }
    }

    /// Enter the results phase with a countdown of `countdown` seconds.
    /// A second call for the same round is ignored.
    pub fn begin_results(&mut self, countdown: u32) -> bool {
        if self.showing_results || self.finished {
            return false;
        }
        self.showing_results = true;
        self.countdown_to_next_round = countdown;
        self.countdown_carry = 0.0;
        self.countdown_fired = false;
        true
    }

    pub fn mark_answered(&mut self) {
        self.has_answered_this_round = true;
    }

    /// Force the running timer to zero; the next tick reports the timeout.
    pub fn expire_now(&mut self) {
        if !self.timed_out && !self.showing_results {
            self.lead_in = 0.0;
            self.time_left = 0.0;
        }
    }

    pub fn phase(&self) -> RoundPhase {
        if self.finished {
            RoundPhase::Finished
        } else if self.last_applied_round_number.is_none() {
            RoundPhase::Waiting
        } else if self.paused {
            RoundPhase::Paused
        } else if self.showing_results {
            RoundPhase::Results
        } else if self.lead_in > TIME_EPSILON {
            RoundPhase::LeadIn
        } else {
            RoundPhase::Active
        }
    }

    pub fn can_answer(&self) -> bool {
        self.phase() == RoundPhase::Active
            && !self.timed_out
            && self.time_left > TIME_EPSILON
            && !self.has_answered_this_round
    }

    pub fn used_words_this_round(&self) -> Vec<String> {
        self.round_answers.iter().map(|a| a.word.clone()).collect()
    }

    /// Seconds spent in the current round so far.
    pub fn time_taken(&self) -> f64 {
        (self.time_limit as f64 - self.time_left).max(0.0)
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn combo(&self) -> &str {
        &self.combo
    }

    pub fn time_left(&self) -> f64 {
        self.time_left
    }

    pub fn time_limit(&self) -> u32 {
        self.time_limit
    }

    pub fn lead_in(&self) -> f64 {
        self.lead_in
    }

    pub fn has_answered_this_round(&self) -> bool {
        self.has_answered_this_round
    }

    pub fn round_answers(&self) -> &[Answer] {
        &self.round_answers
    }

    pub fn showing_results(&self) -> bool {
        self.showing_results
    }

    pub fn countdown_to_next_round(&self) -> u32 {
        self.countdown_to_next_round
    }

    pub fn last_applied_round_number(&self) -> Option<u32> {
        self.last_applied_round_number
    }

    pub fn is_timed_out(&self) -> bool {
        self.timed_out
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
