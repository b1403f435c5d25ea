use rand::Rng;
use tracing::{debug, info};
use wordbomb_types::{PlayerId, Room};

use crate::combos::ComboPicker;

pub const RESULTS_COUNTDOWN_SECS: u32 = 5;

/// Decides who may write round transitions for a room.
pub trait RoundAuthority: Send + Sync {
    fn can_sequence(&self, room: &Room, player_id: PlayerId) -> bool;
}

/// The room's host is the only sequencer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostAuthority;

impl RoundAuthority for HostAuthority {
    fn can_sequence(&self, room: &Room, player_id: PlayerId) -> bool {
        room.host_id == player_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Idle,
    Active { round_number: u32 },
    Results { round_number: u32 },
    /// Next round chosen, waiting for the store to confirm it.
    Advancing { round_number: u32 },
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRound {
    pub round_number: u32,
    pub combo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundDecision {
    /// Last round is over: mark the room finished.
    Finish,
    ShowResults { countdown: u32 },
    /// Publish this round.
    Advance(PendingRound),
    Ignore,
}

/// The host's round sequencer. Followers run the same machine read-only to
/// mirror phases, and only act on its decisions locally.
#[derive(Debug, Clone)]
pub struct HostRoundController {
    max_rounds: u32,
    results_countdown: u32,
    phase: ControllerPhase,
    current_round: u32,
    pending: Option<PendingRound>,
    picker: ComboPicker,
}

impl HostRoundController {
    pub fn new(max_rounds: u32, results_countdown: u32, picker: ComboPicker) -> Self {
        Self {
            max_rounds,
            results_countdown,
            phase: ControllerPhase::Idle,
            current_round: 0,
            pending: None,
            picker,
        }
    }

    /// Pick round 1. Only valid before any round has started.
    pub fn first_combo<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<PendingRound> {
        if self.phase != ControllerPhase::Idle {
            return None;
        }
        let pending = PendingRound {
            round_number: 1,
            combo: self.next_combo(rng),
        };
        self.phase = ControllerPhase::Advancing { round_number: 1 };
        self.pending = Some(pending.clone());
        Some(pending)
    }

    /// A round was observed in the store. Older rounds are ignored.
    pub fn on_round_started(&mut self, round_number: u32, combo: &str) -> bool {
        if self.phase == ControllerPhase::Finished || round_number < self.current_round {
            return false;
        }
        if round_number == self.current_round && self.phase != ControllerPhase::Idle {
            return false;
        }

        self.picker.note(combo);
        self.current_round = round_number;
        self.phase = ControllerPhase::Active { round_number };
        if self
            .pending
            .as_ref()
            .is_some_and(|p| p.round_number <= round_number)
        {
            self.pending = None;
        }
        true
    }

    pub fn on_round_timeout(&mut self, round_number: u32) -> RoundDecision {
        match self.phase {
            ControllerPhase::Active { round_number: active } if active == round_number => {
                if round_number >= self.max_rounds {
                    info!("Final round {} complete, finishing game", round_number);
                    self.phase = ControllerPhase::Finished;
                    RoundDecision::Finish
                } else {
                    self.phase = ControllerPhase::Results { round_number };
                    RoundDecision::ShowResults {
                        countdown: self.results_countdown,
                    }
                }
            }
            _ => {
                debug!("Ignoring timeout for round {} in {:?}", round_number, self.phase);
                RoundDecision::Ignore
            }
        }
    }

    pub fn on_results_elapsed<R: Rng + ?Sized>(&mut self, round_number: u32, rng: &mut R) -> RoundDecision {
        match self.phase {
            ControllerPhase::Results { round_number: shown } if shown == round_number => {
                let next = PendingRound {
                    round_number: round_number + 1,
                    combo: self.next_combo(rng),
                };
                info!("Advancing to round {} ({})", next.round_number, next.combo);
                self.phase = ControllerPhase::Advancing {
                    round_number: next.round_number,
                };
                self.pending = Some(next.clone());
                RoundDecision::Advance(next)
            }
            _ => RoundDecision::Ignore,
        }
    }

    /// Stop sequencing, e.g. when the host ends the game early.
    pub fn finish(&mut self) {
        self.phase = ControllerPhase::Finished;
        self.pending = None;
    }

    /// A chosen round the store has not confirmed yet, for retrying a failed publish.
    pub fn awaiting_publish(&self) -> Option<&PendingRound> {
        self.pending.as_ref()
    }

    /// Draw a combo outside the recency window.
    pub fn next_combo<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        self.picker.draw(rng)
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }
}
