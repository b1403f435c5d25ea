use rand::Rng;
use tracing::info;
use wordbomb_types::Difficulty;

use crate::combos::ComboPicker;
use crate::word_validation::{Verdict, WordMode, WordValidator};

pub const SOLO_LIVES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SoloTick {
    Running { time_left: f64 },
    /// Timer ran out; a fresh combo is up.
    LifeLost { lives_left: u32 },
    GameOver { score: u32 },
    Idle,
}

/// Local single-player game. Words may not repeat for the whole game.
#[derive(Debug, Clone)]
pub struct SoloGame {
    difficulty: Difficulty,
    score: u32,
    round: u32,
    lives: u32,
    combo: String,
    used_words: Vec<String>,
    time_left: f64,
    picker: ComboPicker,
    over: bool,
}

impl SoloGame {
    pub fn new<R: Rng + ?Sized>(difficulty: Difficulty, mut picker: ComboPicker, rng: &mut R) -> Self {
        let combo = picker.draw(rng);
        Self {
            difficulty,
            score: 0,
            round: 1,
            lives: SOLO_LIVES,
            combo,
            used_words: Vec::new(),
            time_left: difficulty.time_limit_secs() as f64,
            picker,
            over: false,
        }
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, delta: f64, rng: &mut R) -> SoloTick {
        if self.over {
            return SoloTick::Idle;
        }

        self.time_left -= delta;
        if self.time_left > 1e-9 {
            return SoloTick::Running {
                time_left: self.time_left,
            };
        }

        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.time_left = 0.0;
            self.over = true;
            info!("Solo game over with {} points", self.score);
            return SoloTick::GameOver { score: self.score };
        }

        self.next_combo(rng);
        SoloTick::LifeLost {
            lives_left: self.lives,
        }
    }

    /// Judge a word against the current combo. An accepted word scores and
    /// moves straight on to a new combo.
    pub fn submit_word<R: Rng + ?Sized>(&mut self, validator: &WordValidator, word: &str, rng: &mut R) -> Option<Verdict> {
        if self.over {
            return None;
        }

        let verdict = validator.validate(word, &self.combo, &self.used_words, WordMode::Solo);
        if verdict.valid {
            self.score += verdict.points;
            self.used_words.push(verdict.word.clone());
            self.round += 1;
            self.next_combo(rng);
        }
        Some(verdict)
    }

    fn next_combo<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.combo = self.picker.draw(rng);
        self.time_left = self.difficulty.time_limit_secs() as f64;
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn combo(&self) -> &str {
        &self.combo
    }

    pub fn time_left(&self) -> f64 {
        self.time_left
    }

    pub fn used_words(&self) -> &[String] {
        &self.used_words
    }
}
