use rand::Rng;
use std::collections::VecDeque;

pub const DEFAULT_RECENCY_WINDOW: usize = 10;

/// Two-letter prompts every round is drawn from.
pub const LETTER_COMBOS: &[&str] = &[
    "AB", "AC", "AD", "AG", "AI", "AL", "AM", "AN", "AP", "AR", "AS", "AT", "BA", "BE", "BI",
    "BO", "BR", "CA", "CH", "CL", "CO", "CR", "DE", "DI", "DO", "DR", "EA", "ED", "EL", "EN",
    "ER", "ES", "ET", "EX", "FA", "FI", "FL", "FO", "FR", "GE", "GH", "GI", "GO", "GR", "HA",
    "HE", "HI", "HO", "IC", "ID", "IG", "IL", "IN", "IO", "IR", "IS", "IT", "LA", "LE", "LI",
    "LO", "LY", "MA", "ME", "MI", "MO", "NA", "NE", "NG", "NI", "NO", "NT", "OA", "OB", "OC",
    "OD", "OF", "OI", "OK", "OL", "OM", "ON", "OP", "OR", "OS", "OT", "OU", "OV", "OW", "OX",
    "OY", "PA", "PE", "PH", "PI", "PL", "PO", "PR", "QU", "RA", "RE", "RI", "RO", "RU", "SA",
    "SC", "SE", "SH", "SI", "SK", "SL", "SM", "SN", "SO", "SP", "ST", "SU", "SW", "TA", "TE",
    "TH", "TI", "TO", "TR", "TU", "TW", "UN", "UP", "UR", "US", "UT", "VE", "VI", "WA", "WE",
    "WH", "WI", "WO", "WR", "YE", "YO",
];

/// Uniform combo draws that skip the last `window` picks.
#[derive(Debug, Clone)]
pub struct ComboPicker {
    pool: Vec<String>,
    window: usize,
    recent: VecDeque<String>,
}

impl ComboPicker {
    pub fn new(window: usize) -> Self {
        Self::with_pool(LETTER_COMBOS.iter().map(|c| c.to_string()).collect(), window)
    }

    pub fn with_pool(pool: Vec<String>, window: usize) -> Self {
        Self {
            pool,
            window,
            recent: VecDeque::with_capacity(window),
        }
    }

    /// Draw the next combo. When the window covers the whole pool the full
    /// pool is used instead.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> String {
        let fresh: Vec<&String> = self
            .pool
            .iter()
            .filter(|combo| !self.recent.contains(combo))
            .collect();

        let combo = if fresh.is_empty() {
            if self.pool.is_empty() {
                return String::new();
            }
            self.pool[rng.random_range(0..self.pool.len())].clone()
        } else {
            fresh[rng.random_range(0..fresh.len())].clone()
        };

        self.note(&combo);
        combo
    }

    /// Record a combo drawn elsewhere, e.g. one observed in a round payload.
    pub fn note(&mut self, combo: &str) {
        if self.window == 0 {
            return;
        }
        if self.recent.back().is_some_and(|last| last == combo) {
            return;
        }
        self.recent.push_back(combo.to_string());
        while self.recent.len() > self.window {
            self.recent.pop_front();
        }
    }

    pub fn recent(&self) -> impl Iterator<Item = &str> {
        self.recent.iter().map(String::as_str)
    }
}

impl Default for ComboPicker {
    fn default() -> Self {
        Self::new(DEFAULT_RECENCY_WINDOW)
    }
}
