use rand::Rng;
use std::ops::RangeInclusive;
use std::time::Duration;
use wordbomb_types::Difficulty;

use crate::word_validation::WordValidator;

const ADJECTIVES: &[&str] = &[
    "Swift", "Lazy", "Clever", "Brave", "Quiet", "Wild", "Happy", "Angry", "Cold", "Warm",
    "Sleepy", "Jumpy", "Sneaky", "Mighty", "Tiny", "Giant", "Quick", "Slow", "Wise", "Silly",
    "Fierce", "Gentle", "Proud", "Shy", "Bold", "Calm", "Crazy", "Cool", "Dark", "Bright",
    "Lucky", "Dizzy", "Grumpy", "Jolly", "Nimble", "Rusty", "Shiny", "Smooth", "Spiky", "Fluffy",
];

const ANIMALS: &[&str] = &[
    "Dog", "Cat", "Fox", "Bear", "Lion", "Tiger", "Wolf", "Panda", "Rabbit", "Mouse", "Eagle",
    "Hawk", "Raven", "Owl", "Penguin", "Dolphin", "Shark", "Whale", "Seal", "Otter", "Deer",
    "Moose", "Elk", "Zebra", "Giraffe", "Elephant", "Rhino", "Hippo", "Koala", "Sloth",
    "Monkey", "Gorilla", "Cheetah", "Leopard", "Jaguar", "Lynx", "Cougar", "Badger", "Raccoon",
    "Squirrel",
];

const NAME_ATTEMPTS: usize = 100;
const FALLBACK_MIN_LENGTH: usize = 4;

/// How a bot of a given difficulty plays.
#[derive(Debug, Clone, PartialEq)]
pub struct BotProfile {
    pub delay_ms: RangeInclusive<u64>,
    pub word_length: RangeInclusive<usize>,
    /// Chance of sitting a round out.
    pub failure_rate: f64,
}

impl BotProfile {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                delay_ms: 3000..=5000,
                word_length: 4..=6,
                failure_rate: 0.10,
            },
            Difficulty::Medium => Self {
                delay_ms: 2000..=3000,
                word_length: 5..=8,
                failure_rate: 0.05,
            },
            Difficulty::Hard => Self {
                delay_ms: 1000..=2000,
                word_length: 7..=12,
                failure_rate: 0.02,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotPlan {
    /// Let the round time out.
    Skip,
    AnswerAfter(Duration),
}

/// Roll one bot's turn for a new round.
pub fn plan_bot_turn<R: Rng + ?Sized>(profile: &BotProfile, rng: &mut R) -> BotPlan {
    if rng.random_bool(profile.failure_rate.clamp(0.0, 1.0)) {
        return BotPlan::Skip;
    }
    let delay = rng.random_range(profile.delay_ms.clone());
    BotPlan::AnswerAfter(Duration::from_millis(delay))
}

/// Choose an unused dictionary word containing `combo`, preferring the
/// profile's length band and falling back to any word of four letters or more.
pub fn pick_bot_word<R: Rng + ?Sized>(
    validator: &WordValidator,
    combo: &str,
    profile: &BotProfile,
    used_words: &[String],
    rng: &mut R,
) -> Option<String> {
    let is_unused = |word: &&str| !used_words.iter().any(|used| used.eq_ignore_ascii_case(word));
    let candidates: Vec<&str> = validator
        .words_containing(combo)
        .into_iter()
        .filter(is_unused)
        .collect();

    let sized: Vec<&str> = candidates
        .iter()
        .copied()
        .filter(|word| profile.word_length.contains(&word.chars().count()))
        .collect();

    let pool = if sized.is_empty() {
        candidates
            .into_iter()
            .filter(|word| word.chars().count() >= FALLBACK_MIN_LENGTH)
            .collect()
    } else {
        sized
    };

    if pool.is_empty() {
        return None;
    }
    Some(pool[rng.random_range(0..pool.len())].to_string())
}

/// An `AdjectiveAnimal` name not present in `existing`. After a hundred
/// collisions a numeric suffix is appended.
pub fn generate_bot_name<R: Rng + ?Sized>(existing: &[String], rng: &mut R) -> String {
    let random_name = |rng: &mut R| {
        format!(
            "{}{}",
            ADJECTIVES[rng.random_range(0..ADJECTIVES.len())],
            ANIMALS[rng.random_range(0..ANIMALS.len())]
        )
    };

    for _ in 0..NAME_ATTEMPTS {
        let name = random_name(rng);
        if !existing.contains(&name) {
            return name;
        }
    }

    loop {
        let name = format!("{}{}", random_name(rng), rng.random_range(0..1000));
        if !existing.contains(&name) {
            return name;
        }
    }
}
