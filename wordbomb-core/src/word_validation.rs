use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;
use tracing::info;

use crate::scoring::{multiplayer_points, solo_points};

static LETTERS_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[a-z]+$").expect("static regex"));

/// Country and nationality names. Matched exactly, case-insensitively.
pub const BANNED_WORDS: &[&str] = &[
    "afghanistan", "afghan", "albania", "albanian", "algeria", "algerian", "america",
    "american", "argentina", "argentine", "argentinian", "armenia", "armenian", "australia",
    "australian", "austria", "austrian", "bangladesh", "bangladeshi", "belgium", "belgian",
    "bolivia", "bolivian", "brazil", "brazilian", "britain", "british", "bulgaria",
    "bulgarian", "cambodia", "cambodian", "canada", "canadian", "chile", "chilean", "china",
    "chinese", "colombia", "colombian", "croatia", "croatian", "cuba", "cuban", "czech",
    "denmark", "danish", "egypt", "egyptian", "england", "english", "estonia", "estonian",
    "ethiopia", "ethiopian", "finland", "finnish", "france", "french", "germany", "german",
    "ghana", "ghanaian", "greece", "greek", "hungary", "hungarian", "iceland", "icelandic",
    "india", "indian", "indonesia", "indonesian", "iran", "iranian", "iraq", "iraqi",
    "ireland", "irish", "israel", "israeli", "italy", "italian", "jamaica", "jamaican",
    "japan", "japanese", "jordan", "jordanian", "kenya", "kenyan", "korea", "korean",
    "latvia", "latvian", "lebanon", "lebanese", "lithuania", "lithuanian", "malaysia",
    "malaysian", "mexico", "mexican", "morocco", "moroccan", "nepal", "nepalese",
    "netherlands", "dutch", "nigeria", "nigerian", "norway", "norwegian", "pakistan",
    "pakistani", "peru", "peruvian", "philippines", "filipino", "poland", "polish",
    "portugal", "portuguese", "romania", "romanian", "russia", "russian", "scotland",
    "scottish", "serbia", "serbian", "singapore", "singaporean", "slovakia", "slovak",
    "spain", "spanish", "sweden", "swedish", "switzerland", "swiss", "syria", "syrian",
    "thailand", "thai", "turkey", "turkish", "ukraine", "ukrainian", "vietnam",
    "vietnamese", "wales", "welsh", "yemen", "yemeni", "zimbabwe", "zimbabwean",
];

/// Which ruleset a submission is judged by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordMode {
    /// Used words span the whole game, points are `max(10, len * 5)`.
    Solo,
    /// Used words span the current round, points are `points_per_word + max(0, (len - 4) * 5)`.
    Multiplayer { points_per_word: u32 },
}

impl WordMode {
    pub fn min_length(&self) -> usize {
        match self {
            WordMode::Solo => 3,
            WordMode::Multiplayer { .. } => 4,
        }
    }

    pub fn points_for(&self, word: &str) -> u32 {
        match self {
            WordMode::Solo => solo_points(word),
            WordMode::Multiplayer { points_per_word } => multiplayer_points(*points_per_word, word),
        }
    }
}

/// Reason code for a rejected word, in rule order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    TooShort { min: usize },
    MissingCombo { combo: String },
    AlreadyUsed,
    NotLetters,
    BannedWord,
    DictionaryNotLoaded,
    NotInDictionary,
}

impl Rejection {
    pub fn message(&self) -> String {
        match self {
            Rejection::TooShort { min } => format!("Word must be at least {} letters!", min),
            Rejection::MissingCombo { combo } => format!("Word must contain \"{}\"!", combo),
            Rejection::AlreadyUsed => "Word already used!".to_string(),
            Rejection::NotLetters => "Word must contain only letters!".to_string(),
            Rejection::BannedWord => "Country names are not allowed!".to_string(),
            Rejection::DictionaryNotLoaded => "Dictionary is still loading, try again!".to_string(),
            Rejection::NotInDictionary => "Not a valid English word!".to_string(),
        }
    }
}

/// Outcome of validating one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Trimmed, lowercased form of the submission.
    pub word: String,
    pub valid: bool,
    pub reason: Option<Rejection>,
    /// Points the word is worth; zero when rejected.
    pub points: u32,
    pub message: String,
}

impl Verdict {
    fn accept(word: String, points: u32) -> Self {
        Self {
            message: format!("+{} points! Great word!", points),
            word,
            valid: true,
            reason: None,
            points,
        }
    }

    fn reject(word: String, reason: Rejection) -> Self {
        Self {
            message: reason.message(),
            word,
            valid: false,
            reason: Some(reason),
            points: 0,
        }
    }
}

pub struct WordValidator {
    dictionary: Option<HashSet<String>>,
}

impl WordValidator {
    /// A validator whose dictionary has not arrived yet. Every dictionary
    /// check fails closed until `load` is called.
    pub fn unloaded() -> Self {
        Self { dictionary: None }
    }

    /// Create a validator from a newline separated word list
    pub fn from_word_list(word_list: &str) -> Self {
        let mut validator = Self::unloaded();
        validator.load(word_list);
        validator
    }

    /// Read a word list file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading dictionary {}", path.display()))?;
        Ok(Self::from_word_list(&contents))
    }

    pub fn load(&mut self, word_list: &str) {
        let words: HashSet<String> = word_list
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|word| word.to_lowercase())
            .collect();

        info!("Dictionary loaded: {} words", words.len());
        self.dictionary = Some(words);
    }

    pub fn is_loaded(&self) -> bool {
        self.dictionary.is_some()
    }

    pub fn len(&self) -> usize {
        self.dictionary.as_ref().map_or(0, HashSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Exact, case-insensitive dictionary membership
    pub fn contains(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        self.dictionary
            .as_ref()
            .is_some_and(|dictionary| dictionary.contains(&word))
    }

    /// Dictionary words containing `combo`, in no particular order
    pub fn words_containing(&self, combo: &str) -> Vec<&str> {
        let combo = combo.to_lowercase();
        self.dictionary
            .iter()
            .flatten()
            .filter(|word| word.contains(&combo))
            .map(String::as_str)
            .collect()
    }

    /// Check if word contains only ASCII letters
    pub fn is_alphabetic(&self, word: &str) -> bool {
        LETTERS_ONLY.is_match(word)
    }

    pub fn is_banned(&self, word: &str) -> bool {
        let word = word.trim().to_lowercase();
        BANNED_WORDS.contains(&word.as_str())
    }

    /// Judge a submission. Rules run in a fixed order and the first failure
    /// wins: length, combo, used words, letters only, banned list, dictionary.
    pub fn validate(&self, word: &str, combo: &str, used_words: &[String], mode: WordMode) -> Verdict {
        let word = word.trim().to_lowercase();

        if word.chars().count() < mode.min_length() {
            return Verdict::reject(word, Rejection::TooShort { min: mode.min_length() });
        }

        if !word.contains(&combo.to_lowercase()) {
            return Verdict::reject(
                word,
                Rejection::MissingCombo {
                    combo: combo.to_string(),
                },
            );
        }

        if used_words.iter().any(|used| used.trim().eq_ignore_ascii_case(&word)) {
            return Verdict::reject(word, Rejection::AlreadyUsed);
        }

        if !self.is_alphabetic(&word) {
            return Verdict::reject(word, Rejection::NotLetters);
        }

        if self.is_banned(&word) {
            return Verdict::reject(word, Rejection::BannedWord);
        }

        match &self.dictionary {
            None => Verdict::reject(word, Rejection::DictionaryNotLoaded),
            Some(dictionary) if !dictionary.contains(&word) => {
                Verdict::reject(word, Rejection::NotInDictionary)
            }
            Some(_) => {
                let points = mode.points_for(&word);
                Verdict::accept(word, points)
            }
        }
    }
}
