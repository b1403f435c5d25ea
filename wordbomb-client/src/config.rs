use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub tick_interval: Duration,
    pub poll_interval: Duration,
    pub lobby_poll_interval: Duration,
    pub results_countdown_secs: u32,
    pub lead_in_secs: u32,
    pub combo_recency_window: usize,
    /// Multiplier on bot think time; zero makes bots answer immediately.
    pub bot_delay_scale: f64,
    pub words_file: PathBuf,
    pub notification_drop_rate: f64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            tick_interval: Duration::from_millis(env_or("TICK_INTERVAL_MS", 100)?),
            poll_interval: Duration::from_millis(env_or("POLL_INTERVAL_MS", 1500)?),
            lobby_poll_interval: Duration::from_millis(env_or("LOBBY_POLL_INTERVAL_MS", 2000)?),
            results_countdown_secs: env_or("RESULTS_COUNTDOWN_SECS", 5)?,
            lead_in_secs: env_or("LEAD_IN_SECS", 10)?,
            combo_recency_window: env_or("COMBO_RECENCY_WINDOW", 10)?,
            bot_delay_scale: env_or("BOT_DELAY_SCALE", 1.0)?,
            words_file: env::var("WORDS_FILE")
                .unwrap_or_else(|_| "./words.txt".to_string())
                .into(),
            notification_drop_rate: env_or("NOTIFICATION_DROP_RATE", 0.0)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            poll_interval: Duration::from_millis(1500),
            lobby_poll_interval: Duration::from_millis(2000),
            results_countdown_secs: 5,
            lead_in_secs: 10,
            combo_recency_window: 10,
            bot_delay_scale: 1.0,
            words_file: PathBuf::from("./words.txt"),
            notification_drop_rate: 0.0,
        }
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tick_interval, Duration::from_millis(100));
        assert_eq!(config.results_countdown_secs, 5);
        assert_eq!(config.combo_recency_window, 10);
    }

    #[test]
    fn test_env_or_falls_back_and_rejects_garbage() {
        assert_eq!(env_or::<u32>("WORDBOMB_TEST_UNSET_VAR", 7).unwrap(), 7);

        // SAFETY: the variable name is unique to this test.
        unsafe { env::set_var("WORDBOMB_TEST_BAD_VAR", "abc") };
        assert!(env_or::<u32>("WORDBOMB_TEST_BAD_VAR", 7).is_err());
        unsafe { env::remove_var("WORDBOMB_TEST_BAD_VAR") };
    }
}
