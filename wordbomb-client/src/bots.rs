use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wordbomb_core::{BotPlan, BotProfile, WordMode, WordValidator, pick_bot_word, plan_bot_turn};
use wordbomb_store::RoomStore;
use wordbomb_types::{Difficulty, Player, PlayerId, RoomStatus, RoundState};

use crate::submission::submit_answer;

/// Runs bot turns on the host. Each bot gets one delayed task per round; a
/// task that wakes after its round has moved on discards itself.
pub struct BotRunner {
    store: Arc<dyn RoomStore>,
    validator: Arc<WordValidator>,
    points_per_word: u32,
    delay_scale: f64,
    current_round: Arc<AtomicU32>,
    tasks: Vec<JoinHandle<()>>,
}

struct BotTurn {
    bot_id: PlayerId,
    bot_name: String,
    profile: BotProfile,
    round: RoundState,
    delay: Duration,
    seed: u64,
}

impl BotRunner {
    pub fn new(
        store: Arc<dyn RoomStore>,
        validator: Arc<WordValidator>,
        points_per_word: u32,
        delay_scale: f64,
    ) -> Self {
        Self {
            store,
            validator,
            points_per_word,
            delay_scale: delay_scale.max(0.0),
            current_round: Arc::new(AtomicU32::new(0)),
            tasks: Vec::new(),
        }
    }

    /// Roll and schedule every active bot's turn for `round`. Returns how
    /// many bots will try to answer.
    pub fn schedule_round<R: Rng + ?Sized>(&mut self, bots: &[Player], round: &RoundState, rng: &mut R) -> usize {
        self.current_round.store(round.round_number, Ordering::SeqCst);
        self.tasks.retain(|task| !task.is_finished());

        let lead_in = round.lead_in_at(Utc::now());
        let mut scheduled = 0;
        for bot in bots.iter().filter(|p| p.is_bot && p.is_participant()) {
            let profile = BotProfile::for_difficulty(bot.bot_difficulty.unwrap_or(Difficulty::Medium));
            match plan_bot_turn(&profile, rng) {
                BotPlan::Skip => {
                    info!("{} sits out round {}", bot.name, round.round_number);
                }
                BotPlan::AnswerAfter(think) => {
                    let delay = Duration::from_secs_f64(lead_in + think.as_secs_f64() * self.delay_scale);
                    let turn = BotTurn {
                        bot_id: bot.id,
                        bot_name: bot.name.clone(),
                        profile,
                        round: round.clone(),
                        delay,
                        seed: rng.random(),
                    };
                    self.tasks.push(tokio::spawn(self.run_turn(turn)));
                    scheduled += 1;
                }
            }
        }
        scheduled
    }

    fn run_turn(&self, turn: BotTurn) -> impl Future<Output = ()> + Send + 'static {
        let store = self.store.clone();
        let validator = self.validator.clone();
        let current_round = self.current_round.clone();
        let mode = WordMode::Multiplayer {
            points_per_word: self.points_per_word,
        };

        async move {
            tokio::time::sleep(turn.delay).await;

            let round_number = turn.round.round_number;
            if current_round.load(Ordering::SeqCst) != turn.round.round_number
                || turn.round.remaining_at(Utc::now()) <= 0.0
            {
                debug!("{} woke after round {} ended, discarding", turn.bot_name, round_number);
                return;
            }

            match store.get_room(&turn.round.room_code).await {
                Ok(room) if room.status == RoomStatus::Playing => {}
                Ok(room) => {
                    debug!("{} woke while room is {:?}, discarding", turn.bot_name, room.status);
                    return;
                }
                Err(e) => {
                    warn!("{} could not check room status: {}", turn.bot_name, e);
                    return;
                }
            }

            let used_words: Vec<String> = match store
                .list_round_answers(&turn.round.room_code, round_number)
                .await
            {
                Ok(answers) => answers.into_iter().map(|a| a.word).collect(),
                Err(e) => {
                    warn!("{} could not load round {} answers: {}", turn.bot_name, round_number, e);
                    return;
                }
            };

            let mut rng = StdRng::seed_from_u64(turn.seed);
            let Some(word) = pick_bot_word(&validator, &turn.round.current_combo, &turn.profile, &used_words, &mut rng) else {
                info!("{} found no word for {}", turn.bot_name, turn.round.current_combo);
                return;
            };

            let verdict = validator.validate(&word, &turn.round.current_combo, &used_words, mode);
            if !verdict.valid {
                warn!("{} picked {:?} but it failed validation: {}", turn.bot_name, word, verdict.message);
                return;
            }

            let time_taken = turn.round.time_limit as f64 - turn.round.remaining_at(Utc::now());
            match submit_answer(
                store.as_ref(),
                &turn.round.room_code,
                turn.bot_id,
                round_number,
                &verdict,
                time_taken,
            )
            .await
            {
                Ok(_) => info!("{} answered {:?} in round {}", turn.bot_name, verdict.word, round_number),
                Err(e) => warn!("{} could not submit in round {}: {}", turn.bot_name, round_number, e),
            }
        }
    }

    /// Invalidate every pending turn without waiting for it.
    pub fn cancel_all(&mut self) {
        self.current_round.store(u32::MAX, Ordering::SeqCst);
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub fn pending_turns(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_finished()).count()
    }
}

impl Drop for BotRunner {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
