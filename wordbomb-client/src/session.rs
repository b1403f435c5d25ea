use chrono::{Duration as ChronoDuration, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};
use wordbomb_core::{
    ComboPicker, ControllerPhase, GameEvent, GameEventBus, GameEventHandler, HostAuthority,
    HostRoundController, PayloadOutcome, RoomTransition, RoundAuthority, RoundDecision,
    RoundSyncState, ScoreAggregator, Standings, TickOutcome, Verdict, WordMode, WordValidator,
};
use wordbomb_store::{RoomStore, Subscription};
use wordbomb_types::{Answer, Player, PlayerId, Room, RoomCode, RoomStatus, RoundState, StoreError};

use crate::bots::BotRunner;
use crate::config::Config;
use crate::error::SubmitError;
use crate::submission::submit_answer;

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionExit {
    Finished { standings: Standings },
    Left,
    Kicked,
    Shutdown,
}

pub enum SessionCommand {
    Submit {
        word: String,
        reply: oneshot::Sender<Result<Verdict, SubmitError>>,
    },
    SkipRound,
    Leave,
    Shutdown,
}

/// One client's view of a running room. Pushed changes and polled state go
/// through the same `ingest_*` methods, so delivery order and duplicates do
/// not matter. The sequencer (the host) additionally writes round
/// transitions and runs the bots.
pub struct GameSession {
    store: Arc<dyn RoomStore>,
    validator: Arc<WordValidator>,
    authority: Arc<dyn RoundAuthority>,
    config: Config,
    room: Room,
    player_id: PlayerId,
    is_spectator: bool,
    players: Vec<Player>,
    sync: RoundSyncState,
    controller: HostRoundController,
    bots: Option<BotRunner>,
    events: GameEventBus,
    rng: StdRng,
    exit: Option<SessionExit>,
}

impl GameSession {
    pub fn new(
        store: Arc<dyn RoomStore>,
        validator: Arc<WordValidator>,
        config: Config,
        room: Room,
        player: &Player,
    ) -> Self {
        let controller = HostRoundController::new(
            room.max_rounds,
            config.results_countdown_secs,
            ComboPicker::new(config.combo_recency_window),
        );
        Self {
            sync: RoundSyncState::new(player.id),
            store,
            validator,
            authority: Arc::new(HostAuthority),
            config,
            room,
            player_id: player.id,
            is_spectator: player.is_spectator,
            players: Vec::new(),
            controller,
            bots: None,
            events: GameEventBus::new(),
            rng: StdRng::from_os_rng(),
            exit: None,
        }
    }

    pub fn with_authority(mut self, authority: Arc<dyn RoundAuthority>) -> Self {
        self.authority = authority;
        self
    }

    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn add_event_handler(&mut self, handler: Box<dyn GameEventHandler>) {
        self.events.add_handler(handler);
    }

    pub fn is_sequencer(&self) -> bool {
        self.authority.can_sequence(&self.room, self.player_id)
    }

    pub fn sync_state(&self) -> &RoundSyncState {
        &self.sync
    }

    pub fn controller_phase(&self) -> ControllerPhase {
        self.controller.phase()
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn room_code(&self) -> &RoomCode {
        &self.room.code
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    pub fn exit_reason(&self) -> Option<&SessionExit> {
        self.exit.as_ref()
    }

    /// Bot turns still waiting to fire. Always zero off the host.
    pub fn pending_bot_turns(&self) -> usize {
        self.bots.as_ref().map_or(0, BotRunner::pending_turns)
    }

    /// Apply a round row from either channel.
    pub async fn ingest_round(&mut self, payload: RoundState) -> PayloadOutcome {
        if payload.room_code != self.room.code {
            return PayloadOutcome::Stale;
        }

        let outcome = self.sync.on_round_payload(&payload, Utc::now());
        if !outcome.is_applied() {
            return outcome;
        }

        self.controller
            .on_round_started(payload.round_number, &payload.current_combo);
        self.events.publish(GameEvent::RoundStarted {
            room_code: self.room.code.clone(),
            round_number: payload.round_number,
            combo: payload.current_combo.clone(),
            time_left: self.sync.time_left(),
        });

        if self.is_sequencer() {
            let runner = self.bots.get_or_insert_with(|| {
                BotRunner::new(
                    self.store.clone(),
                    self.validator.clone(),
                    self.room.points_per_word,
                    self.config.bot_delay_scale,
                )
            });
            let scheduled = runner.schedule_round(&self.players, &payload, &mut self.rng);
            debug!("Scheduled {} bot turns for round {}", scheduled, payload.round_number);
        }

        outcome
    }

    pub fn ingest_answer(&mut self, answer: Answer) -> bool {
        if !self.sync.on_answer_notification(&answer) {
            return false;
        }
        self.events.publish(GameEvent::AnswerAccepted {
            room_code: self.room.code.clone(),
            answer,
        });
        true
    }

    pub async fn ingest_room(&mut self, room: Room) -> RoomTransition {
        if room.code != self.room.code {
            return RoomTransition::Unchanged;
        }
        self.room = room;

        let transition = self.sync.on_room_update(&self.room);
        match transition {
            RoomTransition::Paused => {
                if let Some(bots) = self.bots.as_mut() {
                    bots.cancel_all();
                }
                self.events.publish(GameEvent::GamePaused {
                    room_code: self.room.code.clone(),
                    time_remaining: self.room.paused_time_remaining.unwrap_or(0),
                });
            }
            RoomTransition::Resumed => {
                self.events.publish(GameEvent::GameResumed {
                    room_code: self.room.code.clone(),
                });
                self.reschedule_bots().await;
            }
            RoomTransition::Finished => self.finish().await,
            RoomTransition::Unchanged => {}
        }
        transition
    }

    /// Give bots that have not answered yet a fresh turn against the
    /// re-anchored round.
    async fn reschedule_bots(&mut self) {
        if !self.is_sequencer() || self.sync.is_timed_out() || self.sync.showing_results() {
            return;
        }
        let round = match self.store.get_round_state(&self.room.code).await {
            Ok(Some(round)) if round.round_number == self.sync.round_number() => round,
            Ok(_) => return,
            Err(e) => {
                warn!("Could not reload round for bots in {}: {}", self.room.code, e);
                return;
            }
        };

        let answered: Vec<PlayerId> = self.sync.round_answers().iter().map(|a| a.player_id).collect();
        let waiting: Vec<Player> = self
            .players
            .iter()
            .filter(|p| !answered.contains(&p.id))
            .cloned()
            .collect();
        if let Some(runner) = self.bots.as_mut() {
            let scheduled = runner.schedule_round(&waiting, &round, &mut self.rng);
            debug!("Rescheduled {} bot turns for round {}", scheduled, round.round_number);
        }
    }

    async fn finish(&mut self) {
        self.controller.finish();
        if let Some(bots) = self.bots.as_mut() {
            bots.cancel_all();
        }

        match self.store.list_active_players(&self.room.code).await {
            Ok(players) => self.players = players,
            Err(e) => warn!("Could not load final scores for room {}: {}", self.room.code, e),
        }
        let standings = ScoreAggregator::standings(&self.players, self.room.game_mode);
        info!("Game in room {} finished", self.room.code);
        self.events.publish(GameEvent::GameFinished {
            room_code: self.room.code.clone(),
            standings: standings.clone(),
        });
        self.exit.get_or_insert(SessionExit::Finished { standings });
    }

    /// Reconcile with the store. Every failure is logged and retried on the
    /// next poll.
    pub async fn poll(&mut self) {
        let code = self.room.code.clone();

        match self.store.get_room(&code).await {
            Ok(room) => {
                self.ingest_room(room).await;
            }
            Err(e) => {
                warn!("Poll of room {} failed: {}", code, e);
                return;
            }
        }
        if self.exit.is_some() {
            return;
        }

        match self.store.list_active_players(&code).await {
            Ok(players) => {
                if !players.iter().any(|p| p.id == self.player_id) {
                    info!("Player {} is no longer in room {}", self.player_id, code);
                    self.events.publish(GameEvent::PlayerKicked {
                        room_code: code.clone(),
                        player_id: self.player_id,
                    });
                    self.close(SessionExit::Kicked);
                    return;
                }
                self.players = players;
            }
            Err(e) => warn!("Poll of players in {} failed: {}", code, e),
        }

        match self.store.get_round_state(&code).await {
            Ok(Some(round)) => {
                self.ingest_round(round).await;
            }
            Ok(None) => {
                if self.is_sequencer() && self.room.status == RoomStatus::Playing {
                    if let Some(first) = self.controller.first_combo(&mut self.rng) {
                        info!("Opening room {} with {}", code, first.combo);
                    }
                }
            }
            Err(e) => warn!("Poll of round state in {} failed: {}", code, e),
        }

        if self.sync.last_applied_round_number().is_some() {
            match self.store.list_round_answers(&code, self.sync.round_number()).await {
                Ok(answers) => {
                    for answer in answers {
                        self.ingest_answer(answer);
                    }
                }
                Err(e) => debug!("Poll of answers in {} failed: {}", code, e),
            }
        }

        if self.is_sequencer() {
            self.publish_pending().await;
            if self.controller.phase() == ControllerPhase::Finished && !self.room.is_finished() {
                self.mark_finished().await;
            }
        }
    }

    /// Advance local clocks and act on what fell due.
    pub async fn tick(&mut self, delta: f64) {
        match self.sync.tick(delta) {
            TickOutcome::TimedOut { round_number } => {
                self.events.publish(GameEvent::RoundTimedOut {
                    room_code: self.room.code.clone(),
                    round_number,
                });
                match self.controller.on_round_timeout(round_number) {
                    RoundDecision::Finish => {
                        if self.is_sequencer() {
                            self.mark_finished().await;
                        }
                    }
                    RoundDecision::ShowResults { countdown } => {
                        if self.sync.begin_results(countdown) {
                            self.events.publish(GameEvent::ResultsShown {
                                room_code: self.room.code.clone(),
                                round_number,
                                countdown,
                            });
                        }
                    }
                    RoundDecision::Advance(_) | RoundDecision::Ignore => {}
                }
            }
            TickOutcome::CountdownElapsed { round_number } => {
                if !self.is_sequencer() {
                    return;
                }
                if let RoundDecision::Advance(next) = self.controller.on_results_elapsed(round_number, &mut self.rng) {
                    debug!("Round {} chosen ({})", next.round_number, next.combo);
                    self.publish_pending().await;
                }
            }
            _ => {}
        }
    }

    async fn publish_pending(&mut self) {
        let Some(pending) = self.controller.awaiting_publish().cloned() else {
            return;
        };
        if self.room.status != RoomStatus::Playing {
            return;
        }

        let mut start = Utc::now();
        if pending.round_number == 1 {
            start += ChronoDuration::seconds(self.config.lead_in_secs as i64);
        }

        match self
            .store
            .publish_round_state(&self.room.code, pending.round_number, &pending.combo, start)
            .await
        {
            Ok(round) => {
                self.ingest_round(round).await;
            }
            Err(StoreError::StaleRound { current, attempted }) => {
                warn!(
                    "Round {} already superseded by {} in room {}",
                    attempted, current, self.room.code
                );
                if let Ok(Some(round)) = self.store.get_round_state(&self.room.code).await {
                    self.ingest_round(round).await;
                }
            }
            Err(e) => error!(
                "Failed to publish round {} in room {}, will retry: {}",
                pending.round_number, self.room.code, e
            ),
        }
    }

    async fn mark_finished(&mut self) {
        match self.store.set_room_status(&self.room.code, RoomStatus::Finished).await {
            Ok(room) => {
                self.ingest_room(room).await;
            }
            Err(e) => error!("Failed to finish room {}, will retry: {}", self.room.code, e),
        }
    }

    pub async fn submit_word(&mut self, word: &str) -> Result<Verdict, SubmitError> {
        if self.exit.is_some() {
            return Err(SubmitError::SessionClosed);
        }
        if self.is_spectator {
            return Err(SubmitError::Spectator);
        }
        if self.sync.has_answered_this_round() {
            return Err(SubmitError::AlreadyAnswered);
        }
        if !self.sync.can_answer() {
            return Err(SubmitError::NotAcceptingAnswers);
        }

        let round_number = self.sync.round_number();
        match self.store.list_round_answers(&self.room.code, round_number).await {
            Ok(answers) => {
                for answer in answers {
                    self.ingest_answer(answer);
                }
            }
            Err(e) => warn!("Using cached answers for round {}: {}", round_number, e),
        }
        if self.sync.has_answered_this_round() {
            return Err(SubmitError::AlreadyAnswered);
        }

        let mode = WordMode::Multiplayer {
            points_per_word: self.room.points_per_word,
        };
        let verdict = self.validator.validate(
            word,
            self.sync.combo(),
            &self.sync.used_words_this_round(),
            mode,
        );
        if !verdict.valid {
            debug!("Rejected {:?}: {}", verdict.word, verdict.message);
            return Err(SubmitError::Rejected(verdict));
        }

        let answer = match submit_answer(
            self.store.as_ref(),
            &self.room.code,
            self.player_id,
            round_number,
            &verdict,
            self.sync.time_taken(),
        )
        .await
        {
            Ok(answer) => answer,
            Err(StoreError::DuplicateAnswer { .. }) => {
                self.sync.mark_answered();
                return Err(SubmitError::AlreadyAnswered);
            }
            Err(StoreError::WordTaken { word, .. }) => {
                // Someone else got the word in between our refresh and write.
                let taken = self.validator.validate(&word, self.sync.combo(), &[word.clone()], mode);
                return Err(SubmitError::Rejected(taken));
            }
            Err(e) => return Err(SubmitError::Store(e)),
        };

        self.sync.mark_answered();
        self.ingest_answer(answer);
        Ok(verdict)
    }

    /// Host only: end the current round now.
    pub fn skip_round(&mut self) -> bool {
        if !self.is_sequencer() {
            return false;
        }
        self.sync.expire_now();
        true
    }

    /// Leave the room. A leaving host ends the game for everyone.
    pub async fn leave(&mut self) {
        if self.is_sequencer() && !self.room.is_finished() {
            if let Err(e) = self.store.set_room_status(&self.room.code, RoomStatus::Finished).await {
                warn!("Failed to end room {} on host leave: {}", self.room.code, e);
            }
        }
        if let Err(e) = self.store.leave_room(self.player_id).await {
            warn!("Failed to leave room {}: {}", self.room.code, e);
        }
        self.close(SessionExit::Left);
    }

    fn close(&mut self, exit: SessionExit) {
        if let Some(bots) = self.bots.as_mut() {
            bots.cancel_all();
        }
        self.exit.get_or_insert(exit);
    }

    async fn handle_command(&mut self, command: Option<SessionCommand>) {
        match command {
            Some(SessionCommand::Submit { word, reply }) => {
                let result = self.submit_word(&word).await;
                // The caller may have stopped waiting.
                let _ = reply.send(result);
            }
            Some(SessionCommand::SkipRound) => {
                self.skip_round();
            }
            Some(SessionCommand::Leave) => self.leave().await,
            Some(SessionCommand::Shutdown) | None => self.close(SessionExit::Shutdown),
        }
    }

    /// Drive the session until it ends: a fixed tick interval, a poll
    /// interval, the push subscriptions and the command channel.
    pub async fn run(mut self, mut commands: mpsc::Receiver<SessionCommand>) -> SessionExit {
        let code = self.room.code.clone();
        let mut rounds = subscribe(self.store.subscribe_round_state(&code).await, "round");
        let mut answers = subscribe(self.store.subscribe_answers(&code).await, "answers");
        let mut rooms = subscribe(self.store.subscribe_room(&code).await, "room");

        let mut ticker = interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut poller = interval(self.config.poll_interval);
        poller.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_tick = Instant::now();

        info!("Session for player {} in room {} started", self.player_id, code);

        while self.exit.is_none() {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Instant::now();
                    let delta = now.duration_since(last_tick).as_secs_f64();
                    last_tick = now;
                    self.tick(delta).await;
                }
                _ = poller.tick() => self.poll().await,
                Some(round) = next_change(&mut rounds) => {
                    self.ingest_round(round).await;
                }
                Some(answer) = next_change(&mut answers) => {
                    self.ingest_answer(answer);
                }
                Some(room) = next_change(&mut rooms) => {
                    self.ingest_room(room).await;
                }
                command = commands.recv() => self.handle_command(command).await,
            }
        }

        close_feed(&mut rounds);
        close_feed(&mut answers);
        close_feed(&mut rooms);
        if let Some(bots) = self.bots.as_mut() {
            bots.cancel_all();
        }

        let exit = self.exit.take().unwrap_or(SessionExit::Shutdown);
        info!("Session for player {} in room {} ended: {:?}", self.player_id, code, exit);
        exit
    }
}

fn subscribe<T>(result: Result<Subscription<T>, StoreError>, topic: &str) -> Option<Subscription<T>> {
    match result {
        Ok(subscription) => Some(subscription),
        Err(e) => {
            warn!("Could not subscribe to {} changes, relying on polling: {}", topic, e);
            None
        }
    }
}

fn close_feed<T: Clone>(subscription: &mut Option<Subscription<T>>) {
    if let Some(sub) = subscription.as_mut() {
        sub.unsubscribe();
    }
}

/// Next pushed change, or never once the feed is gone.
async fn next_change<T: Clone>(subscription: &mut Option<Subscription<T>>) -> Option<T> {
    match subscription {
        Some(sub) if sub.is_active() => sub.recv().await,
        _ => std::future::pending().await,
    }
}

/// Handle on a session running in its own task.
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<SessionExit>,
}

impl SessionHandle {
    pub fn spawn(session: GameSession) -> Self {
        let (commands, receiver) = mpsc::channel(32);
        let task = tokio::spawn(session.run(receiver));
        Self { commands, task }
    }

    pub async fn submit(&self, word: impl Into<String>) -> Result<Verdict, SubmitError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(SessionCommand::Submit {
                word: word.into(),
                reply,
            })
            .await
            .map_err(|_| SubmitError::SessionClosed)?;
        response.await.map_err(|_| SubmitError::SessionClosed)?
    }

    pub async fn skip_round(&self) {
        if self.commands.send(SessionCommand::SkipRound).await.is_err() {
            debug!("Skip requested on a closed session");
        }
    }

    pub async fn leave(&self) {
        if self.commands.send(SessionCommand::Leave).await.is_err() {
            debug!("Leave requested on a closed session");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end on its own.
    pub async fn wait(self) -> SessionExit {
        match self.task.await {
            Ok(exit) => exit,
            Err(e) => {
                error!("Session task failed: {}", e);
                SessionExit::Shutdown
            }
        }
    }

    pub async fn shutdown(self) -> SessionExit {
        // Already gone if the send fails; the join below still reports why.
        let _ = self.commands.send(SessionCommand::Shutdown).await;
        self.wait().await
    }
}
