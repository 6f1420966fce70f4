use std::time::Duration;

use rand::Rng;
use tracing::{debug, error, info};
use weber_core::{
    ColorPair, CurrentState, Player, ResponseKey, StimulusPair, TrialPhase, TrialRecord,
    is_response_correct, side_is_yes_correct,
};
use weber_timing::{DelayQueue, Timer};

use crate::colors::ColorRotation;
use crate::config::ExperimentConfig;
use crate::error::{ConfigError, ExperimentError};
use crate::generator::PairGenerator;
use crate::prompts::{key_guides, question_text};
use crate::sink::TrialSink;
use crate::trial::{ActiveTrial, TrialResponse, TrialTimestamps};
use crate::view::View;

/// Identifies a scheduled phase completion. It only takes effect while the
/// machine is still in the same trial and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub trial: u64,
    pub phase: TrialPhase,
}

/// Drives one subject through practice, scored blocks and the finish screen.
///
/// Input (`on_*` methods) and timer completions (`update` / `on_timer`) both
/// land here; nothing else mutates session state.
pub struct TrialStateMachine<G, V, S, T, R>
where
    G: PairGenerator,
    V: View,
    S: TrialSink,
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    config: ExperimentConfig,
    generator: G,
    view: V,
    sink: S,
    timer: T,
    rng: R,
    state: CurrentState,
    phase: TrialPhase,
    player: Player,
    colors: ColorRotation,
    yes_key_is_first: bool,
    trials_in_block: u32,
    trial_number: u32,
    trial_id: u64,
    /// A block boundary found no queued block to advance to.
    blocks_exhausted: bool,
    current: Option<ActiveTrial<u64>>,
    delays: DelayQueue<TimerToken>,
}

impl<G, V, S, T, R> TrialStateMachine<G, V, S, T, R>
where
    G: PairGenerator,
    V: View,
    S: TrialSink,
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(
        config: ExperimentConfig,
        generator: G,
        view: V,
        sink: S,
        timer: T,
        mut rng: R,
        player: Player,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let yes_key_is_first = rng.random_bool(0.5);
        let colors = ColorRotation::new(&mut rng);
        Ok(Self {
            config,
            generator,
            view,
            sink,
            timer,
            rng,
            state: CurrentState::default(),
            phase: TrialPhase::default(),
            player,
            colors,
            yes_key_is_first,
            trials_in_block: 0,
            trial_number: 0,
            trial_id: 0,
            blocks_exhausted: false,
            current: None,
            delays: DelayQueue::new(),
        })
    }

    /// Leaves the introduction: practice if any is configured, otherwise
    /// straight into scored trials.
    pub fn start_session(&mut self) -> bool {
        if self.state != CurrentState::Introduction {
            return false;
        }
        let (first, second) = key_guides(self.yes_key_is_first);
        self.view.show_key_guides(first, second);
        self.state = if self.config.practice_trial_count > 0 {
            CurrentState::Practice
        } else {
            CurrentState::Gameplay
        };
        info!(
            subject = self.player.subject_id(),
            state = ?self.state,
            yes_key_is_first = self.yes_key_is_first,
            "session started"
        );
        self.enter_get_ready();
        true
    }

    /// Starts scored trials after practice, or the next block after a block
    /// change.
    pub fn on_start_assessment_clicked(&mut self) -> bool {
        match (self.state, self.phase) {
            (CurrentState::PracticeFinished, _) => {
                self.state = CurrentState::Gameplay;
                self.player.reset();
                self.trials_in_block = 0;
                info!(block = ?self.generator.current_block(), "assessment started");
                self.enter_get_ready();
                true
            }
            (CurrentState::Gameplay, TrialPhase::ChangingBlocks) => {
                info!(
                    block = ?self.generator.current_block(),
                    section = self.generator.current_section(),
                    "block started"
                );
                self.enter_get_ready();
                true
            }
            _ => false,
        }
    }

    /// Scores the first response of a trial. Returns `false` when the key
    /// was ignored.
    pub fn on_response_key(&mut self, key: ResponseKey) -> bool {
        if !self.state.runs_trials() || !self.phase.accepts_response() {
            debug!(?key, phase = ?self.phase, "response outside response window");
            return false;
        }
        let now = self.timer.now();
        let (correct, response_time_ns, section) = {
            let Some(trial) = self.current.as_mut() else {
                return false;
            };
            if trial.is_answered() {
                debug!(?key, trial = trial.id, "duplicate response ignored");
                return false;
            }
            let response_time_ns = now.saturating_sub(trial.timestamps.stimulus_start);
            let correct = is_response_correct(key, trial.yes_correct, self.yes_key_is_first);
            trial.timestamps.response = Some(now);
            trial.response = Some(TrialResponse {
                key,
                correct,
                response_time_ns,
            });
            (correct, response_time_ns, trial.section)
        };

        self.player.record_response(correct, response_time_ns);
        debug!(
            ?key,
            correct,
            rt_ms = response_time_ns as f64 / 1_000_000.0,
            phase = ?self.phase,
            "response"
        );
        if self.config.feedback_enabled(section) {
            self.view.give_feedback(correct);
        }
        if self.state.is_gameplay() {
            self.trials_in_block += 1;
            self.trial_number += 1;
            self.persist();
        }

        match self.phase {
            TrialPhase::DisplayingStimulus => self.enter_masking(),
            TrialPhase::AwaitingResponse => self.enter_continue(),
            // the mask runs out first
            _ => {}
        }
        true
    }

    /// Moves past an answered trial: next trial, block change, end of
    /// practice or end of session.
    pub fn on_continue_key(&mut self) -> Result<bool, ExperimentError> {
        if self.phase != TrialPhase::PressSpaceToContinue {
            return Ok(false);
        }
        self.view.hide_prompts();
        self.current = None;

        match self.state {
            CurrentState::Practice
                if self.player.num_rounds() >= self.config.practice_trial_count =>
            {
                self.finish_practice();
                return Ok(true);
            }
            CurrentState::Gameplay => {
                if self.player.num_rounds() >= self.config.total_trial_count {
                    self.finish();
                    return Ok(true);
                }
                if self.trials_in_block >= self.config.trials_per_block {
                    self.trials_in_block = 0;
                    if self.blocks_exhausted {
                        self.finish();
                    } else {
                        self.blocks_exhausted = self.generator.remaining_block_count() == 0;
                        self.change_blocks();
                    }
                    return Ok(true);
                }
            }
            _ => {}
        }

        if self.config.inter_trial_delay_ms > 0 {
            self.phase = TrialPhase::InterTrialGap;
            self.view.clear_canvas();
            self.arm(self.config.inter_trial_delay());
        } else {
            self.begin_trial()?;
        }
        Ok(true)
    }

    /// Fires every completion due by now. Returns how many took effect.
    pub fn update(&mut self) -> Result<usize, ExperimentError> {
        let now = self.timer.now();
        let mut fired = 0;
        while let Some(token) = self.delays.pop_due(now) {
            if self.on_timer(token)? {
                fired += 1;
            }
        }
        Ok(fired)
    }

    /// Completes a timed phase. Stale tokens are ignored.
    pub fn on_timer(&mut self, token: TimerToken) -> Result<bool, ExperimentError> {
        if token.trial != self.trial_id || token.phase != self.phase || !self.phase.is_timed() {
            debug!(?token, phase = ?self.phase, "stale timer ignored");
            return Ok(false);
        }
        match self.phase {
            TrialPhase::GetReady | TrialPhase::InterTrialGap => self.begin_trial()?,
            TrialPhase::DisplayingStimulus => self.enter_masking(),
            TrialPhase::Masking => self.end_mask(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.delays.next_deadline()
    }

    fn arm(&mut self, delay: Duration) {
        let phase = self.phase;
        self.delays.cancel(|t| t.phase == phase);
        let token = TimerToken {
            trial: self.trial_id,
            phase,
        };
        self.delays.schedule(self.timer.now(), delay, token);
    }

    fn enter_get_ready(&mut self) {
        self.trial_id += 1;
        self.current = None;
        self.phase = TrialPhase::GetReady;
        self.view.clear_canvas();
        self.view.show_get_ready(self.state.is_practice());
        self.arm(self.config.get_ready());
    }

    fn begin_trial(&mut self) -> Result<(), ExperimentError> {
        let pair = self.generator.next_pair()?;
        let block = self.generator.current_block();
        let colors = self.colors.current();
        self.trial_id += 1;

        self.view.hide_prompts();
        self.view.paint_pair(&pair, colors.a, colors.b);
        let yes_correct = side_is_yes_correct(&pair, block);
        debug!(
            trial = self.trial_id,
            ?block,
            counts = ?pair.counts(),
            yes_correct,
            "stimulus shown"
        );
        self.current = Some(ActiveTrial {
            id: self.trial_id,
            pair,
            block,
            section: self.generator.current_section(),
            yes_correct,
            timestamps: TrialTimestamps {
                stimulus_start: self.timer.now(),
                response: None,
            },
            response: None,
        });
        self.phase = TrialPhase::DisplayingStimulus;
        self.arm(self.config.flash_duration());
        Ok(())
    }

    fn enter_masking(&mut self) {
        self.view.clear_canvas();
        self.view.show_mask(self.colors.mask_color());
        self.phase = TrialPhase::Masking;
        self.arm(self.config.mask_duration());
    }

    fn end_mask(&mut self) {
        self.view.hide_mask();
        let Some(trial) = &self.current else {
            return;
        };
        if trial.is_answered() {
            self.enter_continue();
        } else {
            let text = question_text(trial.block, &self.colors.current(), self.yes_key_is_first);
            self.phase = TrialPhase::AwaitingResponse;
            self.view.show_question_text(&text);
        }
    }

    fn enter_continue(&mut self) {
        self.view.hide_prompts();
        self.view.show_continue_prompt();
        self.phase = TrialPhase::PressSpaceToContinue;
    }

    fn change_blocks(&mut self) {
        self.generator.next_block();
        self.colors.advance(&mut self.rng);
        self.phase = TrialPhase::ChangingBlocks;

        let block = self.generator.current_block();
        let colors = self.colors.current();
        info!(
            ?block,
            remaining = self.generator.remaining_block_count(),
            "block complete"
        );
        self.view.clear_canvas();
        self.view
            .show_block_complete_screen(block, colors.a.name, colors.b.name);
    }

    fn finish_practice(&mut self) {
        self.generator.clear_ratio_bucket();
        self.state = CurrentState::PracticeFinished;
        self.phase = TrialPhase::AwaitingStart;
        info!(
            correct = self.player.num_correct(),
            rounds = self.player.num_rounds(),
            "practice complete"
        );
        self.view.clear_canvas();
        self.view
            .show_practice_complete_screen(self.player.num_correct(), self.player.num_rounds());
    }

    fn finish(&mut self) {
        self.state = CurrentState::Finished;
        self.phase = TrialPhase::AwaitingStart;
        self.delays.clear();
        info!(
            correct = self.player.num_correct(),
            rounds = self.player.num_rounds(),
            "session finished"
        );
        self.view.clear_canvas();
        self.view.show_finish_screen(self.player.num_correct());
    }

    fn persist(&mut self) {
        let Some(trial) = &self.current else {
            return;
        };
        let Some(response) = trial.response else {
            return;
        };
        let (count_a, count_b) = trial.pair.counts();
        let record = TrialRecord {
            subject_id: self.player.subject_id().to_string(),
            gender: self.player.gender(),
            age: self.player.age(),
            trial_number: self.trial_number,
            section: trial.section,
            block: trial.block,
            count_a,
            count_b,
            difference: trial.pair.difference(),
            control_type: trial.pair.control_type(),
            swapped: trial.pair.is_swapped(),
            response_time_ns: response.response_time_ns,
            correct: response.correct,
            yes_key_is_first: self.yes_key_is_first,
        };
        if let Err(err) = self.sink.record_trial(&record) {
            error!(%err, trial = self.trial_number, "failed to persist trial");
        }
    }

    pub fn state(&self) -> CurrentState {
        self.state
    }

    pub fn phase(&self) -> TrialPhase {
        self.phase
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn trials_in_block(&self) -> u32 {
        self.trials_in_block
    }

    /// Scored gameplay trials so far.
    pub fn trial_number(&self) -> u32 {
        self.trial_number
    }

    pub fn yes_key_is_first(&self) -> bool {
        self.yes_key_is_first
    }

    pub fn current_pair(&self) -> Option<&StimulusPair> {
        self.current.as_ref().map(|t| &t.pair)
    }

    pub fn current_trial(&self) -> Option<&ActiveTrial<u64>> {
        self.current.as_ref()
    }

    pub fn colors(&self) -> ColorPair {
        self.colors.current()
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }
}
