//! Session flow driven through the public input and timer entry points.

use std::collections::HashSet;

use rand::SeedableRng;
use rand::rngs::StdRng;

use weber_core::{
    BlockMode, CurrentState, DotColor, Gender, Player, ResponseKey, StimulusPair, TrialPhase,
};
use weber_experiment::{
    DotsPairGenerator, ExperimentConfig, MemorySink, PairGenerator, TimerToken, TrialStateMachine, View,
};
use weber_timing::ManualTimer;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    PaintPair(u32, u32),
    ClearCanvas,
    GetReady(bool),
    ShowMask,
    HideMask,
    Question(String),
    ContinuePrompt,
    HidePrompts,
    KeyGuides(String, String),
    BlockComplete(BlockMode),
    PracticeComplete(u32, u32),
    Finish(u32),
    Feedback(bool),
}

#[derive(Debug, Default)]
struct RecordingView {
    calls: Vec<Call>,
}

impl RecordingView {
    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl View for RecordingView {
    fn paint_pair(&mut self, pair: &StimulusPair, _a: DotColor, _b: DotColor) {
        let (a, b) = pair.counts();
        self.calls.push(Call::PaintPair(a, b));
    }
    fn clear_canvas(&mut self) {
        self.calls.push(Call::ClearCanvas);
    }
    fn show_get_ready(&mut self, practice: bool) {
        self.calls.push(Call::GetReady(practice));
    }
    fn show_mask(&mut self, _color: DotColor) {
        self.calls.push(Call::ShowMask);
    }
    fn hide_mask(&mut self) {
        self.calls.push(Call::HideMask);
    }
    fn show_question_text(&mut self, text: &str) {
        self.calls.push(Call::Question(text.to_string()));
    }
    fn show_continue_prompt(&mut self) {
        self.calls.push(Call::ContinuePrompt);
    }
    fn hide_prompts(&mut self) {
        self.calls.push(Call::HidePrompts);
    }
    fn show_key_guides(&mut self, first: &str, second: &str) {
        self.calls
            .push(Call::KeyGuides(first.to_string(), second.to_string()));
    }
    fn show_block_complete_screen(&mut self, block: BlockMode, _a: &str, _b: &str) {
        self.calls.push(Call::BlockComplete(block));
    }
    fn show_practice_complete_screen(&mut self, num_correct: u32, num_rounds: u32) {
        self.calls.push(Call::PracticeComplete(num_correct, num_rounds));
    }
    fn show_finish_screen(&mut self, num_correct: u32) {
        self.calls.push(Call::Finish(num_correct));
    }
    fn give_feedback(&mut self, correct: bool) {
        self.calls.push(Call::Feedback(correct));
    }
}

type Machine =
    TrialStateMachine<DotsPairGenerator<StdRng>, RecordingView, MemorySink, ManualTimer, StdRng>;

fn machine(config: ExperimentConfig) -> (Machine, ManualTimer) {
    let timer = ManualTimer::new();
    let generator = DotsPairGenerator::new(&config, StdRng::seed_from_u64(11)).unwrap();
    let m = TrialStateMachine::new(
        config,
        generator,
        RecordingView::default(),
        MemorySink::default(),
        timer.clone(),
        StdRng::seed_from_u64(12),
        Player::new("7", Gender::Female, 29),
    )
    .unwrap();
    (m, timer)
}

fn gameplay_config() -> ExperimentConfig {
    ExperimentConfig {
        practice_trial_count: 0,
        ..ExperimentConfig::default()
    }
}

fn advance(m: &mut Machine, timer: &ManualTimer, ms: u64) -> usize {
    timer.advance_ms(ms);
    m.update().unwrap()
}

fn key_for(m: &Machine, correct: bool) -> ResponseKey {
    let yes = m.current_trial().unwrap().yes_correct;
    if (yes == m.yes_key_is_first()) == correct {
        ResponseKey::First
    } else {
        ResponseKey::Second
    }
}

/// Lets the warm-up run out so the first stimulus is on screen.
fn show_first_stimulus(m: &mut Machine, timer: &ManualTimer) {
    assert_eq!(m.phase(), TrialPhase::GetReady);
    assert_eq!(advance(m, timer, 2000), 1);
    assert_eq!(m.phase(), TrialPhase::DisplayingStimulus);
}

/// Waits out flash and mask, then answers the question.
fn answer_after_mask(m: &mut Machine, timer: &ManualTimer, correct: bool) {
    assert_eq!(m.phase(), TrialPhase::DisplayingStimulus);
    assert_eq!(advance(m, timer, 500), 1);
    assert_eq!(m.phase(), TrialPhase::Masking);
    assert_eq!(advance(m, timer, 100), 1);
    assert_eq!(m.phase(), TrialPhase::AwaitingResponse);
    let key = key_for(m, correct);
    assert!(m.on_response_key(key));
    assert_eq!(m.phase(), TrialPhase::PressSpaceToContinue);
}

#[test]
fn block_complete_shown_once_and_counter_reset() {
    let config = ExperimentConfig {
        trials_per_block: 2,
        blocks: vec![BlockMode::MoreThanSixty],
        ..gameplay_config()
    };
    let (mut m, timer) = machine(config);
    assert!(m.start_session());
    assert_eq!(m.state(), CurrentState::Gameplay);
    show_first_stimulus(&mut m, &timer);

    answer_after_mask(&mut m, &timer, true);
    assert!(m.on_continue_key().unwrap());
    assert_eq!(m.trials_in_block(), 1);
    answer_after_mask(&mut m, &timer, true);
    assert_eq!(m.trials_in_block(), 2);

    assert!(m.on_continue_key().unwrap());
    assert_eq!(m.phase(), TrialPhase::ChangingBlocks);
    assert_eq!(m.trials_in_block(), 0);
    assert_eq!(
        m.view().count(|c| matches!(c, Call::BlockComplete(_))),
        1
    );
    assert!(m
        .view()
        .calls
        .contains(&Call::BlockComplete(BlockMode::MoreThanSixty)));

    // third trial
    assert!(m.on_start_assessment_clicked());
    show_first_stimulus(&mut m, &timer);
    assert_eq!(m.trials_in_block(), 0);
    assert_eq!(
        m.view().count(|c| matches!(c, Call::BlockComplete(_))),
        1
    );

    answer_after_mask(&mut m, &timer, false);
    m.on_continue_key().unwrap();
    assert_eq!(m.trials_in_block(), 1);
    answer_after_mask(&mut m, &timer, true);
    m.on_continue_key().unwrap();

    // the only block was already used up at the previous boundary
    assert_eq!(m.state(), CurrentState::Finished);
    assert_eq!(m.view().calls.last(), Some(&Call::Finish(3)));
    assert_eq!(
        m.view().count(|c| matches!(c, Call::BlockComplete(_))),
        1
    );
    assert_eq!(m.sink().records.len(), 4);
    assert_eq!(m.next_deadline(), None);
}

#[test]
fn every_block_boundary_announces_the_next_block() {
    let config = ExperimentConfig {
        trials_per_block: 2,
        total_trial_count: 8,
        ..gameplay_config()
    };
    let (mut m, timer) = machine(config);
    m.start_session();
    show_first_stimulus(&mut m, &timer);

    let mut blocks = vec![m.generator().current_block()];
    for trial in 1..=8 {
        answer_after_mask(&mut m, &timer, true);
        assert!(m.on_continue_key().unwrap());
        if trial % 2 == 0 && trial < 8 {
            assert_eq!(m.phase(), TrialPhase::ChangingBlocks);
            assert_eq!(m.trials_in_block(), 0);
            blocks.push(m.generator().current_block());
            assert!(m.on_start_assessment_clicked());
            show_first_stimulus(&mut m, &timer);
        }
    }

    assert_eq!(m.state(), CurrentState::Finished);
    assert_eq!(m.view().calls.last(), Some(&Call::Finish(8)));
    assert_eq!(
        m.view().count(|c| matches!(c, Call::BlockComplete(_))),
        3
    );
    let distinct: HashSet<BlockMode> = blocks.iter().copied().collect();
    assert_eq!(blocks.len(), 4);
    assert_eq!(distinct.len(), 4);
    assert_eq!(m.sink().records.len(), 8);
}

#[test]
fn early_response_is_scored_once_and_stale_flash_is_inert() {
    let (mut m, timer) = machine(gameplay_config());
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    let trial_id = m.current_trial().unwrap().id;

    assert_eq!(advance(&mut m, &timer, 200), 0);
    let key = key_for(&m, true);
    assert!(m.on_response_key(key));
    assert_eq!(m.phase(), TrialPhase::Masking);
    assert_eq!(m.sink().records.len(), 1);
    assert_eq!(m.sink().records[0].response_time_ns, 200_000_000);
    assert!(m.sink().records[0].correct);

    // mask ends before the flash deadline would have passed
    assert_eq!(advance(&mut m, &timer, 100), 1);
    assert_eq!(m.phase(), TrialPhase::PressSpaceToContinue);

    // flash deadline passes, nothing happens
    assert_eq!(advance(&mut m, &timer, 300), 0);
    let stale = TimerToken {
        trial: trial_id,
        phase: TrialPhase::DisplayingStimulus,
    };
    assert!(!m.on_timer(stale).unwrap());

    assert_eq!(m.phase(), TrialPhase::PressSpaceToContinue);
    assert_eq!(m.view().count(|c| *c == Call::ShowMask), 1);
    assert_eq!(m.view().count(|c| matches!(c, Call::Question(_))), 0);
    assert_eq!(m.player().num_rounds(), 1);
    assert_eq!(m.sink().records.len(), 1);
}

#[test]
fn timer_for_an_input_phase_is_ignored() {
    let (mut m, timer) = machine(gameplay_config());
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    answer_after_mask(&mut m, &timer, true);
    let token = TimerToken {
        trial: m.current_trial().unwrap().id,
        phase: TrialPhase::PressSpaceToContinue,
    };
    assert!(!m.on_timer(token).unwrap());
    assert_eq!(m.phase(), TrialPhase::PressSpaceToContinue);
}

#[test]
fn response_during_mask_skips_the_question() {
    let (mut m, timer) = machine(gameplay_config());
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    advance(&mut m, &timer, 500);
    assert_eq!(m.phase(), TrialPhase::Masking);

    assert!(m.on_response_key(ResponseKey::First));
    assert!(!m.on_response_key(ResponseKey::Second));
    assert_eq!(m.phase(), TrialPhase::Masking);

    advance(&mut m, &timer, 100);
    assert_eq!(m.phase(), TrialPhase::PressSpaceToContinue);
    assert_eq!(m.view().count(|c| matches!(c, Call::Question(_))), 0);
    assert_eq!(m.player().num_rounds(), 1);
}

#[test]
fn duplicate_responses_are_ignored() {
    let (mut m, timer) = machine(gameplay_config());
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    let key = key_for(&m, true);
    assert!(m.on_response_key(key));
    assert!(!m.on_response_key(key));
    assert!(!m.on_response_key(ResponseKey::Second));
    advance(&mut m, &timer, 100);
    assert!(!m.on_response_key(key));
    assert_eq!(m.player().num_rounds(), 1);
    assert_eq!(m.player().num_correct(), 1);
    assert_eq!(m.sink().records.len(), 1);
}

#[test]
fn out_of_phase_input_is_ignored() {
    let (mut m, timer) = machine(ExperimentConfig::default());
    assert!(!m.on_response_key(ResponseKey::First));
    assert!(!m.on_continue_key().unwrap());
    assert!(!m.on_start_assessment_clicked());

    assert!(m.start_session());
    assert!(!m.start_session());
    assert!(!m.on_response_key(ResponseKey::First));
    assert!(!m.on_start_assessment_clicked());

    show_first_stimulus(&mut m, &timer);
    assert!(!m.on_continue_key().unwrap());
    answer_after_mask(&mut m, &timer, true);
    assert!(!m.on_response_key(ResponseKey::Second));
    assert_eq!(m.player().num_rounds(), 1);
}

#[test]
fn practice_then_assessment() {
    let config = ExperimentConfig {
        practice_trial_count: 2,
        blocks: vec![BlockMode::MoreThanFifty],
        ..ExperimentConfig::default()
    };
    let (mut m, timer) = machine(config);
    m.start_session();
    assert_eq!(m.state(), CurrentState::Practice);
    assert!(m.view().calls.contains(&Call::GetReady(true)));
    assert_eq!(m.view().count(|c| matches!(c, Call::KeyGuides(..))), 1);

    show_first_stimulus(&mut m, &timer);
    answer_after_mask(&mut m, &timer, true);
    m.on_continue_key().unwrap();
    answer_after_mask(&mut m, &timer, false);
    assert_eq!(m.trials_in_block(), 0);
    assert!(m.sink().records.is_empty());

    assert!(m.on_continue_key().unwrap());
    assert_eq!(m.state(), CurrentState::PracticeFinished);
    assert_eq!(m.view().calls.last(), Some(&Call::PracticeComplete(1, 2)));
    assert_eq!(m.generator().ratio_bucket_len(), 0);
    assert!(!m.on_response_key(ResponseKey::First));

    assert!(m.on_start_assessment_clicked());
    assert_eq!(m.state(), CurrentState::Gameplay);
    assert_eq!(m.player().num_rounds(), 0);
    assert_eq!(m.player().subject_id(), "7");
    assert!(m.view().calls.contains(&Call::GetReady(false)));

    show_first_stimulus(&mut m, &timer);
    answer_after_mask(&mut m, &timer, true);
    let records = &m.sink().records;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].trial_number, 1);
    assert_eq!(records[0].block, BlockMode::MoreThanFifty);
    assert_eq!(m.trials_in_block(), 1);
}

#[test]
fn record_carries_trial_details() {
    let (mut m, timer) = machine(gameplay_config());
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    let pair = m.current_pair().unwrap().clone();
    answer_after_mask(&mut m, &timer, true);

    let r = &m.sink().records[0];
    let (a, b) = pair.counts();
    assert_eq!(r.subject_id, "7");
    assert_eq!(r.gender, Gender::Female);
    assert_eq!(r.age, 29);
    assert_eq!((r.count_a, r.count_b), (a, b));
    assert_eq!(r.difference, a as i32 - b as i32);
    assert_eq!(r.control_type, pair.control_type());
    assert_eq!(r.swapped, pair.is_swapped());
    assert_eq!(r.response_time_ns, 600_000_000);
    assert!(r.correct);
    assert_eq!(r.yes_key_is_first, m.yes_key_is_first());
    assert_eq!(r.section, 1);
    assert_eq!(m.player().last_response_time_ns(), 600_000_000);
}

#[test]
fn question_follows_the_block() {
    let config = ExperimentConfig {
        blocks: vec![BlockMode::MoreThanSeventyFive],
        ..gameplay_config()
    };
    let (mut m, timer) = machine(config);
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    advance(&mut m, &timer, 500);
    advance(&mut m, &timer, 100);
    let expected = format!("Is {} more than 75% of the total?", m.colors().a.name);
    assert!(m.view().calls.contains(&Call::Question(expected)));
}

#[test]
fn total_trial_count_ends_the_session() {
    let config = ExperimentConfig {
        total_trial_count: 1,
        ..gameplay_config()
    };
    let (mut m, timer) = machine(config);
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    answer_after_mask(&mut m, &timer, false);
    m.on_continue_key().unwrap();
    assert_eq!(m.state(), CurrentState::Finished);
    assert_eq!(m.view().calls.last(), Some(&Call::Finish(0)));
    assert!(!m.start_session());
    assert!(!m.on_start_assessment_clicked());
}

#[test]
fn inter_trial_gap_delays_the_next_stimulus() {
    let config = ExperimentConfig {
        inter_trial_delay_ms: 300,
        ..gameplay_config()
    };
    let (mut m, timer) = machine(config);
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    answer_after_mask(&mut m, &timer, true);
    m.on_continue_key().unwrap();
    assert_eq!(m.phase(), TrialPhase::InterTrialGap);
    assert_eq!(advance(&mut m, &timer, 299), 0);
    assert_eq!(advance(&mut m, &timer, 1), 1);
    assert_eq!(m.phase(), TrialPhase::DisplayingStimulus);
    assert_eq!(m.view().count(|c| matches!(c, Call::PaintPair(..))), 2);
}

#[test]
fn feedback_only_from_configured_section() {
    let (mut m, timer) = machine(gameplay_config());
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    answer_after_mask(&mut m, &timer, true);
    assert_eq!(m.view().count(|c| matches!(c, Call::Feedback(_))), 0);

    let config = ExperimentConfig {
        feedback_from_section: Some(1),
        ..gameplay_config()
    };
    let (mut m, timer) = machine(config);
    m.start_session();
    show_first_stimulus(&mut m, &timer);
    answer_after_mask(&mut m, &timer, false);
    assert!(m.view().calls.contains(&Call::Feedback(false)));
}

#[test]
fn invalid_config_refused_at_construction() {
    let good = ExperimentConfig::default();
    let generator = DotsPairGenerator::new(&good, StdRng::seed_from_u64(1)).unwrap();
    let bad = ExperimentConfig {
        trials_per_block: 0,
        ..good
    };
    let built = TrialStateMachine::new(
        bad,
        generator,
        RecordingView::default(),
        MemorySink::default(),
        ManualTimer::new(),
        StdRng::seed_from_u64(2),
        Player::new("1", Gender::Male, 20),
    );
    assert!(built.is_err());
}
