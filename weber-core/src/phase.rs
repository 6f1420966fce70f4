/// Session-level state
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum CurrentState {
    /// Subject intake and instructions.
    #[default]
    Introduction,
    Practice,
    /// Practice is over; waiting for the subject to start the assessment.
    PracticeFinished,
    /// Scored trials.
    Gameplay,
    Finished,
}

impl CurrentState {
    /// Trials are running in this state.
    pub fn runs_trials(&self) -> bool {
        matches!(self, Self::Practice | Self::Gameplay)
    }

    pub fn is_practice(&self) -> bool {
        matches!(self, Self::Practice)
    }

    pub fn is_gameplay(&self) -> bool {
        matches!(self, Self::Gameplay)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Trial-level sub-state nested in [`CurrentState`]
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TrialPhase {
    #[default]
    AwaitingStart,
    GetReady,
    DisplayingStimulus,
    Masking,
    AwaitingResponse,
    PressSpaceToContinue,
    /// Blank gap between continuing and the next stimulus.
    InterTrialGap,
    ChangingBlocks,
}

impl TrialPhase {
    /// A response key pressed in this phase is scored.
    pub fn accepts_response(&self) -> bool {
        matches!(
            self,
            Self::DisplayingStimulus | Self::Masking | Self::AwaitingResponse
        )
    }

    /// The phase ends on a timer rather than on input.
    pub fn is_timed(&self) -> bool {
        matches!(
            self,
            Self::GetReady | Self::DisplayingStimulus | Self::Masking | Self::InterTrialGap
        )
    }
}
