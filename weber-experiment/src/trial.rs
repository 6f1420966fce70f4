use weber_core::{BlockMode, ResponseKey, StimulusPair};

/// The trial currently on screen
#[derive(Debug, Clone)]
pub struct ActiveTrial<T> {
    pub id: u64,
    pub pair: StimulusPair,
    pub block: BlockMode,
    pub section: u32,
    pub yes_correct: bool,
    pub timestamps: TrialTimestamps<T>,
    pub response: Option<TrialResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialResponse {
    pub key: ResponseKey,
    pub correct: bool,
    pub response_time_ns: u64,
}

#[derive(Debug, Clone)]
pub struct TrialTimestamps<T> {
    pub stimulus_start: T,
    pub response: Option<T>,
}

impl<T> ActiveTrial<T> {
    pub fn is_answered(&self) -> bool {
        self.response.is_some()
    }
}
