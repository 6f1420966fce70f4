use crate::block::BlockMode;
use crate::stimulus::ControlType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

/// The subject and their running score
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    subject_id: String,
    gender: Gender,
    age: u32,
    num_rounds: u32,
    num_correct: u32,
    last_response_time_ns: u64,
    last_was_right: bool,
}

impl Player {
    pub fn new(subject_id: impl Into<String>, gender: Gender, age: u32) -> Self {
        Self {
            subject_id: subject_id.into(),
            gender,
            age,
            num_rounds: 0,
            num_correct: 0,
            last_response_time_ns: 0,
            last_was_right: false,
        }
    }

    pub fn record_response(&mut self, correct: bool, response_time_ns: u64) {
        self.num_rounds += 1;
        if correct {
            self.num_correct += 1;
        }
        self.last_was_right = correct;
        self.last_response_time_ns = response_time_ns;
    }

    /// Clears the score but keeps who the subject is.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.subject_id), self.gender, self.age);
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn num_rounds(&self) -> u32 {
        self.num_rounds
    }

    pub fn num_correct(&self) -> u32 {
        self.num_correct
    }

    pub fn last_response_time_ns(&self) -> u64 {
        self.last_response_time_ns
    }

    pub fn last_was_right(&self) -> bool {
        self.last_was_right
    }
}

/// One scored trial, as handed to persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub subject_id: String,
    pub gender: Gender,
    pub age: u32,
    pub trial_number: u32,
    pub section: u32,
    pub block: BlockMode,
    pub count_a: u32,
    pub count_b: u32,
    pub difference: i32,
    pub control_type: ControlType,
    pub swapped: bool,
    pub response_time_ns: u64,
    pub correct: bool,
    /// `true` when the first key (`F`) means "yes".
    pub yes_key_is_first: bool,
}
