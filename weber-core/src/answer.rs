//! Scoring of a single response.

use crate::block::BlockMode;
use crate::stimulus::StimulusPair;
use serde::{Deserialize, Serialize};

/// The two physical response keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKey {
    /// `F`
    First,
    /// `J`
    Second,
}

impl ResponseKey {
    pub fn label(&self) -> &'static str {
        match self {
            Self::First => "F",
            Self::Second => "J",
        }
    }
}

/// Whether "yes" answers the block's question correctly for this pair.
pub fn side_is_yes_correct(pair: &StimulusPair, block: BlockMode) -> bool {
    let (a, b) = pair.counts();
    block.is_satisfied(a, b)
}

/// Maps the pressed key to yes/no through the session's key orientation and
/// compares it with the right answer.
pub fn is_response_correct(pressed: ResponseKey, yes_correct: bool, yes_key_is_first: bool) -> bool {
    let pressed_yes = (pressed == ResponseKey::First) == yes_key_is_first;
    pressed_yes == yes_correct
}
