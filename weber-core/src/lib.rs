pub mod answer;
pub mod block;
pub mod color;
pub mod dots;
pub mod error;
pub mod phase;
pub mod stimulus;
pub mod trial;

pub use answer::{ResponseKey, is_response_correct, side_is_yes_correct};
pub use block::{BlockMode, Ratio};
pub use color::{ColorPair, DotColor};
pub use dots::{Canvas, DotSet, Point};
pub use error::{StimulusError, StimulusResult};
pub use phase::{CurrentState, TrialPhase};
pub use stimulus::{ControlType, StimulusPair};
pub use trial::{Gender, Player, TrialRecord};
