use crate::block::BlockMode;
use crate::dots::{Canvas, DotSet};
use crate::error::StimulusResult;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How the total areas of the two clusters are normalised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlType {
    None,
    /// The larger-area cluster is shrunk to the smaller one's area.
    EqualAreas,
    /// The smaller-area cluster is shrunk further.
    InverseAreas,
    AverageRadiusEqual,
}

impl ControlType {
    /// Inverse areas leave the cluster with bigger dots as the right answer,
    /// equal areas the one with smaller dots. `None` for the other policies.
    pub fn big_dots_correct(&self) -> Option<bool> {
        match self {
            Self::InverseAreas => Some(true),
            Self::EqualAreas => Some(false),
            Self::None | Self::AverageRadiusEqual => None,
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            Self::EqualAreas => Self::InverseAreas,
            Self::InverseAreas => Self::EqualAreas,
            other => *other,
        }
    }
}

/// The two clusters shown on one trial
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusPair {
    set_a: DotSet,
    set_b: DotSet,
    difference: i32,
    left_correct: bool,
    control_type: ControlType,
    swapped: bool,
}

impl StimulusPair {
    /// Places both clusters, applies the area control and scores set A
    /// against `block`.
    pub fn new<R: Rng>(
        count_a: u32,
        count_b: u32,
        control_type: ControlType,
        block: BlockMode,
        canvas: &Canvas,
        rng: &mut R,
    ) -> StimulusResult<Self> {
        let mut set_a = DotSet::generate(count_a, None, canvas, rng)?;
        let mut set_b = DotSet::generate(count_b, Some(&set_a), canvas, rng)?;
        apply_area_control(control_type, &mut set_a, &mut set_b)?;

        let mut pair = Self {
            set_a,
            set_b,
            difference: count_a as i32 - count_b as i32,
            left_correct: false,
            control_type,
            swapped: false,
        };
        pair.determine_which_side_correct(block);
        Ok(pair)
    }

    pub fn determine_which_side_correct(&mut self, block: BlockMode) {
        self.left_correct = block.is_satisfied(self.set_a.count(), self.set_b.count());
    }

    /// Exchanges the clusters so set A gets the other count.
    pub fn swap_sides(mut self, block: BlockMode) -> Self {
        std::mem::swap(&mut self.set_a, &mut self.set_b);
        self.difference = -self.difference;
        self.swapped = !self.swapped;
        self.determine_which_side_correct(block);
        self
    }

    pub fn set_a(&self) -> &DotSet {
        &self.set_a
    }

    pub fn set_b(&self) -> &DotSet {
        &self.set_b
    }

    pub fn counts(&self) -> (u32, u32) {
        (self.set_a.count(), self.set_b.count())
    }

    pub fn total_count(&self) -> u32 {
        self.set_a.count() + self.set_b.count()
    }

    pub fn difference(&self) -> i32 {
        self.difference
    }

    pub fn is_left_correct(&self) -> bool {
        self.left_correct
    }

    pub fn control_type(&self) -> ControlType {
        self.control_type
    }

    pub fn is_swapped(&self) -> bool {
        self.swapped
    }
}

fn apply_area_control(
    control_type: ControlType,
    set_a: &mut DotSet,
    set_b: &mut DotSet,
) -> StimulusResult<()> {
    let (area_a, area_b) = (set_a.total_area(), set_b.total_area());
    match control_type {
        ControlType::EqualAreas if area_a > area_b => set_a.match_area(area_b),
        ControlType::EqualAreas => set_b.match_area(area_a),
        ControlType::InverseAreas if area_a > area_b => set_b.inverse_match_area(area_a),
        ControlType::InverseAreas => set_a.inverse_match_area(area_b),
        ControlType::None | ControlType::AverageRadiusEqual => Ok(()),
    }
}
