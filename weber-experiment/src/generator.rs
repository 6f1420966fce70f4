use std::collections::VecDeque;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;
use weber_core::{BlockMode, Canvas, ControlType, Ratio, StimulusPair, StimulusResult};

use crate::config::{AreaControlPolicy, ExperimentConfig};
use crate::error::ConfigError;
use crate::ratios::{ratio_table, scale_ratio};

/// Consecutive same-category control types allowed before one is flipped.
pub const MAX_SAME_SIZE_STREAK: u32 = 3;

/// Source of stimulus pairs and block sequencing for a session
pub trait PairGenerator {
    /// Moves to the next queued block. Stays put on the last one.
    fn next_block(&mut self);
    fn clear_ratio_bucket(&mut self);
    fn current_block(&self) -> BlockMode;
    /// Blocks still queued after the current one.
    fn remaining_block_count(&self) -> usize;
    /// 1-based section the current block belongs to.
    fn current_section(&self) -> u32;
    fn next_pair(&mut self) -> StimulusResult<StimulusPair>;
}

#[derive(Debug, Clone)]
pub struct DotsPairGenerator<R: Rng> {
    rng: R,
    canvas: Canvas,
    area_control: AreaControlPolicy,
    current: (u32, BlockMode),
    queue: VecDeque<(u32, BlockMode)>,
    ratio_bucket: Vec<Ratio>,
    same_size_streak: u32,
    last_was_big: bool,
}

impl<R: Rng> DotsPairGenerator<R> {
    /// Queues `config.sections` passes over the configured blocks, each pass
    /// shuffled on its own.
    pub fn new(config: &ExperimentConfig, mut rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut queue = VecDeque::new();
        for section in 1..=config.sections {
            let mut pass = config.blocks.clone();
            pass.shuffle(&mut rng);
            queue.extend(pass.into_iter().map(|b| (section, b)));
        }
        debug!(?queue, "block queue");
        Self::from_queue(queue, config.canvas.clone(), config.area_control, rng)
    }

    /// Runs `blocks` in the given order as a single section.
    pub fn with_blocks(
        blocks: &[BlockMode],
        canvas: Canvas,
        area_control: AreaControlPolicy,
        rng: R,
    ) -> Result<Self, ConfigError> {
        canvas.check()?;
        let queue = blocks.iter().map(|b| (1, *b)).collect();
        Self::from_queue(queue, canvas, area_control, rng)
    }

    fn from_queue(
        mut queue: VecDeque<(u32, BlockMode)>,
        canvas: Canvas,
        area_control: AreaControlPolicy,
        rng: R,
    ) -> Result<Self, ConfigError> {
        let current = queue.pop_front().ok_or(ConfigError::NoBlocks)?;
        Ok(Self {
            rng,
            canvas,
            area_control,
            current,
            queue,
            ratio_bucket: Vec::with_capacity(8),
            same_size_streak: 0,
            last_was_big: false,
        })
    }

    pub fn same_size_streak(&self) -> u32 {
        self.same_size_streak
    }

    pub fn last_was_big(&self) -> bool {
        self.last_was_big
    }

    pub fn ratio_bucket_len(&self) -> usize {
        self.ratio_bucket.len()
    }

    fn draw_ratio(&mut self) -> Ratio {
        if self.ratio_bucket.is_empty() {
            self.ratio_bucket.extend_from_slice(ratio_table(self.current.1));
            debug!(block = ?self.current.1, "ratio bucket refilled");
        }
        let idx = self.rng.random_range(0..self.ratio_bucket.len());
        self.ratio_bucket.swap_remove(idx)
    }

    fn choose_control_type(&mut self) -> ControlType {
        match self.area_control {
            AreaControlPolicy::Balanced => {}
            AreaControlPolicy::EqualAreasOnly => return ControlType::EqualAreas,
            AreaControlPolicy::InverseAreasOnly => return ControlType::InverseAreas,
            AreaControlPolicy::AverageRadius => return ControlType::AverageRadiusEqual,
            AreaControlPolicy::Off => return ControlType::None,
        }

        let mut candidate = if self.rng.random_bool(0.5) {
            ControlType::EqualAreas
        } else {
            ControlType::InverseAreas
        };
        let big = candidate.big_dots_correct() == Some(true);
        if big == self.last_was_big {
            self.same_size_streak += 1;
        } else {
            self.same_size_streak = 0;
        }
        self.last_was_big = big;

        if self.same_size_streak >= MAX_SAME_SIZE_STREAK {
            candidate = candidate.opposite();
            self.same_size_streak = 0;
            self.last_was_big = !self.last_was_big;
            debug!(?candidate, "area control flipped to break streak");
        }
        candidate
    }
}

impl<R: Rng> PairGenerator for DotsPairGenerator<R> {
    fn next_block(&mut self) {
        match self.queue.pop_front() {
            Some(next) => {
                self.current = next;
                debug!(section = next.0, block = ?next.1, "next block");
            }
            None => debug!("no blocks left, staying on the last one"),
        }
        self.ratio_bucket.clear();
    }

    fn clear_ratio_bucket(&mut self) {
        self.ratio_bucket.clear();
    }

    fn current_block(&self) -> BlockMode {
        self.current.1
    }

    fn remaining_block_count(&self) -> usize {
        self.queue.len()
    }

    fn current_section(&self) -> u32 {
        self.current.0
    }

    fn next_pair(&mut self) -> StimulusResult<StimulusPair> {
        let block = self.current.1;
        let ratio = self.draw_ratio();
        let (count_a, count_b) = scale_ratio(ratio, &mut self.rng);
        let control_type = self.choose_control_type();

        let pair = StimulusPair::new(
            count_a,
            count_b,
            control_type,
            block,
            &self.canvas,
            &mut self.rng,
        )?;
        let pair = if self.rng.random_bool(0.5) {
            pair.swap_sides(block)
        } else {
            pair
        };
        debug!(
            counts = ?pair.counts(),
            ?control_type,
            swapped = pair.is_swapped(),
            left_correct = pair.is_left_correct(),
            "pair generated"
        );
        Ok(pair)
    }
}
