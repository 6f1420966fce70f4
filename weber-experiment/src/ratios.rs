//! Target count ratios per block and their scaling into dot counts.

use rand::Rng;
use weber_core::{BlockMode, Ratio};

/// Scaled counts always add up to at least this many dots.
pub const MIN_TOTAL: u32 = 20;
/// ...and never more than this many.
pub const MAX_TOTAL: u32 = 60;

const HALF_RATIOS: [Ratio; 8] = [
    Ratio::new(9, 16),
    Ratio::new(10, 14),
    Ratio::new(11, 13),
    Ratio::new(12, 13),
    Ratio::new(13, 12),
    Ratio::new(13, 11),
    Ratio::new(14, 10),
    Ratio::new(16, 9),
];

// The threshold tables always favour set A and straddle the threshold four
// above, four below. With the random side swap on top, "no" is the right
// answer on about three trials in four; the answer key is not balanced for
// these blocks.
const SIXTY_RATIOS: [Ratio; 8] = [
    Ratio::new(11, 9),
    Ratio::new(4, 3),
    Ratio::new(7, 5),
    Ratio::new(13, 9),
    Ratio::new(8, 5),
    Ratio::new(5, 3),
    Ratio::new(7, 4),
    Ratio::new(9, 5),
];

const SEVENTY_FIVE_RATIOS: [Ratio; 8] = [
    Ratio::new(2, 1),
    Ratio::new(7, 3),
    Ratio::new(5, 2),
    Ratio::new(8, 3),
    Ratio::new(13, 4),
    Ratio::new(7, 2),
    Ratio::new(4, 1),
    Ratio::new(9, 2),
];

pub fn ratio_table(block: BlockMode) -> &'static [Ratio; 8] {
    match block {
        BlockMode::MoreThanHalf | BlockMode::MoreThanFifty => &HALF_RATIOS,
        BlockMode::MoreThanSixty => &SIXTY_RATIOS,
        BlockMode::MoreThanSeventyFive => &SEVENTY_FIVE_RATIOS,
    }
}

/// Multiplies `ratio` up to at least [`MIN_TOTAL`] dots, then by a random
/// number of extra steps that keeps the total within [`MAX_TOTAL`].
pub fn scale_ratio<R: Rng>(ratio: Ratio, rng: &mut R) -> (u32, u32) {
    let base = ratio.sum().max(1);
    let mut k = MIN_TOTAL.div_ceil(base).max(1);
    let max_k = MAX_TOTAL / base;
    if max_k > k {
        k += rng.random_range(0..=max_k - k);
    }
    ratio.scaled(k)
}
