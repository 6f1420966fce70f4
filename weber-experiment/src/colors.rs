use rand::Rng;
use tracing::debug;
use weber_core::color::{COLOR_PAIRS, PALETTE};
use weber_core::{ColorPair, DotColor};

/// Color pairs handed out one per block, without replacement until all four
/// have been used
#[derive(Debug, Clone)]
pub struct ColorRotation {
    unused: Vec<ColorPair>,
    current: ColorPair,
    mask: DotColor,
}

impl ColorRotation {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        let mut rotation = Self {
            unused: Vec::with_capacity(COLOR_PAIRS.len()),
            current: COLOR_PAIRS[0],
            mask: PALETTE[PALETTE.len() - 1],
        };
        rotation.advance(rng);
        rotation
    }

    /// Draws the next pair and a mask color that neither cluster uses.
    pub fn advance<R: Rng>(&mut self, rng: &mut R) {
        if self.unused.is_empty() {
            self.unused.extend_from_slice(&COLOR_PAIRS);
        }
        let idx = rng.random_range(0..self.unused.len());
        self.current = self.unused.swap_remove(idx);

        let spare: Vec<DotColor> = PALETTE
            .iter()
            .filter(|c| !self.current.contains(c))
            .copied()
            .collect();
        self.mask = spare[rng.random_range(0..spare.len())];
        debug!(a = self.current.a.name, b = self.current.b.name, mask = self.mask.name, "colors");
    }

    pub fn current(&self) -> ColorPair {
        self.current
    }

    pub fn mask_color(&self) -> DotColor {
        self.mask
    }
}
