//! Dot clusters and the canvas they are placed on.

use crate::error::{StimulusError, StimulusResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, warn};

/// Rescaling never shrinks a dot below this diameter (px).
pub const MIN_SCALED_DIAMETER: f64 = 1.0;

/// Random candidates tried per dot before settling for the least overlapping one.
const MAX_PLACEMENT_ATTEMPTS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Region the clusters are drawn in, in pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Canvas {
    pub width: f32,
    pub height: f32,
    pub min_diameter: f32,
    pub max_diameter: f32,
    /// Minimum gap between two dots and between a dot and the border.
    pub margin: f32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1344.0,
            height: 756.0,
            min_diameter: 12.0,
            max_diameter: 36.0,
            margin: 4.0,
        }
    }
}

impl Canvas {
    /// Checks that the diameter range is usable and a single dot fits.
    pub fn check(&self) -> StimulusResult<()> {
        if !(self.min_diameter > 0.0 && self.min_diameter.is_finite()) {
            return Err(StimulusError::InvalidDiameter(self.min_diameter as f64));
        }
        if !(self.max_diameter >= self.min_diameter && self.max_diameter.is_finite()) {
            return Err(StimulusError::InvalidDiameter(self.max_diameter as f64));
        }
        let needed = self.max_diameter + 2.0 * self.margin.max(0.0);
        if self.width < needed || self.height < needed {
            return Err(StimulusError::CanvasTooSmall {
                width: self.width,
                height: self.height,
                diameter: self.max_diameter,
            });
        }
        Ok(())
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// One cluster of dots.
///
/// `positions` are dot centres. Both vectors always have `count()` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct DotSet {
    positions: Vec<Point>,
    diameters: Vec<f64>,
}

impl DotSet {
    /// Places `count` dots on `canvas` without overlapping each other or the
    /// dots of `avoid`.
    pub fn generate<R: Rng>(
        count: u32,
        avoid: Option<&DotSet>,
        canvas: &Canvas,
        rng: &mut R,
    ) -> StimulusResult<Self> {
        if count == 0 {
            return Err(StimulusError::EmptySet);
        }
        canvas.check()?;

        let mut set = Self {
            positions: Vec::with_capacity(count as usize),
            diameters: Vec::with_capacity(count as usize),
        };
        for _ in 0..count {
            let diameter = rng.random_range(canvas.min_diameter..=canvas.max_diameter);
            let center = set.place(diameter, avoid, canvas, rng);
            set.positions.push(center);
            set.diameters.push(diameter as f64);
        }
        Ok(set)
    }

    pub fn from_parts(positions: Vec<Point>, diameters: Vec<f64>) -> StimulusResult<Self> {
        if positions.len() != diameters.len() {
            return Err(StimulusError::MismatchedLengths {
                positions: positions.len(),
                diameters: diameters.len(),
            });
        }
        if positions.is_empty() {
            return Err(StimulusError::EmptySet);
        }
        if let Some(bad) = diameters.iter().find(|d| !(d.is_finite() && **d > 0.0)) {
            return Err(StimulusError::InvalidDiameter(*bad));
        }
        Ok(Self {
            positions,
            diameters,
        })
    }

    fn place<R: Rng>(
        &self,
        diameter: f32,
        avoid: Option<&DotSet>,
        canvas: &Canvas,
        rng: &mut R,
    ) -> Point {
        let r = diameter / 2.0;
        let margin = canvas.margin.max(0.0);
        let (x_lo, x_hi) = (margin + r, canvas.width - margin - r);
        let (y_lo, y_hi) = (margin + r, canvas.height - margin - r);

        let mut best: Option<(f32, Point)> = None;
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let candidate = Point::new(
                rng.random_range(x_lo..=x_hi),
                rng.random_range(y_lo..=y_hi),
            );
            let clearance = self
                .clearance(&candidate, r, margin)
                .min(avoid.map_or(f32::INFINITY, |o| o.clearance(&candidate, r, margin)));
            if clearance >= 0.0 {
                return candidate;
            }
            if best.is_none_or(|(c, _)| clearance > c) {
                best = Some((clearance, candidate));
            }
        }

        warn!(
            placed = self.positions.len(),
            diameter, "no free spot for dot, using least overlapping candidate"
        );
        best.map(|(_, p)| p)
            .unwrap_or(Point::new((x_lo + x_hi) / 2.0, (y_lo + y_hi) / 2.0))
    }

    /// Gap between a dot of radius `r` at `center` and the closest dot of
    /// this set, minus `margin`. Negative means the dots would overlap.
    fn clearance(&self, center: &Point, r: f32, margin: f32) -> f32 {
        self.positions
            .iter()
            .zip(&self.diameters)
            .map(|(p, d)| p.distance(center) - r - (*d as f32) / 2.0 - margin)
            .fold(f32::INFINITY, f32::min)
    }

    pub fn count(&self) -> u32 {
        self.positions.len() as u32
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn diameters(&self) -> &[f64] {
        &self.diameters
    }

    pub fn total_area(&self) -> f64 {
        self.diameters.iter().map(|d| PI * (d / 2.0).powi(2)).sum()
    }

    /// Shrinks every dot uniformly so the total area becomes `target`.
    pub fn match_area(&mut self, target: f64) -> StimulusResult<()> {
        if !(target.is_finite() && target > 0.0) {
            return Err(StimulusError::DegenerateArea(target));
        }
        let current = self.total_area();
        if target > current * (1.0 + 1e-9) {
            return Err(StimulusError::WouldGrow { current, target });
        }
        self.scale((target / current).sqrt());
        Ok(())
    }

    /// Shrinks this (smaller) set once more by its own ratio to `other`, so
    /// the new area is `area² / other` and the disparity is squared.
    pub fn inverse_match_area(&mut self, other: f64) -> StimulusResult<()> {
        if !(other.is_finite() && other > 0.0) {
            return Err(StimulusError::DegenerateArea(other));
        }
        let current = self.total_area();
        if current > other * (1.0 + 1e-9) {
            return Err(StimulusError::NotSmaller { current, other });
        }
        self.scale((current / other).sqrt());
        Ok(())
    }

    fn scale(&mut self, factor: f64) {
        let smallest = self.diameters.iter().copied().fold(f64::INFINITY, f64::min);
        let floor = (MIN_SCALED_DIAMETER / smallest).min(1.0);
        let applied = factor.max(floor);
        if applied != factor {
            debug!(factor, applied, "diameter scale clamped");
        }
        for d in &mut self.diameters {
            *d *= applied;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn unit_set(diameters: &[f64]) -> DotSet {
        let positions = (0..diameters.len())
            .map(|i| Point::new(i as f32 * 50.0, 0.0))
            .collect();
        DotSet::from_parts(positions, diameters.to_vec()).unwrap()
    }

    #[test]
    fn generate_respects_count_and_canvas() {
        let canvas = Canvas::default();
        let mut rng = StdRng::seed_from_u64(7);
        let set = DotSet::generate(25, None, &canvas, &mut rng).unwrap();
        assert_eq!(set.count(), 25);
        assert_eq!(set.positions().len(), 25);
        assert_eq!(set.diameters().len(), 25);
        for (p, d) in set.positions().iter().zip(set.diameters()) {
            let r = *d as f32 / 2.0;
            assert!(p.x - r >= 0.0 && p.x + r <= canvas.width);
            assert!(p.y - r >= 0.0 && p.y + r <= canvas.height);
        }
    }

    #[test]
    fn generated_sets_do_not_overlap_each_other() {
        let canvas = Canvas::default();
        let mut rng = StdRng::seed_from_u64(11);
        let a = DotSet::generate(30, None, &canvas, &mut rng).unwrap();
        let b = DotSet::generate(30, Some(&a), &canvas, &mut rng).unwrap();
        for (pa, da) in a.positions().iter().zip(a.diameters()) {
            for (pb, db) in b.positions().iter().zip(b.diameters()) {
                assert!(pa.distance(pb) >= (*da + *db) as f32 / 2.0);
            }
        }
    }

    #[test]
    fn zero_dots_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            DotSet::generate(0, None, &Canvas::default(), &mut rng),
            Err(StimulusError::EmptySet)
        );
    }

    #[test]
    fn tiny_canvas_rejected() {
        let canvas = Canvas {
            width: 20.0,
            height: 20.0,
            ..Canvas::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            DotSet::generate(3, None, &canvas, &mut rng),
            Err(StimulusError::CanvasTooSmall { .. })
        ));
    }

    #[test]
    fn from_parts_validates() {
        assert!(matches!(
            DotSet::from_parts(vec![Point::new(0.0, 0.0)], vec![]),
            Err(StimulusError::MismatchedLengths { .. })
        ));
        assert!(matches!(
            DotSet::from_parts(vec![Point::new(0.0, 0.0)], vec![0.0]),
            Err(StimulusError::InvalidDiameter(_))
        ));
    }

    #[test]
    fn match_area_hits_target_and_keeps_layout() {
        let mut set = unit_set(&[10.0, 20.0, 30.0]);
        let positions = set.positions().to_vec();
        let target = set.total_area() / 2.0;
        set.match_area(target).unwrap();
        assert!((set.total_area() - target).abs() < 1e-6);
        assert_eq!(set.count(), 3);
        assert_eq!(set.positions(), positions.as_slice());
    }

    #[test]
    fn match_area_refuses_to_grow() {
        let mut set = unit_set(&[10.0]);
        let area = set.total_area();
        assert!(matches!(
            set.match_area(area * 2.0),
            Err(StimulusError::WouldGrow { .. })
        ));
    }

    #[test]
    fn degenerate_targets_rejected() {
        let mut set = unit_set(&[10.0, 10.0]);
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                set.match_area(bad),
                Err(StimulusError::DegenerateArea(_))
            ));
            assert!(matches!(
                set.inverse_match_area(bad),
                Err(StimulusError::DegenerateArea(_))
            ));
        }
    }

    #[test]
    fn inverse_match_squares_the_disparity() {
        let mut small = unit_set(&[10.0, 10.0]);
        let large = unit_set(&[20.0, 20.0]);
        let (before, other) = (small.total_area(), large.total_area());
        small.inverse_match_area(other).unwrap();
        let expected = before * before / other;
        assert!((small.total_area() - expected).abs() < 1e-6);
        assert!(small.total_area() < before);
    }

    #[test]
    fn inverse_match_needs_smaller_side() {
        let mut large = unit_set(&[20.0]);
        assert!(matches!(
            large.inverse_match_area(unit_set(&[10.0]).total_area()),
            Err(StimulusError::NotSmaller { .. })
        ));
    }

    #[test]
    fn scaling_clamps_at_minimum_diameter() {
        let mut set = unit_set(&[2.0, 40.0]);
        set.match_area(1e-6).unwrap();
        let smallest = set.diameters().iter().copied().fold(f64::INFINITY, f64::min);
        assert!((smallest - MIN_SCALED_DIAMETER).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn area_ops_keep_diameters_positive(
            count in 1u32..60,
            seed in any::<u64>(),
            shrink in 0.01f64..1.0,
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let canvas = Canvas::default();
            let mut set = DotSet::generate(count, None, &canvas, &mut rng).unwrap();
            let area = set.total_area();
            set.match_area(area * shrink).unwrap();
            set.inverse_match_area(area).unwrap();
            prop_assert_eq!(set.count(), count);
            prop_assert!(set.diameters().iter().all(|d| *d > 0.0));
            prop_assert!(set.total_area() <= area * shrink + 1e-6);
        }
    }
}
