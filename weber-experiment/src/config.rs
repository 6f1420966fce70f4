use std::path::Path;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use weber_core::{BlockMode, Canvas};

use crate::error::ConfigError;
use crate::ratios::MAX_TOTAL;

/// Which area control the generator assigns to each pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaControlPolicy {
    /// Equal or inverse areas at random, with the anti-bias streak cap.
    #[default]
    Balanced,
    EqualAreasOnly,
    InverseAreasOnly,
    AverageRadius,
    Off,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub get_ready_ms: u64,
    pub flash_duration_ms: u64,
    pub mask_duration_ms: u64,
    pub inter_trial_delay_ms: u64,
    pub trials_per_block: u32,
    /// Zero skips practice.
    pub practice_trial_count: u32,
    pub total_trial_count: u32,
    /// Passes over `blocks`, each in its own shuffled order.
    pub sections: u32,
    pub blocks: Vec<BlockMode>,
    pub area_control: AreaControlPolicy,
    /// First section (1-based) in which correctness feedback is given.
    pub feedback_from_section: Option<u32>,
    pub seed: Option<u64>,
    pub canvas: Canvas,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            get_ready_ms: 2000,
            flash_duration_ms: 500,
            mask_duration_ms: 100,
            inter_trial_delay_ms: 0,
            trials_per_block: 20,
            practice_trial_count: 4,
            total_trial_count: 80,
            sections: 1,
            blocks: BlockMode::ALL.to_vec(),
            area_control: AreaControlPolicy::Balanced,
            feedback_from_section: None,
            seed: None,
            canvas: Canvas::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("get_ready_ms", self.get_ready_ms),
            ("flash_duration_ms", self.flash_duration_ms),
            ("mask_duration_ms", self.mask_duration_ms),
            ("trials_per_block", self.trials_per_block as u64),
            ("total_trial_count", self.total_trial_count as u64),
            ("sections", self.sections as u64),
        ];
        if let Some((name, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::NotPositive(*name));
        }

        if self.blocks.is_empty() {
            return Err(ConfigError::NoBlocks);
        }
        for (i, block) in self.blocks.iter().enumerate() {
            if self.blocks[..i].contains(block) {
                return Err(ConfigError::DuplicateBlock(*block));
            }
        }

        self.canvas.check()?;
        let c = &self.canvas;
        let footprint = c.max_diameter + c.margin.max(0.0);
        if c.area() < 4.0 * MAX_TOTAL as f32 * footprint * footprint {
            return Err(ConfigError::CanvasCrowded {
                width: c.width,
                height: c.height,
                dots: MAX_TOTAL,
                diameter: c.max_diameter,
            });
        }
        Ok(())
    }

    /// Random source for one component of the session. Seeded sessions give
    /// each `stream` its own reproducible sequence.
    pub fn rng(&self, stream: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_os_rng(),
        }
    }

    pub fn get_ready(&self) -> Duration {
        Duration::from_millis(self.get_ready_ms)
    }

    pub fn flash_duration(&self) -> Duration {
        Duration::from_millis(self.flash_duration_ms)
    }

    pub fn mask_duration(&self) -> Duration {
        Duration::from_millis(self.mask_duration_ms)
    }

    pub fn inter_trial_delay(&self) -> Duration {
        Duration::from_millis(self.inter_trial_delay_ms)
    }

    pub fn feedback_enabled(&self, section: u32) -> bool {
        self.feedback_from_section.is_some_and(|from| section >= from)
    }
}
