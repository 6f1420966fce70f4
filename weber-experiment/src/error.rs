use std::path::PathBuf;

use thiserror::Error;
use weber_core::{BlockMode, StimulusError};

/// Rejected session settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("at least one block must be configured")]
    NoBlocks,

    #[error("block {0:?} is listed more than once")]
    DuplicateBlock(BlockMode),

    #[error("invalid canvas: {0}")]
    Canvas(#[from] StimulusError),

    #[error("canvas {width}x{height} is too small for {dots} dots of up to {diameter}px")]
    CanvasCrowded {
        width: f32,
        height: f32,
        dots: u32,
        diameter: f32,
    },

    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExperimentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("stimulus generation failed: {0}")]
    Stimulus(#[from] StimulusError),
}
