pub mod colors;
pub mod config;
pub mod error;
pub mod generator;
pub mod prompts;
pub mod ratios;
pub mod sink;
pub mod state;
pub mod trial;
pub mod view;

pub use colors::ColorRotation;
pub use config::{AreaControlPolicy, ExperimentConfig};
pub use error::{ConfigError, ExperimentError, SinkError};
pub use generator::{DotsPairGenerator, PairGenerator};
pub use sink::{JsonLinesSink, MemorySink, TrialSink};
pub use state::{TimerToken, TrialStateMachine};
pub use trial::{ActiveTrial, TrialResponse, TrialTimestamps};
pub use view::View;
