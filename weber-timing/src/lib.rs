pub mod delay;
pub mod timer;

pub use delay::DelayQueue;
pub use timer::{CalibrationStats, HighPrecisionTimer, ManualTimer, Timer};
