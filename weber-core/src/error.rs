use thiserror::Error;

/// Failures while building or rescaling dot clusters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StimulusError {
    #[error("a dot set needs at least one dot")]
    EmptySet,

    #[error("{positions} positions but {diameters} diameters")]
    MismatchedLengths { positions: usize, diameters: usize },

    #[error("dot diameters must be positive and finite, got {0}")]
    InvalidDiameter(f64),

    #[error("degenerate area target: {0}")]
    DegenerateArea(f64),

    #[error("area matching only shrinks a set (current {current:.1}, target {target:.1})")]
    WouldGrow { current: f64, target: f64 },

    #[error("inverse matching needs the smaller set (current {current:.1}, other {other:.1})")]
    NotSmaller { current: f64, other: f64 },

    #[error("canvas {width}x{height} cannot hold a dot of diameter {diameter}")]
    CanvasTooSmall {
        width: f32,
        height: f32,
        diameter: f32,
    },
}

pub type StimulusResult<T> = Result<T, StimulusError>;
