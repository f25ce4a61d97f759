use thiserror::Error;

/// Errors raised while assembling a simulation.
///
/// None of these can occur once time stepping has started.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("velocity model has shape {actual:?}, expected {expected:?} (nx, nz)")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("velocity file holds {actual} samples, expected nx*nz = {expected}")]
    SampleCount { expected: usize, actual: usize },

    #[error("source {index} at padded ({ix}, {iz}) is outside the {nxpad}x{nzpad} grid")]
    SourceOutOfBounds {
        index: usize,
        ix: isize,
        iz: usize,
        nxpad: usize,
        nzpad: usize,
    },

    #[error("receiver row {row} must lie in the physical depth range [{min}, {max})")]
    ReceiverOutOfBounds { row: usize, min: usize, max: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("output I/O error: {0}")]
    Io(#[from] std::io::Error),
}
