use thiserror::Error;

/// Everything that can go wrong in the matrix kernel or the network.
///
/// Every variant is a caller programming error (bad shapes, bad
/// hyperparameters), detected synchronously at the operation that sees it.
/// None of them are retryable; the fix is always to correct the input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Zero or inconsistent dimensions at matrix construction.
    #[error("invalid matrix shape: {0}")]
    InvalidShape(String),

    /// Checked element access outside the matrix bounds.
    #[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// Operand shapes incompatible for an algebraic operation.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Network layer-size list malformed.
    #[error("invalid network topology: {0}")]
    InvalidTopology(String),

    /// Activation cache or output/target shape inconsistent during the
    /// backward pass.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Malformed training hyperparameters or distribution parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;
