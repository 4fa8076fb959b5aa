//! Error types for arithmetic coding.

use thiserror::Error;

/// Error variants for coder and bit-store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Supplied probability lies outside the open interval (0, 1).
    ///
    /// A probability of exactly 0.0 or 1.0 collapses the coding interval
    /// to zero width, after which no progress is possible.
    #[error("invalid probability: {0} (must lie strictly between 0 and 1)")]
    InvalidProbability(f64),

    /// The requested subdivision is narrower than one fixed-point unit.
    ///
    /// The probability model is producing values too extreme for the
    /// coder's resolution; continuing would corrupt the stream.
    #[error("interval subdivision below fixed-point resolution")]
    ResolutionExhausted,

    /// A bit index exceeded the bit store's addressing capacity.
    #[error("bit index {0} exceeds store capacity")]
    StoreOverflow(u64),

    /// An I/O error occurred while loading or serializing a bit stream.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for arithmetic coding operations.
pub type Result<T> = std::result::Result<T, Error>;
