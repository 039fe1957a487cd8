//! Error types for the protolink library.

use thiserror::Error;

/// The main error type for protolink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Serial port error.
    #[error("serial port error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// I/O error on the underlying channel.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Frame encoding/decoding error.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// Send or receive attempted on a channel that is not open.
    #[error("port not open")]
    PortNotOpen,

    /// Expected payload did not fully arrive within the time budget.
    #[error("frame assembly timed out after {timeout_ms}ms")]
    AssemblyTimeout { timeout_ms: u64 },
}

/// Frame-specific errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    /// Frame too short to contain the length/type/index preamble.
    #[error("frame too small: need at least 6 bytes, got {0}")]
    TooSmall(usize),

    /// Declared length implies more bytes than are present.
    #[error("incomplete frame: expected {expected} bytes, got {got}")]
    Incomplete { expected: usize, got: usize },

    /// Frame exceeds the maximum wire size.
    #[error("frame too large: {size} bytes exceeds maximum {max}")]
    TooLarge { size: usize, max: usize },
}

/// Result type alias for protolink operations.
pub type Result<T> = std::result::Result<T, Error>;
