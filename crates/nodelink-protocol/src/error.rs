//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when working with SAP frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame or payload is too short to be valid.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Expected minimum length.
        expected: usize,
        /// Actual length received.
        actual: usize,
    },

    /// Declared payload length exceeds the protocol maximum.
    #[error("payload too long: maximum {max} bytes, got {actual}")]
    PayloadTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length declared.
        actual: usize,
    },

    /// Payload length does not match what the function code requires.
    #[error("payload length {actual} is invalid for function 0x{function:02X}")]
    LengthMismatch {
        /// Function code of the frame.
        function: u8,
        /// Actual payload length.
        actual: usize,
    },

    /// Unknown function code.
    #[error("unknown function code: 0x{0:02X}")]
    UnknownFunction(u8),

    /// Unknown result code for the confirmation being decoded.
    #[error("unknown result code: 0x{0:02X}")]
    UnknownResultCode(u8),

    /// Invalid data in frame.
    #[error("invalid frame data: {0}")]
    InvalidData(String),
}
