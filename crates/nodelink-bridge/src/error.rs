//! Bridge error types.

use nodelink_protocol::ProtocolError;
use thiserror::Error;

/// Errors returned by the request dispatcher.
///
/// Either way the offending frame is dropped without a confirmation; the
/// host recovers by timing out and retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The frame carried a function code the bridge does not handle.
    #[error("unsupported function code 0x{0:02X}")]
    UnsupportedFunction(u8),

    /// The frame carried a known function code but a malformed payload.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
