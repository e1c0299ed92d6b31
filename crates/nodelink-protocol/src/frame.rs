//! Frame encoding/decoding utilities.
//!
//! Every SAP primitive travels in a frame with a 3-byte header followed by
//! the payload:
//!
//! ```text
//! +----------+----------+----------+-------------------+
//! | function | frame_id | length   | payload[0..len]   |
//! +----------+----------+----------+-------------------+
//! ```
//!
//! `frame_id` is chosen by the requester and echoed back in the matching
//! confirmation so the host can pair exchanges.

use bytes::{Buf, BytesMut};

use crate::error::ProtocolError;

/// Length of the frame header.
pub const FRAME_HEADER_SIZE: usize = 3;

/// Maximum payload length carried by a single frame.
pub const MAX_PAYLOAD_SIZE: usize = 128;

/// Maximum total frame size.
pub const MAX_FRAME_SIZE: usize = FRAME_HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// A single SAP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Function code, see [`crate::FunctionCode`].
    pub function: u8,
    /// Frame identifier, echoed from request to confirmation.
    pub frame_id: u8,
    /// Payload bytes (length range 0..=[`MAX_PAYLOAD_SIZE`]).
    pub payload: Vec<u8>,
}

impl Frame {
    /// Create a new frame.
    pub fn new(function: u8, frame_id: u8, payload: Vec<u8>) -> Self {
        Frame {
            function,
            frame_id,
            payload,
        }
    }

    /// Encode the frame into wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + self.payload.len());
        buf.push(self.function);
        buf.push(self.frame_id);
        buf.push(self.payload.len() as u8);
        buf.extend_from_slice(&self.payload);
        buf
    }

    /// Decode a frame from a buffer that contains exactly one frame.
    pub fn decode(data: &[u8]) -> Result<Frame, ProtocolError> {
        if data.len() < FRAME_HEADER_SIZE {
            return Err(ProtocolError::FrameTooShort {
                expected: FRAME_HEADER_SIZE,
                actual: data.len(),
            });
        }
        let len = data[2] as usize;
        if len > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::PayloadTooLong {
                max: MAX_PAYLOAD_SIZE,
                actual: len,
            });
        }
        if data.len() != FRAME_HEADER_SIZE + len {
            return Err(ProtocolError::LengthMismatch {
                function: data[0],
                actual: data.len() - FRAME_HEADER_SIZE,
            });
        }
        Ok(Frame {
            function: data[0],
            frame_id: data[1],
            payload: data[FRAME_HEADER_SIZE..].to_vec(),
        })
    }
}

/// A codec for reading frames out of a byte stream.
///
/// Incoming serial data is pushed in as it arrives; complete frames are
/// pulled out with [`FrameCodec::decode`]. A frame that declares an
/// impossible payload length is dropped without a confirmation: framing is
/// considered lost, so the codec discards the buffer and reports the error
/// once.
#[derive(Debug, Default)]
pub struct FrameCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
}

impl FrameCodec {
    /// Create a new frame codec.
    pub fn new() -> Self {
        FrameCodec {
            buffer: BytesMut::with_capacity(MAX_FRAME_SIZE),
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete frame from the buffer.
    ///
    /// Returns `Ok(Some(frame))` if a complete frame is available,
    /// `Ok(None)` if more data is needed, or `Err` if the buffered header
    /// declares a malformed length (the offending byte is discarded).
    pub fn decode(&mut self) -> Result<Option<Frame>, ProtocolError> {
        if self.buffer.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let len = self.buffer[2] as usize;
        if len > MAX_PAYLOAD_SIZE {
            // Framing is lost: no trustworthy frame boundary remains in the
            // buffer. Discard it and wait for fresh input.
            self.buffer.clear();
            return Err(ProtocolError::PayloadTooLong {
                max: MAX_PAYLOAD_SIZE,
                actual: len,
            });
        }

        if self.buffer.len() < FRAME_HEADER_SIZE + len {
            return Ok(None);
        }

        let function = self.buffer[0];
        let frame_id = self.buffer[1];
        self.buffer.advance(FRAME_HEADER_SIZE);
        let payload = self.buffer.split_to(len).to_vec();

        Ok(Some(Frame {
            function,
            frame_id,
            payload,
        }))
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
